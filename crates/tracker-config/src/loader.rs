//! Configuration loading from files and environment.

use crate::types::*;
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info};
use tracker_types::ChainId;

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
	/// Load configuration from file
	pub fn from_file<P: AsRef<Path>>(path: P) -> Result<TrackerConfig> {
		let path = path.as_ref();
		info!("Loading configuration from {:?}", path);

		let contents = std::fs::read_to_string(path)
			.with_context(|| format!("Failed to read config file: {:?}", path))?;

		let config = match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Self::from_toml(&contents)?,
			Some("json") => Self::from_json(&contents)?,
			Some("yaml") | Some("yml") => Self::from_yaml(&contents)?,
			_ => anyhow::bail!("Unsupported config format: {:?}", path),
		};

		Self::validate_config(&config)?;
		Ok(config)
	}

	/// Load from TOML string
	pub fn from_toml(contents: &str) -> Result<TrackerConfig> {
		toml::from_str(contents).map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))
	}

	/// Load from JSON string
	pub fn from_json(contents: &str) -> Result<TrackerConfig> {
		serde_json::from_str(contents).context("Failed to parse JSON")
	}

	/// Load from YAML string
	pub fn from_yaml(contents: &str) -> Result<TrackerConfig> {
		serde_yaml::from_str(contents).context("Failed to parse YAML")
	}

	/// Load from environment variables with optional file override
	pub fn from_env_and_file(file_path: Option<&Path>) -> Result<TrackerConfig> {
		let mut config = if let Some(path) = file_path {
			Self::from_file(path)?
		} else {
			TrackerConfig::default()
		};

		Self::apply_env_overrides(&mut config)?;

		Self::validate_config(&config)?;
		Ok(config)
	}

	/// Apply environment variable overrides
	fn apply_env_overrides(config: &mut TrackerConfig) -> Result<()> {
		if let Ok(key) = std::env::var("TRACKER_PRIVATE_KEY") {
			debug!("Overriding private key from environment");
			config.tracker.private_key = key;
		}

		for (name, value) in std::env::vars() {
			if let Some(chain_id) = name.strip_prefix("RPC_URL_") {
				if let Ok(id) = chain_id.parse::<u64>() {
					debug!("Overriding RPC URL for chain {} from environment", id);
					if let Some(chain_config) = config.chains.get_mut(&ChainId(id)) {
						chain_config.rpc_url = value;
					}
				}
			} else if let Some(chain_id) = name.strip_prefix("ORDERBOOK_URL_") {
				if let Ok(id) = chain_id.parse::<u64>() {
					debug!("Overriding orderbook URL for chain {} from environment", id);
					if let Some(chain_config) = config.chains.get_mut(&ChainId(id)) {
						chain_config.orderbook_url = value;
					}
				}
			}
		}

		Ok(())
	}

	/// Validate configuration
	fn validate_config(config: &TrackerConfig) -> Result<()> {
		if !config.tracker.private_key.starts_with("0x") {
			anyhow::bail!("Private key must start with 0x");
		}

		if config.chains.is_empty() {
			anyhow::bail!("At least one chain must be configured");
		}

		for (chain_id, chain) in &config.chains {
			if chain.orderbook_url.is_empty() {
				anyhow::bail!("Chain {} has no orderbook_url", chain_id);
			}
			if chain.rpc_url.is_empty() {
				anyhow::bail!("Chain {} has no rpc_url", chain_id);
			}
		}

		if config.sync.order_limit == 0 {
			anyhow::bail!("sync.order_limit must be greater than zero");
		}

		Ok(())
	}
}

/// Load configuration from standard locations
pub fn load_config() -> Result<TrackerConfig> {
	// Check for config file in order:
	// 1. Environment variable CONFIG_FILE
	// 2. ./config.toml
	// 3. ./config/tracker.toml
	// 4. Default config with env overrides

	if let Ok(path) = std::env::var("CONFIG_FILE") {
		return ConfigLoader::from_env_and_file(Some(Path::new(&path)));
	}

	let paths = ["./config.toml", "./config/tracker.toml"];

	for path in &paths {
		if Path::new(path).exists() {
			return ConfigLoader::from_env_and_file(Some(Path::new(path)));
		}
	}

	ConfigLoader::from_env_and_file(None)
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const SAMPLE_TOML: &str = r#"
[tracker]
name = "test-tracker"
private_key = "0x123"

[chains.1]
name = "Ethereum"
rpc_url = "https://eth.example.com"
orderbook_url = "https://protocol-mainnet.example.com/api"
wrapped_native = "0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"

[[chains.1.tokens]]
address = "0x6B175474E89094C44Da98b954EedeAC495271d0F"
symbol = "DAI"

[[chains.1.tokens]]
address = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"
symbol = "USDC"
decimals = 6

[chains.100]
name = "xDai"
rpc_url = "https://xdai.example.com"
orderbook_url = "https://protocol-xdai.example.com/api"
wrapped_native = "0xe91D153E0b41518A2Ce8Dd3D7944Fa863463a97d"
native_symbol = "xDAI"

[sync]
order_sync_secs = 10
order_limit = 50

[api]
host = "127.0.0.1"
port = 9000
"#;

	#[test]
	fn test_toml_parsing_with_chain_id_maps() {
		let config = ConfigLoader::from_toml(SAMPLE_TOML).unwrap();
		assert_eq!(config.tracker.name, "test-tracker");
		assert_eq!(config.chains.len(), 2);
		assert!(config.chains.contains_key(&ChainId::MAINNET));
		assert!(config.chains.contains_key(&ChainId::XDAI));

		let mainnet = config.chains.get(&ChainId::MAINNET).unwrap();
		assert_eq!(mainnet.tokens.len(), 2);
		assert_eq!(mainnet.tokens[0].symbol, "DAI");
		assert_eq!(mainnet.tokens[0].decimals, 18);
		assert_eq!(mainnet.tokens[1].decimals, 6);

		let xdai = config.chains.get(&ChainId::XDAI).unwrap();
		assert_eq!(xdai.native_symbol, "xDAI");
		assert_eq!(xdai.native_decimals, 18);
		assert!(xdai.tokens.is_empty());

		assert_eq!(config.sync.order_sync_secs, 10);
		assert_eq!(config.sync.order_limit, 50);
		// untouched fields fall back to defaults
		assert_eq!(config.sync.block_poll_secs, 12);
		assert_eq!(config.api.port, 9000);
	}

	#[test]
	fn test_json_parsing() {
		let json = r#"{
			"tracker": { "name": "test-tracker", "private_key": "0x123" },
			"chains": {
				"1": {
					"name": "Ethereum",
					"rpc_url": "https://eth.example.com",
					"orderbook_url": "https://protocol-mainnet.example.com/api",
					"wrapped_native": "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2"
				}
			}
		}"#;

		let config = ConfigLoader::from_json(json).unwrap();
		assert_eq!(config.tracker.name, "test-tracker");
		assert_eq!(config.chains.len(), 1);
		assert_eq!(config.sync.order_limit, 100);
	}

	#[test]
	fn test_from_file() {
		let mut file = tempfile::Builder::new()
			.suffix(".toml")
			.tempfile()
			.unwrap();
		file.write_all(SAMPLE_TOML.as_bytes()).unwrap();

		let config = ConfigLoader::from_file(file.path()).unwrap();
		assert_eq!(config.chains.len(), 2);
	}

	#[test]
	fn test_env_overrides() {
		let mut file = tempfile::Builder::new()
			.suffix(".toml")
			.tempfile()
			.unwrap();
		file.write_all(SAMPLE_TOML.as_bytes()).unwrap();

		std::env::set_var("TRACKER_PRIVATE_KEY", "0xfeed");
		std::env::set_var("RPC_URL_1", "https://rpc.override.example.com");
		std::env::set_var("ORDERBOOK_URL_100", "https://orderbook.override.example.com");
		// no such chain in the file: must be ignored, not inserted
		std::env::set_var("RPC_URL_31337", "https://ignored.example.com");

		let config = ConfigLoader::from_env_and_file(Some(file.path())).unwrap();

		std::env::remove_var("TRACKER_PRIVATE_KEY");
		std::env::remove_var("RPC_URL_1");
		std::env::remove_var("ORDERBOOK_URL_100");
		std::env::remove_var("RPC_URL_31337");

		assert_eq!(config.tracker.private_key, "0xfeed");

		let mainnet = config.chains.get(&ChainId::MAINNET).unwrap();
		assert_eq!(mainnet.rpc_url, "https://rpc.override.example.com");
		// only the named field is overridden
		assert_eq!(
			mainnet.orderbook_url,
			"https://protocol-mainnet.example.com/api"
		);

		let xdai = config.chains.get(&ChainId::XDAI).unwrap();
		assert_eq!(xdai.orderbook_url, "https://orderbook.override.example.com");
		assert_eq!(xdai.rpc_url, "https://xdai.example.com");

		assert_eq!(config.chains.len(), 2);
		assert!(!config.chains.contains_key(&ChainId(31337)));
	}

	#[test]
	fn test_validation_private_key() {
		let mut config = ConfigLoader::from_toml(SAMPLE_TOML).unwrap();
		config.tracker.private_key = "invalid_key".to_string();

		let result = ConfigLoader::validate_config(&config);
		assert!(result.is_err());
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("Private key must start with 0x"));
	}

	#[test]
	fn test_validation_requires_chains() {
		let mut config = ConfigLoader::from_toml(SAMPLE_TOML).unwrap();
		config.chains.clear();

		assert!(ConfigLoader::validate_config(&config).is_err());
	}

	#[test]
	fn test_validation_order_limit() {
		let mut config = ConfigLoader::from_toml(SAMPLE_TOML).unwrap();
		config.sync.order_limit = 0;

		assert!(ConfigLoader::validate_config(&config).is_err());
	}
}
