//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracker_types::{Address, ChainId};

/// Top-level tracker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
	pub tracker: TrackerSettings,
	#[serde(default)]
	pub chains: HashMap<ChainId, ChainConfig>,
	#[serde(default)]
	pub sync: SyncConfig,
	#[serde(default)]
	pub api: ApiConfig,
}

/// Identity of this tracker instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerSettings {
	pub name: String,
	/// Hex-encoded private key of the order owner wallet.
	pub private_key: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

/// Per-chain endpoints and token metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
	pub name: String,
	/// JSON-RPC endpoint used for block-number observation.
	pub rpc_url: String,
	/// Orderbook API base URL (without the `/v1` suffix).
	pub orderbook_url: String,
	/// Wrapped-native token the quote API expects in place of the
	/// native-currency pseudo-address.
	pub wrapped_native: Address,
	#[serde(default = "default_native_symbol")]
	pub native_symbol: String,
	#[serde(default = "default_native_decimals")]
	pub native_decimals: u8,
	/// ERC-20 tokens tradeable on this chain. Orders trading a token not
	/// listed here (or the native/wrapped pair) are skipped during sync.
	#[serde(default)]
	pub tokens: Vec<TokenConfig>,
}

/// One entry of a chain's token list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenConfig {
	pub address: Address,
	pub symbol: String,
	#[serde(default = "default_native_decimals")]
	pub decimals: u8,
}

/// Intervals and limits driving the background updaters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
	/// Seconds between full order-list syncs per chain.
	#[serde(default = "default_order_sync_secs")]
	pub order_sync_secs: u64,
	/// Seconds between quote refreshes for watched pairs.
	#[serde(default = "default_quote_refresh_secs")]
	pub quote_refresh_secs: u64,
	/// Seconds between block-number polls.
	#[serde(default = "default_block_poll_secs")]
	pub block_poll_secs: u64,
	/// Maximum orders requested per sync.
	#[serde(default = "default_order_limit")]
	pub order_limit: u32,
	/// Trailing grace period of the quote-loading indicator, milliseconds.
	#[serde(default = "default_loading_grace_ms")]
	pub loading_grace_ms: u64,
}

/// HTTP API surface of the service binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
	#[serde(default = "default_api_host")]
	pub host: String,
	#[serde(default = "default_api_port")]
	pub port: u16,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_native_symbol() -> String {
	"ETH".to_string()
}

fn default_native_decimals() -> u8 {
	18
}

fn default_order_sync_secs() -> u64 {
	30
}

fn default_quote_refresh_secs() -> u64 {
	15
}

fn default_block_poll_secs() -> u64 {
	12
}

fn default_order_limit() -> u32 {
	100
}

fn default_loading_grace_ms() -> u64 {
	500
}

fn default_api_host() -> String {
	"0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
	8080
}

impl Default for TrackerConfig {
	fn default() -> Self {
		Self {
			tracker: TrackerSettings::default(),
			chains: HashMap::new(),
			sync: SyncConfig::default(),
			api: ApiConfig::default(),
		}
	}
}

impl Default for TrackerSettings {
	fn default() -> Self {
		Self {
			name: "swap-tracker".to_string(),
			private_key: String::new(),
			log_level: default_log_level(),
		}
	}
}

impl Default for SyncConfig {
	fn default() -> Self {
		Self {
			order_sync_secs: default_order_sync_secs(),
			quote_refresh_secs: default_quote_refresh_secs(),
			block_poll_secs: default_block_poll_secs(),
			order_limit: default_order_limit(),
			loading_grace_ms: default_loading_grace_ms(),
		}
	}
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			host: default_api_host(),
			port: default_api_port(),
		}
	}
}
