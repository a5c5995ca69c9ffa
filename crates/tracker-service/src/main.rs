use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracker_config::ConfigLoader;
use tracker_core::Engine;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;

#[derive(Parser)]
#[command(name = "swap-tracker")]
#[command(about = "Order and quote tracking service for the swap protocol", long_about = None)]
struct Cli {
	#[command(subcommand)]
	command: Option<Commands>,

	#[arg(short, long, value_name = "FILE", default_value = "config.toml")]
	config: PathBuf,

	#[arg(long, env = "TRACKER_LOG_LEVEL", default_value = "info")]
	log_level: String,
}

#[derive(Subcommand)]
enum Commands {
	/// Start the tracker service
	Start,
	/// Validate the configuration file
	Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
	let cli = Cli::parse();

	setup_tracing(&cli.log_level)?;

	match cli.command {
		Some(Commands::Start) | None => start_service(cli).await,
		Some(Commands::Validate) => validate_config(cli).await,
	}
}

async fn start_service(cli: Cli) -> Result<()> {
	info!("Starting swap tracker service");
	info!("Loading configuration from: {:?}", cli.config);

	let config = ConfigLoader::from_env_and_file(Some(&cli.config))
		.context("Failed to load configuration")?;

	info!("Configuration loaded successfully");
	info!("Tracker name: {}", config.tracker.name);
	info!("Configured chains: {}", config.chains.len());

	let api_config = config.api.clone();
	let engine = Arc::new(
		Engine::builder()
			.with_config(config)
			.build()
			.context("Failed to build engine")?,
	);

	engine.start().await.context("Failed to start engine")?;

	// Start HTTP server
	let http_handle = {
		let engine = engine.clone();
		tokio::spawn(async move { api::start_http_server(engine, api_config).await })
	};

	info!("Swap tracker service started successfully");

	shutdown_signal().await;
	info!("Shutdown signal received, stopping services...");

	engine
		.shutdown()
		.await
		.context("Failed to shutdown engine")?;
	http_handle.abort();

	info!("Swap tracker service stopped");
	Ok(())
}

async fn validate_config(cli: Cli) -> Result<()> {
	info!("Validating configuration file: {:?}", cli.config);

	let config = ConfigLoader::from_env_and_file(Some(&cli.config))
		.context("Failed to load configuration")?;

	info!("Configuration is valid");
	info!("Tracker name: {}", config.tracker.name);
	info!("Configured chains:");
	for (chain_id, chain) in &config.chains {
		info!(
			"  {} ({}): {} listed tokens",
			chain.name,
			chain_id,
			chain.tokens.len()
		);
	}

	Ok(())
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer())
		.init();

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		signal::ctrl_c()
			.await
			.expect("failed to install Ctrl+C handler");
	};

	#[cfg(unix)]
	let terminate = async {
		signal::unix::signal(signal::unix::SignalKind::terminate())
			.expect("failed to install signal handler")
			.recv()
			.await;
	};

	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}
}
