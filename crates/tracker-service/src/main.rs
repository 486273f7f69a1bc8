//! Main entry point for the fleet tracker service.
//!
//! Loads the configuration, builds the engine from whichever storage and
//! notification backends it names, seeds the startup records and serves the
//! HTTP API next to the engine's maintenance loop.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracker_config::Config;

mod apis;
mod factory_registry;
mod server;

/// Command-line arguments for the tracker service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started tracker");

	let config_path = args
		.config
		.to_str()
		.ok_or_else(|| format!("Config path is not valid UTF-8: {}", args.config.display()))?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.tracker.id);

	let engine = factory_registry::build_engine_from_config(config.clone())?;
	engine.initialize().await?;
	let engine = Arc::new(engine);

	match config.api.clone().filter(|api| api.enabled) {
		Some(api_config) => {
			let api_task = server::start_server(api_config, Arc::clone(&engine));
			tokio::select! {
				result = engine.run() => {
					tracing::info!("Tracker engine finished");
					result?;
				}
				result = api_task => {
					tracing::info!("API server finished");
					result?;
				}
				_ = tokio::signal::ctrl_c() => {
					tracing::info!("Received shutdown signal");
				}
			}
		},
		None => {
			tracing::warn!("API server disabled; running maintenance only");
			tokio::select! {
				result = engine.run() => result?,
				_ = tokio::signal::ctrl_c() => {
					tracing::info!("Received shutdown signal");
				}
			}
		},
	}

	engine.shutdown().await?;
	tracing::info!("Stopped tracker");
	Ok(())
}
