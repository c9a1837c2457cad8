//! `keyrest` server binary.
//!
//! Serves an in-memory key directory. Configuration comes from
//! `keyrest.toml` (or the file named by `KEYREST_CONFIG`), then `.env`, then
//! `KEYREST__SECTION__KEY` environment variables.

use std::sync::Arc;

use anyhow::Context;
use keyrest::config::{ConfigLoader, DEFAULT_ENV_PREFIX};
use keyrest::{build_server, MemoryKeyDirectory};

const DEFAULT_CONFIG_FILE: &str = "keyrest.toml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_file =
        std::env::var("KEYREST_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

    let config = ConfigLoader::new()
        .with_optional_file(&config_file)?
        .with_dotenv()
        .with_env_prefix(DEFAULT_ENV_PREFIX)
        .load()
        .with_context(|| format!("failed to load configuration (file: {config_file})"))?;

    keyrest::telemetry::init_telemetry(&config.log_config(), &config.metrics_config())
        .context("failed to initialize telemetry")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        http_addr = %config.server.http_addr,
        metrics_enabled = config.metrics.enabled,
        "keyrest starting"
    );

    build_server(&config, Arc::new(MemoryKeyDirectory::new()))?
        .run()
        .await?;

    tracing::info!("shutdown complete");
    Ok(())
}
