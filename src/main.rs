//! modircd - modular IRC daemon.

use anyhow::Context as _;
use modircd::config::{Config, validate};
use modircd::modules::load_core_modules;
use modircd::network::Gateway;
use modircd::state::Matrix;
use modircd::telemetry::init_logging;
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {config_path}"))?;
    init_logging(&config.logging);

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("configuration has {} error(s)", errors.len());
    }

    info!(
        server = %config.server.name,
        network = %config.server.network,
        sid = %config.server.sid,
        "Starting modircd"
    );

    let matrix = Arc::new(Matrix::new(&config).context("failed to build server state")?);
    load_core_modules(&matrix).context("failed to load core modules")?;

    let gateway = Gateway::bind(config.listen.address, Arc::clone(&matrix)).await?;

    tokio::select! {
        _ = gateway.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            info!(users = matrix.user_count(), channels = matrix.channel_count(), "Shutting down");
        }
    }
    Ok(())
}
