//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::{info, warn};

use super::load_config;
use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{PipelineConfig, RelayPipeline};

/// Execute the `run` command
pub async fn run_relay(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut config = load_config(&args.config)?;

    if let Some(window_ms) = args.window_ms {
        info!(window_ms, "Overriding quiescence window from CLI");
        config.relay.quiescence_window_ms = window_ms;
    }
    if let Some(ref mapping_file) = args.mapping_file {
        info!(path = %mapping_file.display(), "Overriding mapping file from CLI");
        config.routing.mapping_file = mapping_file.clone();
    }
    config_loader::ConfigLoader::validate(&config)
        .map_err(|e| CliError::invalid_override(e.to_string()))?;

    info!(
        window_ms = config.relay.quiescence_window_ms,
        mapping_file = %config.routing.mapping_file.display(),
        seeds = config.routes.len(),
        transport = %config.transport.name,
        "Configuration loaded"
    );

    let pipeline = RelayPipeline::new(PipelineConfig {
        relay: config,
        events: args.events.clone(),
        speed: args.speed,
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
    });

    info!("Starting relay...");

    let stats = pipeline
        .run(shutdown_signal())
        .await
        .context("Relay execution failed")?;
    info!(
        events = stats.events_handled,
        duration_secs = stats.duration.as_secs_f64(),
        stopped = ?stats.stopped,
        "Relay completed"
    );
    stats.print_summary();

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM; a handler that fails to install never fires
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
