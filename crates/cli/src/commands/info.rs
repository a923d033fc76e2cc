//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::RelayConfig;
use routing::MappingStore;
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    relay: RelayInfo,
    routing: RoutingInfo,
    transport: TransportInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    seed_routes: Vec<RouteInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    routes: Option<Vec<RouteInfo>>,
}

#[derive(Serialize)]
struct RelayInfo {
    quiescence_window_ms: u64,
    event_queue_capacity: usize,
}

#[derive(Serialize)]
struct RoutingInfo {
    mapping_file: String,
    reload_interval_secs: u64,
}

#[derive(Serialize)]
struct TransportInfo {
    kind: String,
    name: String,
}

#[derive(Serialize)]
struct RouteInfo {
    source: i64,
    destination: i64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let config = load_config(&args.config)?;

    let routes = if args.routes {
        let store = MappingStore::new(&config.routing.mapping_file);
        let mapping = store
            .load()
            .with_context(|| format!("Failed to read {}", store.path().display()))?;
        Some(
            mapping
                .iter()
                .map(|(source, destination)| RouteInfo {
                    source: source.get(),
                    destination: destination.get(),
                })
                .collect(),
        )
    } else {
        None
    };

    let info = build_config_info(&config, routes);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

fn build_config_info(config: &RelayConfig, routes: Option<Vec<RouteInfo>>) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", config.version),
        relay: RelayInfo {
            quiescence_window_ms: config.relay.quiescence_window_ms,
            event_queue_capacity: config.relay.event_queue_capacity,
        },
        routing: RoutingInfo {
            mapping_file: config.routing.mapping_file.display().to_string(),
            reload_interval_secs: config.routing.reload_interval_secs,
        },
        transport: TransportInfo {
            kind: format!("{:?}", config.transport.kind),
            name: config.transport.name.clone(),
        },
        seed_routes: config
            .routes
            .iter()
            .map(|seed| RouteInfo {
                source: seed.source.get(),
                destination: seed.destination.get(),
            })
            .collect(),
        routes,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("\n=== Relay Configuration ===\n");
    println!("Version: {}", info.version);

    println!("\nRelay:");
    println!("  Album window: {}ms", info.relay.quiescence_window_ms);
    println!("  Event queue capacity: {}", info.relay.event_queue_capacity);

    println!("\nRouting:");
    println!("  Mapping file: {}", info.routing.mapping_file);
    if info.routing.reload_interval_secs > 0 {
        println!("  Reload every: {}s", info.routing.reload_interval_secs);
    } else {
        println!("  Reload: disabled");
    }

    println!("\nTransport:");
    println!("  {} ({})", info.transport.name, info.transport.kind);

    if !info.seed_routes.is_empty() {
        println!("\nSeed routes ({}):", info.seed_routes.len());
        for route in &info.seed_routes {
            println!("  {} -> {}", route.source, route.destination);
        }
    }

    if let Some(ref routes) = info.routes {
        println!("\nStored routes ({}):", routes.len());
        for route in routes {
            println!("  {} -> {}", route.source, route.destination);
        }
    }

    println!();
}
