//! Config validation
//!
//! Rules:
//! - 0 < quiescence_window_ms <= MAX_QUIESCENCE_WINDOW_MS
//! - event_queue_capacity > 0
//! - mapping_file is not empty
//! - transport name is not empty
//! - routes[].source unique, never routed onto itself

use std::collections::HashSet;

use contracts::{ContractError, RelayConfig, MAX_QUIESCENCE_WINDOW_MS};

/// Validate a RelayConfig
///
/// Returns the first error encountered.
pub fn validate(config: &RelayConfig) -> Result<(), ContractError> {
    validate_relay_settings(config)?;
    validate_routing(config)?;
    validate_transport(config)?;
    validate_routes(config)?;
    Ok(())
}

fn validate_relay_settings(config: &RelayConfig) -> Result<(), ContractError> {
    let window = config.relay.quiescence_window_ms;
    if window == 0 || window > MAX_QUIESCENCE_WINDOW_MS {
        return Err(ContractError::config_validation(
            "relay.quiescence_window_ms",
            format!("quiescence_window_ms must be in 1..={MAX_QUIESCENCE_WINDOW_MS}, got {window}"),
        ));
    }

    if config.relay.event_queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "relay.event_queue_capacity",
            "event_queue_capacity must be > 0",
        ));
    }

    Ok(())
}

fn validate_routing(config: &RelayConfig) -> Result<(), ContractError> {
    if config.routing.mapping_file.as_os_str().is_empty() {
        return Err(ContractError::config_validation(
            "routing.mapping_file",
            "mapping_file cannot be empty",
        ));
    }
    Ok(())
}

fn validate_transport(config: &RelayConfig) -> Result<(), ContractError> {
    if config.transport.name.trim().is_empty() {
        return Err(ContractError::config_validation(
            "transport.name",
            "transport name cannot be empty",
        ));
    }
    Ok(())
}

/// Seed routes: one destination per source, no self loops
fn validate_routes(config: &RelayConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, route) in config.routes.iter().enumerate() {
        if !seen.insert(route.source) {
            return Err(ContractError::config_validation(
                format!("routes[{idx}].source"),
                format!("duplicate source {}", route.source),
            ));
        }
        if route.source == route.destination {
            return Err(ContractError::config_validation(
                format!("routes[{idx}]"),
                format!("channel {} cannot forward to itself", route.source),
            ));
        }
    }
    Ok(())
}
