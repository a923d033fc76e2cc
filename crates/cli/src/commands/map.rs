//! `map` command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use routing::MappingStore;
use serde::Serialize;
use tracing::info;

use super::load_config;
use crate::cli::{MapArgs, MapCommand, MapSetArgs, MapShowArgs, MappingLocation};

const DEFAULT_MAPPING_FILE: &str = "mappings.json";

#[derive(Serialize)]
struct MappingEntry {
    source: i64,
    destination: i64,
}

/// Execute the `map` command group
pub fn run_map(args: &MapArgs) -> Result<()> {
    match &args.command {
        MapCommand::Set(set) => map_set(set),
        MapCommand::Show(show) => map_show(show),
    }
}

fn map_set(args: &MapSetArgs) -> Result<()> {
    let store = MappingStore::new(resolve_mapping_file(&args.location)?);
    info!(path = %store.path().display(), "Updating mapping file");

    let previous = store
        .add_mapping(args.source, args.destination)
        .with_context(|| format!("Failed to update {}", store.path().display()))?;

    match previous {
        Some(old) if old != args.destination => println!(
            "✓ {} -> {} (was {})",
            args.source, args.destination, old
        ),
        _ => println!("✓ {} -> {}", args.source, args.destination),
    }
    Ok(())
}

fn map_show(args: &MapShowArgs) -> Result<()> {
    let store = MappingStore::new(resolve_mapping_file(&args.location)?);
    let mapping = store
        .load()
        .with_context(|| format!("Failed to read {}", store.path().display()))?;

    if args.json {
        let entries: Vec<MappingEntry> = mapping
            .iter()
            .map(|(source, destination)| MappingEntry {
                source: source.get(),
                destination: destination.get(),
            })
            .collect();
        let json =
            serde_json::to_string_pretty(&entries).context("Failed to serialize mappings")?;
        println!("{}", json);
    } else if mapping.is_empty() {
        println!("No mappings in {}", store.path().display());
    } else {
        println!("Mappings in {} ({}):", store.path().display(), mapping.len());
        for (source, destination) in &mapping {
            println!("  {} -> {}", source, destination);
        }
    }
    Ok(())
}

/// `--mapping-file`, then the configuration's `routing.mapping_file`, then
/// `mappings.json`
fn resolve_mapping_file(location: &MappingLocation) -> Result<PathBuf> {
    if let Some(ref path) = location.mapping_file {
        return Ok(path.clone());
    }
    if let Some(ref config) = location.config {
        return Ok(load_config(config)?.routing.mapping_file);
    }
    Ok(PathBuf::from(DEFAULT_MAPPING_FILE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ChannelId;
    use std::fs;

    #[test]
    fn test_explicit_mapping_file_wins() {
        let location = MappingLocation {
            mapping_file: Some(PathBuf::from("custom.json")),
            config: Some(PathBuf::from("/nonexistent/relay.toml")),
        };
        assert_eq!(
            resolve_mapping_file(&location).unwrap(),
            PathBuf::from("custom.json")
        );
    }

    #[test]
    fn test_mapping_file_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("relay.toml");
        fs::write(&config, "[routing]\nmapping_file = \"routes.json\"\n").unwrap();

        let location = MappingLocation {
            mapping_file: None,
            config: Some(config),
        };
        assert_eq!(
            resolve_mapping_file(&location).unwrap(),
            PathBuf::from("routes.json")
        );
    }

    #[test]
    fn test_default_mapping_file() {
        let location = MappingLocation {
            mapping_file: None,
            config: None,
        };
        assert_eq!(
            resolve_mapping_file(&location).unwrap(),
            PathBuf::from(DEFAULT_MAPPING_FILE)
        );
    }

    #[test]
    fn test_set_then_show() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mappings.json");
        let location = MappingLocation {
            mapping_file: Some(path.clone()),
            config: None,
        };

        map_set(&MapSetArgs {
            source: ChannelId::new(-1001),
            destination: ChannelId::new(-2002),
            location: location.clone(),
        })
        .unwrap();
        map_show(&MapShowArgs {
            json: true,
            location,
        })
        .unwrap();

        let mapping = MappingStore::new(&path).load().unwrap();
        assert_eq!(mapping.get(&ChannelId::new(-1001)), Some(&ChannelId::new(-2002)));
    }
}
