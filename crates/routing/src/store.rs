//! MappingStore - JSON file of `source -> destination` pairs
//!
//! File shape: `{"-1001234": -1005678, ...}`. Keys are string-encoded source
//! ids; values are accepted as numbers or numeric strings. Single writer:
//! `add_mapping` is load-mutate-save and is not safe under concurrent writers.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use contracts::{ChannelId, RouteSeed};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Result, RoutingError};

/// In-memory routing map
pub type Mapping = BTreeMap<ChannelId, ChannelId>;

/// Destination value as found on disk
#[derive(Deserialize)]
#[serde(untagged)]
enum RawChannelId {
    Number(i64),
    Text(String),
}

/// Persisted mapping store
#[derive(Debug, Clone)]
pub struct MappingStore {
    path: PathBuf,
}

impl MappingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the mapping; a missing file is an empty mapping
    pub fn load(&self) -> Result<Mapping> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "mapping file absent, starting empty");
                return Ok(Mapping::new());
            }
            Err(e) => return Err(RoutingError::io(&self.path, e)),
        };

        if content.trim().is_empty() {
            return Ok(Mapping::new());
        }

        self.parse(&content)
    }

    /// Write the mapping (pretty JSON, two-space indent)
    ///
    /// Writes a sibling temp file and renames it over the target so a
    /// concurrent `load` never observes a half-written file.
    pub fn save(&self, mapping: &Mapping) -> Result<()> {
        let encoded: BTreeMap<String, i64> = mapping
            .iter()
            .map(|(src, dst)| (src.to_string(), dst.get()))
            .collect();
        let json = serde_json::to_string_pretty(&encoded)
            .map_err(|e| RoutingError::malformed(&self.path, e.to_string()))?;

        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| RoutingError::io(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| RoutingError::io(&self.path, e))?;
        Ok(())
    }

    /// Set `source -> destination`, returning the previous destination
    pub fn add_mapping(
        &self,
        source: ChannelId,
        destination: ChannelId,
    ) -> Result<Option<ChannelId>> {
        let mut mapping = self.load()?;
        let previous = mapping.insert(source, destination);
        self.save(&mapping)?;

        info!(
            path = %self.path.display(),
            %source,
            %destination,
            replaced = ?previous,
            "mapping stored"
        );
        Ok(previous)
    }

    /// Add seed routes whose source is not mapped yet
    ///
    /// Existing entries win: the file is the operator's record.
    /// Returns the number of routes added.
    pub fn merge_seeds(&self, seeds: &[RouteSeed]) -> Result<usize> {
        let mut mapping = self.load()?;
        let mut added = 0;
        for seed in seeds {
            if !mapping.contains_key(&seed.source) {
                mapping.insert(seed.source, seed.destination);
                added += 1;
            }
        }
        if added > 0 {
            self.save(&mapping)?;
        }
        Ok(added)
    }

    fn parse(&self, content: &str) -> Result<Mapping> {
        let raw: BTreeMap<String, RawChannelId> = serde_json::from_str(content)
            .map_err(|e| RoutingError::malformed(&self.path, e.to_string()))?;

        let mut mapping = Mapping::new();
        for (key, value) in raw {
            let source: ChannelId = key.parse().map_err(|_| {
                RoutingError::malformed(&self.path, format!("invalid source id '{key}'"))
            })?;
            let destination = match value {
                RawChannelId::Number(n) => ChannelId::new(n),
                RawChannelId::Text(s) => s.parse().map_err(|_| {
                    RoutingError::malformed(&self.path, format!("invalid destination id '{s}'"))
                })?,
            };
            mapping.insert(source, destination);
        }
        Ok(mapping)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn id(raw: i64) -> ChannelId {
        ChannelId::new(raw)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("mappings.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_add_mapping_persists() {
        let dir = tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("mappings.json"));

        assert_eq!(store.add_mapping(id(-100), id(-200)).unwrap(), None);
        assert_eq!(
            store.add_mapping(id(-100), id(-300)).unwrap(),
            Some(id(-200))
        );

        let reopened = MappingStore::new(store.path());
        let mapping = reopened.load().unwrap();
        assert_eq!(mapping.get(&id(-100)), Some(&id(-300)));
        assert!(!dir.path().join("mappings.json.tmp").exists());
    }

    #[test]
    fn test_file_shape_uses_string_keys() {
        let dir = tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("mappings.json"));
        store.add_mapping(id(-1), id(-2)).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, "{\n  \"-1\": -2\n}");
    }

    #[test]
    fn test_accepts_string_destinations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mappings.json");
        fs::write(&path, r#"{"-10": "-20", "11": 22}"#).unwrap();

        let mapping = MappingStore::new(&path).load().unwrap();
        assert_eq!(mapping.get(&id(-10)), Some(&id(-20)));
        assert_eq!(mapping.get(&id(11)), Some(&id(22)));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mappings.json");
        fs::write(&path, r#"{"not-a-number": 1}"#).unwrap();

        let err = MappingStore::new(&path).load().unwrap_err();
        assert!(matches!(err, RoutingError::Malformed { .. }));
        assert!(err.to_string().contains("invalid source id"));
    }

    #[test]
    fn test_merge_seeds_keeps_existing() {
        let dir = tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("mappings.json"));
        store.add_mapping(id(1), id(2)).unwrap();

        let added = store
            .merge_seeds(&[
                RouteSeed {
                    source: id(1),
                    destination: id(99),
                },
                RouteSeed {
                    source: id(3),
                    destination: id(4),
                },
            ])
            .unwrap();

        assert_eq!(added, 1);
        let mapping = store.load().unwrap();
        assert_eq!(mapping.get(&id(1)), Some(&id(2)));
        assert_eq!(mapping.get(&id(3)), Some(&id(4)));
    }
}
