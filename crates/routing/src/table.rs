//! RoutingTable - hot-swappable `source -> destination` lookup
//!
//! Readers load an `Arc<Mapping>` snapshot; `reload` builds a complete new
//! map and swaps the pointer, so a concurrent `resolve` sees either the old
//! or the new map, never a partial one.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use contracts::ChannelId;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::{Result, RoutingError};
use crate::store::{Mapping, MappingStore};

/// Routing table backed by a [`MappingStore`]
#[derive(Debug)]
pub struct RoutingTable {
    store: MappingStore,
    current: ArcSwap<Mapping>,
}

/// Outcome of a reload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReloadOutcome {
    /// Routes in the new mapping
    pub routes: usize,
    /// Sources that gained or changed a destination
    pub changed: usize,
    /// Sources no longer mapped
    pub removed: usize,
}

impl ReloadOutcome {
    pub fn is_unchanged(&self) -> bool {
        self.changed == 0 && self.removed == 0
    }
}

impl RoutingTable {
    /// Empty table; call [`RoutingTable::reload`] to populate
    pub fn new(store: MappingStore) -> Self {
        Self {
            store,
            current: ArcSwap::from_pointee(Mapping::new()),
        }
    }

    /// Table populated from the store
    pub fn open(store: MappingStore) -> Result<Self> {
        let table = Self::new(store);
        table.reload()?;
        Ok(table)
    }

    /// Destination for `source`, if mapped
    #[inline]
    pub fn resolve(&self, source: ChannelId) -> Option<ChannelId> {
        self.current.load().get(&source).copied()
    }

    /// Re-read the store and atomically replace the mapping
    ///
    /// On error the previous mapping stays in place.
    #[instrument(name = "routing_reload", skip(self), fields(path = %self.store.path().display()))]
    pub fn reload(&self) -> Result<ReloadOutcome> {
        let next = self.store.load()?;
        let outcome = diff(&self.current.load(), &next);
        self.current.store(Arc::new(next));

        if outcome.is_unchanged() {
            debug!(routes = outcome.routes, "routing table unchanged");
        } else {
            info!(
                routes = outcome.routes,
                changed = outcome.changed,
                removed = outcome.removed,
                "routing table reloaded"
            );
        }
        Ok(outcome)
    }

    /// Current mapping snapshot
    pub fn snapshot(&self) -> Arc<Mapping> {
        self.current.load_full()
    }

    pub fn len(&self) -> usize {
        self.current.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.load().is_empty()
    }

    pub fn store(&self) -> &MappingStore {
        &self.store
    }
}

fn diff(old: &Mapping, new: &Mapping) -> ReloadOutcome {
    let changed = new
        .iter()
        .filter(|(src, dst)| old.get(src) != Some(dst))
        .count();
    let removed = old.keys().filter(|src| !new.contains_key(src)).count();
    ReloadOutcome {
        routes: new.len(),
        changed,
        removed,
    }
}

/// Reload `table` from its store every `interval`
///
/// Failed reloads are logged and the previous mapping is kept. The file is
/// read on the blocking pool so slow disks never stall relay tasks.
pub fn spawn_reload_task(table: Arc<RoutingTable>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First tick completes immediately; the table was loaded at startup.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let table = Arc::clone(&table);
            let result = tokio::task::spawn_blocking(move || table.reload())
                .await
                .map_err(|e| RoutingError::ReloadTask(e.to_string()))
                .and_then(|r| r);
            if let Err(e) = result {
                warn!(error = %e, "routing reload failed, keeping previous mapping");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::tempdir;

    fn id(raw: i64) -> ChannelId {
        ChannelId::new(raw)
    }

    #[test]
    fn test_new_table_is_empty_until_reload() {
        let dir = tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("m.json"));
        store.add_mapping(id(1), id(2)).unwrap();

        let table = RoutingTable::new(store);
        assert_eq!(table.resolve(id(1)), None);

        let outcome = table.reload().unwrap();
        assert_eq!(outcome.routes, 1);
        assert_eq!(outcome.changed, 1);
        assert_eq!(table.resolve(id(1)), Some(id(2)));
    }

    #[test]
    fn test_added_mapping_visible_after_reload_only() {
        let dir = tempdir().unwrap();
        let table = RoutingTable::open(MappingStore::new(dir.path().join("m.json"))).unwrap();
        table.store().add_mapping(id(5), id(6)).unwrap();

        assert_eq!(table.resolve(id(5)), None);
        table.reload().unwrap();
        assert_eq!(table.resolve(id(5)), Some(id(6)));
    }

    #[test]
    fn test_failed_reload_keeps_previous_mapping() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.json");
        let store = MappingStore::new(&path);
        store.add_mapping(id(1), id(2)).unwrap();
        let table = RoutingTable::open(store).unwrap();

        std::fs::write(&path, "{ broken").unwrap();
        assert!(table.reload().is_err());
        assert_eq!(table.resolve(id(1)), Some(id(2)));
    }

    #[test]
    fn test_reload_reports_removals() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("m.json");
        let store = MappingStore::new(&path);
        store.add_mapping(id(1), id(2)).unwrap();
        store.add_mapping(id(3), id(4)).unwrap();
        let table = RoutingTable::open(store).unwrap();

        std::fs::write(&path, r#"{"1": 2}"#).unwrap();
        let outcome = table.reload().unwrap();
        assert_eq!(outcome.removed, 1);
        assert_eq!(outcome.changed, 0);
    }

    #[test]
    fn test_concurrent_resolve_never_torn() {
        let dir = tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("m.json"));
        let table = Arc::new(RoutingTable::open(store).unwrap());
        let done = Arc::new(AtomicBool::new(false));

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let table = Arc::clone(&table);
                let done = Arc::clone(&done);
                std::thread::spawn(move || {
                    while !done.load(Ordering::Relaxed) {
                        match table.resolve(id(-7)) {
                            None => {}
                            Some(dst) => assert_eq!(dst, id(-8)),
                        }
                    }
                })
            })
            .collect();

        table.store().add_mapping(id(-7), id(-8)).unwrap();
        table.reload().unwrap();
        done.store(true, Ordering::Relaxed);

        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(table.resolve(id(-7)), Some(id(-8)));
    }

    #[tokio::test]
    async fn test_reload_task_picks_up_new_routes() {
        let dir = tempdir().unwrap();
        let store = MappingStore::new(dir.path().join("m.json"));
        let table = Arc::new(RoutingTable::open(store).unwrap());
        let handle = spawn_reload_task(Arc::clone(&table), Duration::from_millis(20));

        table.store().add_mapping(id(1), id(2)).unwrap();
        assert_eq!(table.resolve(id(1)), None);

        for _ in 0..100 {
            if table.resolve(id(1)).is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(table.resolve(id(1)), Some(id(2)));
        handle.abort();
    }
}
