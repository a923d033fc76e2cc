//! Per-album event buffer.
//!
//! One entry per live `(source, group_id)` key holding the events received so
//! far, in arrival order, plus the admission flag of its completion task.
//! Every operation takes the registry lock for a short, non-awaiting critical
//! section, so appends for the same key serialize and never interleave with a
//! snapshot.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::{GroupKey, InboundEvent};

#[derive(Debug, Default)]
struct GroupEntry {
    events: Vec<InboundEvent>,
    scheduling_started: bool,
}

/// Buffered albums keyed by source channel and group id
#[derive(Default)]
pub struct GroupBuffer {
    entries: Mutex<HashMap<GroupKey, GroupEntry>>,
}

impl fmt::Debug for GroupBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.lock();
        f.debug_struct("GroupBuffer")
            .field("groups", &entries.len())
            .field("events", &entries.values().map(|e| e.events.len()).sum::<usize>())
            .finish()
    }
}

impl GroupBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<GroupKey, GroupEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `event` to the album at `key`
    ///
    /// Returns `true` when this call created the entry.
    pub fn append(&self, key: GroupKey, event: InboundEvent) -> bool {
        let mut entries = self.lock();
        let created = !entries.contains_key(&key);
        entries.entry(key).or_default().events.push(event);
        publish_pending(entries.len());
        created
    }

    /// Claim the completion task slot for `key`
    ///
    /// Returns `true` for exactly one caller per entry lifetime. An absent key
    /// gets an empty entry so that events arriving after a snapshot are
    /// covered by the newly admitted task.
    pub fn begin_scheduling(&self, key: &GroupKey) -> bool {
        let mut entries = self.lock();
        let admitted = match entries.get_mut(key) {
            Some(entry) => !std::mem::replace(&mut entry.scheduling_started, true),
            None => {
                entries.insert(
                    key.clone(),
                    GroupEntry {
                        events: Vec::new(),
                        scheduling_started: true,
                    },
                );
                true
            }
        };
        publish_pending(entries.len());
        admitted
    }

    /// Remove the entry at `key` and return its events in arrival order
    ///
    /// Unknown keys yield an empty vector.
    pub fn snapshot_and_clear(&self, key: &GroupKey) -> Vec<InboundEvent> {
        let mut entries = self.lock();
        let events = entries.remove(key).map(|e| e.events).unwrap_or_default();
        publish_pending(entries.len());
        events
    }

    /// Live album entries
    pub fn pending_groups(&self) -> usize {
        self.lock().len()
    }

    /// Events held across all entries
    pub fn buffered_events(&self) -> usize {
        self.lock().values().map(|e| e.events.len()).sum()
    }

    pub fn contains(&self, key: &GroupKey) -> bool {
        self.lock().contains_key(key)
    }
}

fn publish_pending(groups: usize) {
    observability::record_pending_groups(groups);
}
