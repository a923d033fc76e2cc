//! Deferred album completion.
//!
//! The first `ensure_started` for a buffer entry spawns one task that sleeps
//! the quiescence window, takes the buffered events and hands them to the
//! sink. Items arriving after the snapshot land in a fresh entry and are
//! dispatched by their own task.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use contracts::{GroupKey, GroupSink, Route};
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::buffer::GroupBuffer;

/// Spawns and tracks one completion task per live album
pub struct GroupCompletionScheduler<S> {
    buffer: Arc<GroupBuffer>,
    sink: Arc<S>,
    tasks: Mutex<JoinSet<()>>,
}

impl<S> fmt::Debug for GroupCompletionScheduler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupCompletionScheduler")
            .field("buffer", &self.buffer)
            .field("tasks", &self.lock_tasks().len())
            .finish()
    }
}

impl<S> GroupCompletionScheduler<S>
where
    S: GroupSink + Send + Sync + 'static,
{
    pub fn new(buffer: Arc<GroupBuffer>, sink: Arc<S>) -> Self {
        Self {
            buffer,
            sink,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Start the completion task for `key` unless one is already pending
    ///
    /// Returns `true` when a task was spawned. Must be called from within a
    /// tokio runtime.
    #[instrument(
        name = "album_ensure_started",
        skip(self, key, route, window),
        fields(group = %key, dest = %route.destination)
    )]
    pub fn ensure_started(&self, key: GroupKey, route: Route, window: Duration) -> bool {
        if !self.buffer.begin_scheduling(&key) {
            return false;
        }

        let buffer = Arc::clone(&self.buffer);
        let sink = Arc::clone(&self.sink);

        let mut tasks = self.lock_tasks();
        reap_finished(&mut tasks);
        tasks.spawn(complete_group(buffer, sink, key, route, window));
        debug!(window_ms = window.as_millis() as u64, "album completion scheduled");
        true
    }

    /// Completion tasks not yet finished
    pub fn active_tasks(&self) -> usize {
        let mut tasks = self.lock_tasks();
        reap_finished(&mut tasks);
        tasks.len()
    }

    /// Wait for every outstanding completion task
    ///
    /// Tasks spawned while draining are awaited too. Returns how many tasks
    /// were awaited.
    pub async fn drain(&self) -> usize {
        let mut awaited = 0;
        loop {
            let mut tasks = std::mem::take(&mut *self.lock_tasks());
            if tasks.is_empty() {
                return awaited;
            }
            while let Some(result) = tasks.join_next().await {
                if let Err(e) = result {
                    warn!(error = %e, "album completion task failed");
                }
                awaited += 1;
            }
        }
    }
}

impl<S> GroupCompletionScheduler<S> {
    fn lock_tasks(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn reap_finished(tasks: &mut JoinSet<()>) {
    while let Some(result) = tasks.try_join_next() {
        if let Err(e) = result {
            warn!(error = %e, "album completion task failed");
        }
    }
}

async fn complete_group<S>(
    buffer: Arc<GroupBuffer>,
    sink: Arc<S>,
    key: GroupKey,
    route: Route,
    window: Duration,
) where
    S: GroupSink + Send + Sync + 'static,
{
    tokio::time::sleep(window).await;

    let events = buffer.snapshot_and_clear(&key);
    if events.is_empty() {
        debug!(group = %key, "album empty at completion, skipping");
        return;
    }

    debug!(group = %key, items = events.len(), "album complete");
    sink.send_group(route, events).await;
}
