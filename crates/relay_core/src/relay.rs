//! Relay - per-event routing and fan-in to the dispatcher

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use album_engine::{GroupBuffer, GroupCompletionScheduler};
use contracts::{InboundEvent, RelayConfig, Route, Transport};
use dispatcher::Dispatcher;
use observability::RelaySummary;
use routing::{spawn_reload_task, MappingStore, RoutingTable};
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, instrument, trace, warn};

use crate::error::{RelayError, Result};

/// What the relay did with an inbound event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Source has no route; event dropped
    Unrouted,
    /// Forward spawned immediately
    Single,
    /// Buffered as an album item; `scheduled` when this event started the
    /// completion task
    Grouped { scheduled: bool },
}

/// Event relay
///
/// Every method takes `&self`; share it behind an `Arc` when several tasks
/// feed events.
pub struct Relay<T> {
    routing: Arc<RoutingTable>,
    dispatcher: Arc<Dispatcher<T>>,
    buffer: Arc<GroupBuffer>,
    scheduler: GroupCompletionScheduler<Dispatcher<T>>,
    window: Duration,
    singles: Mutex<JoinSet<()>>,
    events_received: AtomicU64,
    routing_misses: AtomicU64,
}

impl<T> std::fmt::Debug for Relay<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("routes", &self.routing.len())
            .field("window", &self.window)
            .field("buffer", &self.buffer)
            .finish()
    }
}

impl<T> Relay<T>
where
    T: Transport + Send + Sync + 'static,
{
    /// Assemble a relay around an already opened routing table
    pub fn new(routing: Arc<RoutingTable>, transport: T, window: Duration) -> Result<Self> {
        if window.is_zero() {
            return Err(RelayError::ZeroWindow);
        }

        let dispatcher = Arc::new(Dispatcher::new(transport));
        let buffer = Arc::new(GroupBuffer::new());
        let scheduler = GroupCompletionScheduler::new(Arc::clone(&buffer), Arc::clone(&dispatcher));

        Ok(Self {
            routing,
            dispatcher,
            buffer,
            scheduler,
            window,
            singles: Mutex::new(JoinSet::new()),
            events_received: AtomicU64::new(0),
            routing_misses: AtomicU64::new(0),
        })
    }

    /// Open the mapping store named by `config`, merge its seed routes and
    /// assemble the relay
    #[instrument(name = "relay_from_config", skip(config, transport))]
    pub fn from_config(config: &RelayConfig, transport: T) -> Result<Self> {
        let store = MappingStore::new(&config.routing.mapping_file);
        if !config.routes.is_empty() {
            let added = store.merge_seeds(&config.routes)?;
            debug!(added, seeds = config.routes.len(), "seed routes merged");
        }

        let routing = Arc::new(RoutingTable::open(store)?);
        info!(
            routes = routing.len(),
            window_ms = config.relay.quiescence_window_ms,
            "relay assembled"
        );
        Self::new(routing, transport, config.relay.quiescence_window())
    }

    /// Route one inbound event
    ///
    /// Never blocks on delivery: singles and album completions run as
    /// separate tasks. Must be called from within a tokio runtime.
    #[instrument(
        name = "relay_handle_event",
        skip(self, event),
        fields(source = %event.source, event_id = event.id)
    )]
    pub fn handle_event(&self, event: InboundEvent) -> Disposition {
        self.events_received.fetch_add(1, Ordering::Relaxed);
        observability::record_event_received();

        let Some(destination) = self.routing.resolve(event.source) else {
            self.routing_misses.fetch_add(1, Ordering::Relaxed);
            observability::record_routing_miss();
            debug!("no route for source, dropping event");
            return Disposition::Unrouted;
        };
        let route = Route::new(event.source, destination);

        match event.group_key() {
            Some(key) => {
                trace!(group = %key, "buffering album item");
                self.buffer.append(key.clone(), event);
                let scheduled = self.scheduler.ensure_started(key, route, self.window);
                Disposition::Grouped { scheduled }
            }
            None => {
                let dispatcher = Arc::clone(&self.dispatcher);
                let mut singles = self.lock_singles();
                reap_finished(&mut singles);
                singles.spawn(async move {
                    dispatcher.send_single(route, &event).await;
                });
                Disposition::Single
            }
        }
    }

    /// Consume a feed until its channel closes
    ///
    /// Returns the number of events handled. Albums still inside their window
    /// are not awaited; call [`Relay::drain`] for that.
    pub async fn run(&self, mut events: mpsc::Receiver<InboundEvent>) -> u64 {
        let mut handled = 0u64;
        while let Some(event) = events.recv().await {
            self.handle_event(event);
            handled += 1;

            if handled % 100 == 0 {
                debug!(events = handled, "relay progress");
            }
        }
        info!(events = handled, "event feed closed");
        handled
    }

    /// Wait until every in-flight single and pending album is delivered
    pub async fn drain(&self) -> usize {
        let mut awaited = 0;
        loop {
            let mut singles = std::mem::take(&mut *self.lock_singles());
            let mut round = 0;
            while let Some(result) = singles.join_next().await {
                if let Err(e) = result {
                    warn!(error = %e, "single forward task failed");
                }
                round += 1;
            }
            round += self.scheduler.drain().await;

            if round == 0 {
                debug!(tasks = awaited, "relay drained");
                return awaited;
            }
            awaited += round;
        }
    }

    /// Start periodic routing reloads
    pub fn spawn_reload(&self, interval: Duration) -> JoinHandle<()> {
        spawn_reload_task(Arc::clone(&self.routing), interval)
    }

    pub fn routing(&self) -> &Arc<RoutingTable> {
        &self.routing
    }

    pub fn dispatcher(&self) -> &Dispatcher<T> {
        &self.dispatcher
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Albums currently buffered
    pub fn pending_groups(&self) -> usize {
        self.buffer.pending_groups()
    }

    /// Album items currently buffered
    pub fn buffered_events(&self) -> usize {
        self.buffer.buffered_events()
    }

    /// Completion tasks plus single forwards not yet finished
    pub fn in_flight(&self) -> usize {
        let mut singles = self.lock_singles();
        reap_finished(&mut singles);
        singles.len() + self.scheduler.active_tasks()
    }

    /// Run summary so far
    pub fn summary(&self) -> RelaySummary {
        self.dispatcher.summary().with_ingress(
            self.events_received.load(Ordering::Relaxed),
            self.routing_misses.load(Ordering::Relaxed),
        )
    }

    fn lock_singles(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.singles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn reap_finished(tasks: &mut JoinSet<()>) {
    while let Some(result) = tasks.try_join_next() {
        if let Err(e) = result {
            warn!(error = %e, "single forward task failed");
        }
    }
}
