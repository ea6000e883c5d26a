//! Timer collection controller
//!
//! `AppState` is the only writer of the timer collection. Every change is a
//! whole-value replacement made under one lock, followed by a persist of the
//! full collection. The same lock guards the registry of live tick tasks so a
//! timer never has more than one effective tick source.
//!
//! The collection is serialized under the lock but written to the store after
//! the lock is released. Each snapshot carries a revision and a write is
//! skipped when a newer revision has already been stored.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard},
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::{sync::broadcast, task::JoinHandle};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::{create_timer, EventKind, StatusFilter, TickOutcome, Timer, TimerEvent};
use crate::{
    error::TimerError,
    services::{Notice, Notify},
    storage::{self, KeyValueStore},
    tasks::countdown_task,
};

/// A spawned countdown task and the generation it was armed with
#[derive(Debug)]
struct Ticker {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct Collection {
    timers: Vec<Timer>,
    tickers: HashMap<Uuid, Ticker>,
    next_generation: u64,
    revision: u64,
}

/// Serialized collection waiting to be written
struct Snapshot {
    revision: u64,
    json: String,
}

impl Collection {
    fn position(&self, id: Uuid) -> Option<usize> {
        self.timers.iter().position(|t| t.id == id)
    }

    fn disarm(&mut self, id: Uuid) {
        if let Some(ticker) = self.tickers.remove(&id) {
            debug!("Tearing down tick source for {} (generation {})", id, ticker.generation);
            ticker.handle.abort();
        }
    }
}

/// Counts reported by the status endpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimerCounts {
    pub total: usize,
    pub running: usize,
    pub completed: usize,
}

/// Main application state: the timer collection plus server metadata
pub struct AppState {
    collection: Mutex<Collection>,
    store: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notify>,
    /// Channel for user-facing timer messages
    pub events_tx: broadcast::Sender<TimerEvent>,
    /// Server metadata
    pub start_time: Instant,
    pub port: u16,
    pub host: String,
    /// Last action tracking
    last_action: Mutex<Option<(String, DateTime<Utc>)>>,
    /// Revision of the last snapshot handed to the store
    written: Mutex<u64>,
}

impl AppState {
    /// Create the controller, restoring any timers saved in `store`.
    ///
    /// Restored timers that were running are not ticking yet; call
    /// [`AppState::resume_running`] once the state is shared.
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        notifier: Arc<dyn Notify>,
        host: String,
        port: u16,
    ) -> Self {
        let (events_tx, _) = broadcast::channel(100);
        let timers = storage::load_timers(store.as_ref());
        info!("Restored {} timers", timers.len());

        Self {
            collection: Mutex::new(Collection {
                timers,
                ..Collection::default()
            }),
            store,
            notifier,
            events_tx,
            start_time: Instant::now(),
            port,
            host,
            last_action: Mutex::new(None),
            written: Mutex::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Collection> {
        // A poisoned lock still holds a consistent collection since every
        // write is a single replacement.
        self.collection.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Bump the revision and serialize the collection. Called with the lock held.
    fn snapshot(&self, collection: &mut Collection) -> Option<Snapshot> {
        collection.revision += 1;
        match storage::encode_timers(&collection.timers) {
            Ok(json) => Some(Snapshot {
                revision: collection.revision,
                json,
            }),
            Err(e) => {
                error!("Failed to encode timers: {}", e);
                None
            }
        }
    }

    /// Write a snapshot unless a newer one already landed. Called without the
    /// collection lock so file I/O never stalls ticks of other timers.
    fn persist(&self, snapshot: Option<Snapshot>) {
        let Some(snapshot) = snapshot else {
            return;
        };
        let mut written = self.written.lock().unwrap_or_else(|e| e.into_inner());
        if snapshot.revision <= *written {
            debug!("Skipping stale snapshot {} (stored {})", snapshot.revision, *written);
            return;
        }
        if let Err(e) = self.store.set(storage::TIMERS_KEY, &snapshot.json) {
            error!("Failed to persist timers: {}", e);
        }
        *written = snapshot.revision;
    }

    fn record_action(&self, action: &str) {
        if let Ok(mut last) = self.last_action.lock() {
            *last = Some((action.to_string(), Utc::now()));
        }
    }

    fn publish(&self, event: TimerEvent) {
        info!("{}: {}", event.title, event.message);
        // No subscribers is fine
        let _ = self.events_tx.send(event);
    }

    /// Spawn a fresh tick task for `id`, aborting any previous one
    fn arm(self: &Arc<Self>, collection: &mut Collection, id: Uuid) {
        collection.disarm(id);
        collection.next_generation += 1;
        let generation = collection.next_generation;
        let handle = tokio::spawn(countdown_task(Arc::clone(self), id, generation));
        debug!("Armed tick source for {} (generation {})", id, generation);
        collection.tickers.insert(id, Ticker { generation, handle });
    }

    /// Make the tick registry agree with the timer's running flag
    fn sync_ticker(self: &Arc<Self>, collection: &mut Collection, timer: &Timer) {
        if timer.is_running {
            if !collection.tickers.contains_key(&timer.id) {
                self.arm(collection, timer.id);
            }
        } else {
            collection.disarm(timer.id);
        }
    }

    /// Subscribe to user-facing timer messages
    pub fn subscribe(&self) -> broadcast::Receiver<TimerEvent> {
        self.events_tx.subscribe()
    }

    /// Snapshot of the whole collection in insertion order
    pub fn timers(&self) -> Vec<Timer> {
        self.lock().timers.clone()
    }

    /// Timers passing `filter`, in insertion order
    pub fn filter(&self, filter: StatusFilter) -> Vec<Timer> {
        self.lock()
            .timers
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: Uuid) -> Result<Timer, TimerError> {
        let collection = self.lock();
        collection
            .position(id)
            .map(|i| collection.timers[i].clone())
            .ok_or(TimerError::NotFound(id))
    }

    /// Whether a tick task is currently registered for `id`
    #[cfg(test)]
    pub(crate) fn is_ticking(&self, id: Uuid) -> bool {
        self.lock().tickers.contains_key(&id)
    }

    pub fn counts(&self) -> TimerCounts {
        let collection = self.lock();
        TimerCounts {
            total: collection.timers.len(),
            running: collection.timers.iter().filter(|t| t.is_running).count(),
            completed: collection.timers.iter().filter(|t| t.is_completed).count(),
        }
    }

    /// Validate, append and persist a new timer
    pub fn create(&self, label: &str, duration: u64, looping: bool) -> Result<Timer, TimerError> {
        let timer = create_timer(label, duration, looping)?;
        let pending = {
            let mut collection = self.lock();
            collection.timers.push(timer.clone());
            self.snapshot(&mut collection)
        };
        self.persist(pending);

        self.record_action("create");
        self.publish(TimerEvent::new(EventKind::Created, &timer));
        Ok(timer)
    }

    /// Swap in a new value at `index`, keeping the tick registry in step
    fn replace(
        self: &Arc<Self>,
        collection: &mut Collection,
        index: usize,
        timer: Timer,
    ) -> Option<Snapshot> {
        self.sync_ticker(collection, &timer);
        collection.timers[index] = timer;
        self.snapshot(collection)
    }

    /// Replace the timer with the same id. Returns false when no such timer
    /// exists, in which case nothing changes.
    ///
    /// `duration`, `loop` and `createdAt` keep their stored values, an empty
    /// label keeps the stored label, and the result is normalized so the
    /// timer invariants hold before a tick source is armed for it.
    pub fn update(self: &Arc<Self>, timer: Timer) -> bool {
        let pending = {
            let mut collection = self.lock();
            let Some(index) = collection.position(timer.id) else {
                debug!("Ignoring update for unknown timer {}", timer.id);
                return false;
            };

            let current = &collection.timers[index];
            let label = if timer.label.trim().is_empty() {
                current.label.clone()
            } else {
                timer.label.trim().to_string()
            };
            let next = Timer {
                label,
                duration: current.duration,
                looping: current.looping,
                created_at: current.created_at,
                ..timer
            }
            .normalized();
            self.replace(&mut collection, index, next)
        };

        self.persist(pending);
        true
    }

    /// Start/pause toggle
    pub fn toggle(self: &Arc<Self>, id: Uuid) -> Result<Timer, TimerError> {
        let (next, pending) = {
            let mut collection = self.lock();
            let index = collection.position(id).ok_or(TimerError::NotFound(id))?;
            let next = collection.timers[index].toggled();
            let pending = self.replace(&mut collection, index, next.clone());
            (next, pending)
        };
        self.persist(pending);

        info!("Timer \"{}\" {}", next.label, if next.is_running { "started" } else { "paused" });
        self.record_action(if next.is_running { "start" } else { "pause" });
        Ok(next)
    }

    /// Reset to full duration. A timer that is already full and stopped is
    /// returned unchanged.
    pub fn reset(self: &Arc<Self>, id: Uuid) -> Result<Timer, TimerError> {
        let (next, pending) = {
            let mut collection = self.lock();
            let index = collection.position(id).ok_or(TimerError::NotFound(id))?;
            let current = &collection.timers[index];
            if !current.can_reset() {
                debug!("Timer \"{}\" already reset", current.label);
                return Ok(current.clone());
            }
            let next = current.reset();
            let pending = self.replace(&mut collection, index, next.clone());
            (next, pending)
        };
        self.persist(pending);

        info!("Timer \"{}\" reset", next.label);
        self.record_action("reset");
        Ok(next)
    }

    /// Remove a timer and stop its countdown
    pub fn delete(&self, id: Uuid) -> Option<Timer> {
        let (removed, pending) = {
            let mut collection = self.lock();
            let index = collection.position(id)?;
            collection.disarm(id);
            let removed = collection.timers.remove(index);
            (removed, self.snapshot(&mut collection))
        };
        self.persist(pending);

        self.record_action("delete");
        self.publish(TimerEvent::new(EventKind::Deleted, &removed));
        Some(removed)
    }

    /// Completion hook called by the countdown engine. Does not mutate.
    pub fn complete(&self, id: Uuid) {
        match self.get(id) {
            Ok(timer) => self.publish(TimerEvent::new(EventKind::Completed, &timer)),
            Err(_) => debug!("Completed timer {} no longer exists", id),
        }
    }

    /// Apply one tick from the countdown task armed with `generation`.
    ///
    /// Returns `None` when the tick must be discarded: the timer is gone, no
    /// longer running, or a newer tick source has replaced this one.
    pub fn tick(&self, id: Uuid, generation: u64) -> Option<TickOutcome> {
        let (timer, outcome, pending) = {
            let mut collection = self.lock();
            match collection.tickers.get(&id) {
                Some(ticker) if ticker.generation == generation => {}
                _ => {
                    debug!("Discarding stale tick for {} (generation {})", id, generation);
                    return None;
                }
            }

            let index = collection.position(id)?;
            if !collection.timers[index].is_running {
                collection.tickers.remove(&id);
                return None;
            }

            let (next, outcome) = collection.timers[index].tick();
            collection.timers[index] = next.clone();
            if outcome == TickOutcome::Completed {
                // The task ends on its own after this tick
                collection.tickers.remove(&id);
            }
            (next, outcome, self.snapshot(&mut collection))
        };
        self.persist(pending);

        match outcome {
            TickOutcome::Decremented => {}
            TickOutcome::Cycled => {
                self.notifier.notify(Notice::CycleCompleted { label: timer.label.clone() });
                self.publish(TimerEvent::new(EventKind::Cycled, &timer));
            }
            TickOutcome::Completed => {
                self.notifier.notify(Notice::Finished { label: timer.label.clone() });
                self.complete(id);
            }
        }
        Some(outcome)
    }

    /// Re-arm every timer that is marked running, e.g. after a restart
    pub fn resume_running(self: &Arc<Self>) {
        let mut collection = self.lock();
        let running: Vec<Uuid> = collection
            .timers
            .iter()
            .filter(|t| t.is_running)
            .map(|t| t.id)
            .collect();

        for id in &running {
            if !collection.tickers.contains_key(id) {
                self.arm(&mut collection, *id);
            }
        }
        if !running.is_empty() {
            info!("Resumed {} running timers", running.len());
        }
    }

    /// Abort every tick task
    pub fn shutdown(&self) {
        let mut collection = self.lock();
        let count = collection.tickers.len();
        for (_, ticker) in collection.tickers.drain() {
            ticker.handle.abort();
        }
        if count > 0 {
            warn!("Stopped {} tick sources on shutdown", count);
        }
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        match self.last_action.lock().ok().and_then(|a| a.clone()) {
            Some((action, time)) => (Some(action), Some(time)),
            None => (None, None),
        }
    }
}
