//! Callback deduplication.
//!
//! # States
//! ```text
//! Unseen → Seen (mark_processed / check_and_mark)
//! Seen → Unseen (age > max_age, found by is_processed or the sweep)
//! ```
//!
//! # Design Decisions
//! - Idempotency cache keyed by the transport's callback id
//! - Expiry is checked on every read, the sweep only bounds memory
//! - Removal re-checks age under the shard lock, so a concurrent re-mark survives

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::config::DedupConfig;
use crate::lifecycle::sweeper::{SweepError, SweepTask};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DedupStats {
    pub total_tracked: usize,
    pub max_age_ms: u64,
    pub sweep_interval_ms: u64,
}

fn is_expired(seen_at: Instant, now: Instant, max_age: Duration) -> bool {
    now.saturating_duration_since(seen_at) > max_age
}

fn purge_expired(processed: &DashMap<String, Instant>, now: Instant, max_age: Duration) -> usize {
    let mut removed = 0;
    processed.retain(|_, seen_at| {
        let keep = !is_expired(*seen_at, now, max_age);
        if !keep {
            removed += 1;
        }
        keep
    });
    removed
}

/// TTL cache of callback ids that have already been handled.
#[derive(Debug)]
pub struct CallbackDeduplicator {
    processed: Arc<DashMap<String, Instant>>,
    max_age: Duration,
    sweep_interval: Duration,
    clock: Arc<dyn Clock>,
    sweeper: Mutex<Option<SweepTask>>,
}

impl CallbackDeduplicator {
    pub fn new(config: &DedupConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            processed: Arc::new(DashMap::new()),
            max_age: config.max_age(),
            sweep_interval: config.sweep_interval(),
            clock,
            sweeper: Mutex::new(None),
        }
    }

    /// True while `id` was marked within `max_age`. An expired entry is evicted.
    pub fn is_processed(&self, id: &str) -> bool {
        let now = self.clock.now();
        let seen_at = match self.processed.get(id) {
            Some(entry) => *entry.value(),
            None => return false,
        };

        if !is_expired(seen_at, now, self.max_age) {
            return true;
        }

        let max_age = self.max_age;
        self.processed
            .remove_if(id, |_, seen_at| is_expired(*seen_at, now, max_age));
        false
    }

    /// Record `id` as handled now, overwriting any earlier mark.
    pub fn mark_processed(&self, id: &str) {
        self.processed.insert(id.to_string(), self.clock.now());
    }

    /// Atomically test and mark. Returns true if `id` was already processed,
    /// in which case the existing mark is left as it was.
    pub fn check_and_mark(&self, id: &str) -> bool {
        let now = self.clock.now();
        match self.processed.entry(id.to_string()) {
            Entry::Occupied(mut entry) => {
                if is_expired(*entry.get(), now, self.max_age) {
                    entry.insert(now);
                    false
                } else {
                    true
                }
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                false
            }
        }
    }

    /// Evict every entry older than `max_age`.
    pub fn cleanup(&self) -> usize {
        purge_expired(&self.processed, self.clock.now(), self.max_age)
    }

    pub fn get_stats(&self) -> DedupStats {
        DedupStats {
            total_tracked: self.processed.len(),
            max_age_ms: self.max_age.as_millis() as u64,
            sweep_interval_ms: self.sweep_interval.as_millis() as u64,
        }
    }

    /// Start the periodic sweep. No-op if it is already running.
    pub fn start_sweep(&self) -> Result<(), SweepError> {
        let mut slot = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Ok(());
        }

        let processed = Arc::clone(&self.processed);
        let clock = Arc::clone(&self.clock);
        let max_age = self.max_age;
        *slot = Some(SweepTask::spawn(
            "callback_dedup",
            self.sweep_interval,
            move || purge_expired(&processed, clock.now(), max_age),
        )?);
        Ok(())
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Stop the sweep and forget every id. Call on shutdown.
    pub fn destroy(&self) {
        let task = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.stop();
        }
        self.processed.clear();
        tracing::debug!("Callback deduplicator destroyed");
    }
}
