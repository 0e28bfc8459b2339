//! Periodic eviction task owned by a component.
//!
//! A [`SweepTask`] runs a closure on a fixed interval until it is stopped or
//! dropped, so no timer outlives the component that spawned it.

use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

#[derive(Debug, Error)]
pub enum SweepError {
    #[error("background sweep needs a running tokio runtime")]
    NoRuntime,

    #[error("sweep '{0}' has a zero interval")]
    ZeroInterval(&'static str),
}

/// Handle to a running sweep loop.
#[derive(Debug)]
pub struct SweepTask {
    stop_tx: broadcast::Sender<()>,
    handle: Option<JoinHandle<()>>,
}

impl SweepTask {
    /// Spawn `sweep` every `every` on the current runtime.
    ///
    /// The closure returns how many entries it evicted; non-zero results are logged.
    pub fn spawn<F>(name: &'static str, every: Duration, mut sweep: F) -> Result<Self, SweepError>
    where
        F: FnMut() -> usize + Send + 'static,
    {
        if every.is_zero() {
            return Err(SweepError::ZeroInterval(name));
        }
        let runtime = Handle::try_current().map_err(|_| SweepError::NoRuntime)?;
        let (stop_tx, mut stop_rx) = broadcast::channel(1);

        let handle = runtime.spawn(async move {
            let mut ticker = time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = sweep();
                        if evicted > 0 {
                            tracing::debug!(sweep = name, evicted, "Sweep evicted expired entries");
                        }
                    }
                    _ = stop_rx.recv() => {
                        tracing::debug!(sweep = name, "Sweep stopped");
                        break;
                    }
                }
            }
        });

        tracing::debug!(sweep = name, interval_ms = every.as_millis() as u64, "Sweep started");
        Ok(Self {
            stop_tx,
            handle: Some(handle),
        })
    }

    /// Stop the loop without waiting; the task is aborted if it has not exited yet.
    pub fn stop(self) {
        let _ = self.stop_tx.send(());
    }
}

impl Drop for SweepTask {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
