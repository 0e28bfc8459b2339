//! Dispatch edge: callback dedup, then the security pipeline.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

use crate::error::SecurityError;
use crate::event::InboundEvent;
use crate::observability::metrics;
use crate::security::dedup::CallbackDeduplicator;
use crate::security::middleware::SecurityMiddleware;

/// How the gate disposed of an event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Dispatch<T> {
    /// Admitted; carries the handler's output.
    #[serde(rename = "admitted")]
    Handled { output: T },
    /// A callback id seen within the dedup window. Nothing ran.
    Duplicate,
    Rejected { error: SecurityError },
}

impl<T> Dispatch<T> {
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Handled { .. })
    }
}

pub struct EventGate {
    dedup: Arc<CallbackDeduplicator>,
    middleware: Arc<SecurityMiddleware>,
}

impl EventGate {
    pub fn new(dedup: Arc<CallbackDeduplicator>, middleware: Arc<SecurityMiddleware>) -> Self {
        Self { dedup, middleware }
    }

    pub fn middleware(&self) -> &Arc<SecurityMiddleware> {
        &self.middleware
    }

    pub fn dedup(&self) -> &Arc<CallbackDeduplicator> {
        &self.dedup
    }

    /// Callbacks are marked before the pipeline runs, so a redelivery that arrives
    /// while the first copy is still in flight is dropped too. A rejected callback
    /// stays marked.
    pub async fn dispatch<F, Fut, T>(&self, event: InboundEvent, next: F) -> Dispatch<T>
    where
        F: FnOnce(InboundEvent) -> Fut,
        Fut: Future<Output = T>,
    {
        if event.kind.is_callback() && self.dedup.check_and_mark(&event.id) {
            tracing::debug!(
                event_id = %event.id,
                user_id = ?event.user_id(),
                "Duplicate callback dropped"
            );
            metrics::record_duplicate_callback();
            return Dispatch::Duplicate;
        }

        match self.middleware.pipeline(event, next).await {
            Ok(output) => Dispatch::Handled { output },
            Err(error) => Dispatch::Rejected { error },
        }
    }
}
