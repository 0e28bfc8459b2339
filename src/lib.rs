//! Admission control for a chat-bot backend.
//!
//! Every inbound event passes through an [`EventGate`] before any handler runs:
//! redelivered callbacks are dropped, then the [`SecurityMiddleware`] rate-limits
//! per user and category, validates the payload, and attaches its decision to
//! the event context. All state is in-process and ephemeral.

pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::GuardConfig;
pub use error::SecurityError;
pub use event::{EventKind, InboundEvent, UserId, UserProfile};
pub use lifecycle::{Guard, Shutdown};
pub use security::{Dispatch, EventGate, SecurityMiddleware};
