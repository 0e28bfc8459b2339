//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound event:
//!     → gate.rs (drop redelivered callbacks)
//!     → middleware.rs (identify, then run the checks below)
//!         → rate_limit.rs (per-user, per-category fixed windows)
//!         → screen.rs (validate sender profile and payload)
//!     → Pass to handler
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - Fail closed: reject on any security check failure
//! - No trust in client input
//! - All state is in-process and ephemeral

pub mod access_control;
pub mod dedup;
pub mod gate;
pub mod middleware;
pub mod rate_limit;
pub mod screen;

pub use access_control::AdminList;
pub use dedup::{CallbackDeduplicator, DedupStats};
pub use gate::{Dispatch, EventGate};
pub use middleware::{SecurityDecision, SecurityMiddleware, SecurityStats};
pub use rate_limit::{Category, LimitInfo, RateLimitDecision, RateLimiter, RateLimiterStats};
pub use screen::{DefaultScreen, EventScreen, ValidatedEvent, ValidatedInput};
