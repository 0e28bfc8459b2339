//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Load admin list → Build limiter, dedup, middleware, gate → Start sweeps
//!
//! Sweeps (sweeper.rs):
//!     interval tick → evict expired entries (until stopped or dropped)
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop reading events → Stop sweeps → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then core, then background tasks
//! - Every background task has an owner that stops it

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod sweeper;

pub use shutdown::Shutdown;
pub use startup::Guard;
