//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! security pipeline, gate, sweeps produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters)
//!
//! Consumers:
//!     → stderr log stream
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Structured logging with fields for machine parsing
//! - Each pipeline run gets a request ID span
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
