//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated, immutable)
//!     → handed to each component at construction
//!
//! Admin allow-list:
//!     security.admin_ids + $ADMIN_USER_IDS
//!     → loader.rs (read once at startup)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; limits are fixed for the process lifetime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_admin_ids, load_config, ConfigError};
pub use schema::{
    DedupConfig, GuardConfig, ObservabilityConfig, RateLimitConfig, RuleConfig, SecurityConfig,
};
