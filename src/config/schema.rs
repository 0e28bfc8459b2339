//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files, and
//! every section has defaults so an empty file yields the stock limits.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::security::rate_limit::Category;

/// Root configuration for the admission-control layer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Per-category request limits.
    pub rate_limits: RateLimitConfig,

    /// Callback deduplication settings.
    pub dedup: DedupConfig,

    /// Admin allow-list and related settings.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// A `(requests, window)` pair for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleConfig {
    /// Requests allowed per window.
    pub requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl RuleConfig {
    pub const fn new(requests: u32, window_secs: u64) -> Self {
        Self {
            requests,
            window_secs,
        }
    }

    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub global: RuleConfig,
    pub command: RuleConfig,
    pub message: RuleConfig,
    pub callback: RuleConfig,
    pub inline: RuleConfig,
    pub export: RuleConfig,

    /// Background sweep interval in seconds (0 disables the sweep).
    pub sweep_interval_secs: u64,
}

impl RateLimitConfig {
    /// Rule that applies to a category.
    pub fn rule(&self, category: Category) -> RuleConfig {
        match category {
            Category::Global => self.global,
            Category::Command => self.command,
            Category::Message => self.message,
            Category::Callback => self.callback,
            Category::Inline => self.inline,
            Category::Export => self.export,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            global: RuleConfig::new(100, 60),
            command: RuleConfig::new(10, 60),
            message: RuleConfig::new(30, 60),
            callback: RuleConfig::new(50, 60),
            inline: RuleConfig::new(20, 60),
            export: RuleConfig::new(5, 300),
            sweep_interval_secs: 60,
        }
    }
}

/// Callback deduplication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DedupConfig {
    /// How long a callback id stays "processed", in milliseconds.
    pub max_age_ms: u64,

    /// Interval of the background eviction sweep, in milliseconds.
    pub sweep_interval_ms: u64,
}

impl DedupConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            max_age_ms: 30_000,
            sweep_interval_ms: 60_000,
        }
    }
}

/// Security configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Identities allowed through `admin_only`.
    pub admin_ids: Vec<i64>,

    /// Environment variable holding extra comma-separated admin ids.
    pub admin_ids_env: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            admin_ids: Vec::new(),
            admin_ids_env: "ADMIN_USER_IDS".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
