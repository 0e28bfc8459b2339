//! Shared utilities for integration and load testing.

use std::sync::Arc;

use bot_guard::config::{GuardConfig, RuleConfig};
use bot_guard::{Guard, ManualClock, UserProfile};

/// Build a guard on a manual clock so tests control window and TTL expiry.
pub fn guard_with(config: GuardConfig) -> (Guard, ManualClock) {
    let clock = ManualClock::default();
    let guard = Guard::with_clock(config, Arc::new(clock.clone())).unwrap();
    (guard, clock)
}

#[allow(dead_code)]
pub fn guard() -> (Guard, ManualClock) {
    guard_with(GuardConfig::default())
}

/// Default config with every category capped at `requests` per `window_secs`.
#[allow(dead_code)]
pub fn uniform_config(requests: u32, window_secs: u64) -> GuardConfig {
    let rule = RuleConfig::new(requests, window_secs);
    let mut config = GuardConfig::default();
    config.rate_limits.global = rule;
    config.rate_limits.command = rule;
    config.rate_limits.message = rule;
    config.rate_limits.callback = rule;
    config.rate_limits.inline = rule;
    config.rate_limits.export = rule;
    config
}

/// A profile that passes every user-data check.
pub fn user(id: i64) -> UserProfile {
    UserProfile {
        id,
        username: Some(format!("user_{id:05}")),
        first_name: Some("Анна".into()),
        last_name: None,
    }
}
