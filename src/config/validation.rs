//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges. All problems are
//! reported together rather than stopping at the first one.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::GuardConfig;
use crate::security::rate_limit::Category;

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("rate limit for '{0}' allows zero requests")]
    ZeroRequests(Category),

    #[error("rate limit window for '{0}' is zero")]
    ZeroWindow(Category),

    #[error("dedup max_age_ms must be greater than zero")]
    ZeroDedupMaxAge,

    #[error("dedup sweep_interval_ms must be greater than zero")]
    ZeroDedupSweep,

    #[error("admin id {0} is not a positive user id")]
    InvalidAdminId(i64),

    #[error("metrics address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration, returning every problem found.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    for category in Category::ALL {
        let rule = config.rate_limits.rule(category);
        if rule.requests == 0 {
            errors.push(ValidationError::ZeroRequests(category));
        }
        if rule.window_secs == 0 {
            errors.push(ValidationError::ZeroWindow(category));
        }
    }

    if config.dedup.max_age_ms == 0 {
        errors.push(ValidationError::ZeroDedupMaxAge);
    }
    if config.dedup.sweep_interval_ms == 0 {
        errors.push(ValidationError::ZeroDedupSweep);
    }

    errors.extend(
        config
            .security
            .admin_ids
            .iter()
            .filter(|id| **id <= 0)
            .map(|id| ValidationError::InvalidAdminId(*id)),
    );

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
