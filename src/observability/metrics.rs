//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rate_limit_exceeded_total` (counter): denials by user, category
//! - `validation_errors_total` (counter): rejected input by kind, user
//! - `unauthorized_access_total` (counter): missing identity / admin check failures by type, user
//! - `duplicate_callbacks_total` (counter): redelivered callbacks dropped at the gate
//! - `security_internal_errors_total` (counter): pipeline failures converted to denials
//!
//! # Design Decisions
//! - Fire-and-forget: with no recorder installed every call is a no-op
//! - Prometheus exposition is optional and off by default

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::event::UserId;
use crate::security::rate_limit::Category;

/// Install the Prometheus recorder with an HTTP listener. Must run inside a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => {
            tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter");
        }
    }
}

pub fn record_rate_limited(user: UserId, category: Category) {
    counter!(
        "rate_limit_exceeded_total",
        "user" => user.to_string(),
        "category" => category.as_str()
    )
    .increment(1);
}

pub fn record_validation_error(kind: &'static str, user: UserId) {
    counter!(
        "validation_errors_total",
        "kind" => kind,
        "user" => user.to_string()
    )
    .increment(1);
}

/// `user` is `"unknown"` when the event carried no identity.
pub fn record_unauthorized(kind: &'static str, user: Option<UserId>) {
    let user = user.map_or_else(|| "unknown".to_string(), |u| u.to_string());
    counter!("unauthorized_access_total", "type" => kind, "user" => user).increment(1);
}

pub fn record_duplicate_callback() {
    counter!("duplicate_callbacks_total").increment(1);
}

pub fn record_internal_error() {
    counter!("security_internal_errors_total").increment(1);
}
