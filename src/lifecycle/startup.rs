//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Build the limiter, deduplicator, middleware and gate in dependency order
//! - Start and stop the background sweeps
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Components are explicit `Arc`-shared instances, never globals
//! - Sweeps start only when asked, so tests can drive expiry by hand

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::validation::validate_config;
use crate::config::{ConfigError, GuardConfig};
use crate::lifecycle::sweeper::SweepError;
use crate::security::{AdminList, CallbackDeduplicator, EventGate, RateLimiter, SecurityMiddleware};

/// Every admission-control component, wired together.
pub struct Guard {
    config: GuardConfig,
    limiter: Arc<RateLimiter>,
    dedup: Arc<CallbackDeduplicator>,
    middleware: Arc<SecurityMiddleware>,
    gate: EventGate,
}

impl Guard {
    pub fn new(config: GuardConfig) -> Result<Self, ConfigError> {
        Self::with_clock(config, SystemClock::shared())
    }

    /// Build with an injected clock. Reads the admin environment variable once.
    pub fn with_clock(config: GuardConfig, clock: Arc<dyn Clock>) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let admins = AdminList::from_config(&config.security)?;
        let limiter = Arc::new(RateLimiter::new(config.rate_limits.clone(), Arc::clone(&clock)));
        let dedup = Arc::new(CallbackDeduplicator::new(&config.dedup, clock));
        let middleware = Arc::new(SecurityMiddleware::new(Arc::clone(&limiter), admins));
        let gate = EventGate::new(Arc::clone(&dedup), Arc::clone(&middleware));

        tracing::info!(
            admins = middleware.admins().len(),
            dedup_max_age_ms = config.dedup.max_age_ms,
            "Guard initialized"
        );

        Ok(Self {
            config,
            limiter,
            dedup,
            middleware,
            gate,
        })
    }

    /// Start both background sweeps on the current runtime.
    pub fn start_sweeps(&self) -> Result<(), SweepError> {
        self.limiter.start_sweep()?;
        self.dedup.start_sweep()?;
        Ok(())
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn dedup(&self) -> &Arc<CallbackDeduplicator> {
        &self.dedup
    }

    pub fn middleware(&self) -> &Arc<SecurityMiddleware> {
        &self.middleware
    }

    pub fn gate(&self) -> &EventGate {
        &self.gate
    }

    /// Stop the sweeps and drop all dedup state.
    pub fn shutdown(&self) {
        self.limiter.stop_sweep();
        self.dedup.destroy();
        tracing::info!("Guard stopped");
    }
}
