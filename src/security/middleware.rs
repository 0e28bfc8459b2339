//! Per-event security pipeline.
//!
//! # Data Flow
//! ```text
//! InboundEvent
//!     → identify (no sender → Unauthorized)
//!     → classify + RateLimiter::check_limit (denied → RateLimitExceeded)
//!     → EventScreen::screen (invalid → ValidationFailed)
//!     → attach SecurityDecision to the event context
//!     → next(event)
//! ```
//!
//! # Design Decisions
//! - Fail closed: a panic in any check becomes `SecurityError::Internal`
//! - The checks are synchronous; the only await is the handler
//! - Denials are returned, never sent; the caller renders them

use serde::Serialize;
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{SecurityError, UnauthorizedKind};
use crate::event::InboundEvent;
use crate::observability::metrics;
use crate::security::access_control::AdminList;
use crate::security::rate_limit::{Category, RateLimitDecision, RateLimiter, RateLimiterStats};
use crate::security::screen::{DefaultScreen, EventScreen, ValidatedEvent};
use crate::validation::{self, ValidatorLimits};

/// What the pipeline established about an admitted event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityDecision {
    pub request_id: Uuid,
    pub category: Category,
    pub rate_limit: RateLimitDecision,
    pub validation: ValidatedEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityStats {
    pub rate_limiter: RateLimiterStats,
    pub validator_limits: ValidatorLimits,
}

pub struct SecurityMiddleware {
    limiter: Arc<RateLimiter>,
    admins: AdminList,
    screen: Arc<dyn EventScreen>,
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

impl SecurityMiddleware {
    pub fn new(limiter: Arc<RateLimiter>, admins: AdminList) -> Self {
        Self {
            limiter,
            admins,
            screen: Arc::new(DefaultScreen),
        }
    }

    /// Replace the validation stage.
    pub fn with_screen(mut self, screen: Arc<dyn EventScreen>) -> Self {
        self.screen = screen;
        self
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn admins(&self) -> &AdminList {
        &self.admins
    }

    /// Run every check and, on success, attach the decision to `event.context`.
    pub fn admit(&self, event: &mut InboundEvent) -> Result<(), SecurityError> {
        let request_id = Uuid::new_v4();
        let span = tracing::debug_span!(
            "security_pipeline",
            request_id = %request_id,
            event_id = %event.id
        );
        let _guard = span.enter();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.evaluate(request_id, event)));
        match outcome {
            Ok(Ok(decision)) => {
                event.context.security = Some(decision);
                Ok(())
            }
            Ok(Err(err)) => Err(err),
            Err(payload) => {
                tracing::error!(
                    request_id = %request_id,
                    event_id = %event.id,
                    user_id = ?event.user_id(),
                    panic = panic_message(payload.as_ref()),
                    "Security check failed"
                );
                metrics::record_internal_error();
                Err(SecurityError::Internal)
            }
        }
    }

    fn evaluate(
        &self,
        request_id: Uuid,
        event: &InboundEvent,
    ) -> Result<SecurityDecision, SecurityError> {
        let Some(user) = event.user_id() else {
            tracing::warn!(event_id = %event.id, "Event without sender identity");
            metrics::record_unauthorized(UnauthorizedKind::NoUserId.as_str(), None);
            return Err(SecurityError::Unauthorized {
                kind: UnauthorizedKind::NoUserId,
            });
        };

        let category = Category::classify(&event.kind);
        let rate_limit = self.limiter.check_limit(user, category);
        if !rate_limit.allowed {
            let limit = rate_limit
                .limit
                .unwrap_or_else(|| self.limiter.rule(category).requests);
            let reset_after_secs = rate_limit.reset_after_secs.unwrap_or(1);
            tracing::warn!(
                user_id = %user,
                category = %category,
                limit,
                reset_after_secs,
                "Rate limit exceeded"
            );
            metrics::record_rate_limited(user, category);
            return Err(SecurityError::RateLimitExceeded {
                category,
                reset_after_secs,
                limit,
            });
        }

        let validation = self.screen.screen(event).inspect_err(|err| {
            if let SecurityError::ValidationFailed { kind, causes } = err {
                tracing::warn!(
                    user_id = %user,
                    kind = %kind,
                    causes = causes.len(),
                    "Input validation failed"
                );
                metrics::record_validation_error(kind.as_str(), user);
            }
        })?;

        Ok(SecurityDecision {
            request_id,
            category,
            rate_limit,
            validation,
        })
    }

    /// Admit `event`, then hand it to `next` exactly once. `next` never runs on denial.
    pub async fn pipeline<F, Fut, T>(
        &self,
        mut event: InboundEvent,
        next: F,
    ) -> Result<T, SecurityError>
    where
        F: FnOnce(InboundEvent) -> Fut,
        Fut: Future<Output = T>,
    {
        self.admit(&mut event)?;
        Ok(next(event).await)
    }

    /// Admin allow-list guard; independent of the limiter and validators.
    pub async fn admin_only<F, Fut, T>(
        &self,
        event: InboundEvent,
        next: F,
    ) -> Result<T, SecurityError>
    where
        F: FnOnce(InboundEvent) -> Fut,
        Fut: Future<Output = T>,
    {
        let user = event.user_id();
        if !user.is_some_and(|u| self.admins.contains(u)) {
            tracing::warn!(event_id = %event.id, user_id = ?user, "Admin command refused");
            metrics::record_unauthorized(UnauthorizedKind::NotAdmin.as_str(), user);
            return Err(SecurityError::Unauthorized {
                kind: UnauthorizedKind::NotAdmin,
            });
        }
        Ok(next(event).await)
    }

    /// Hook for a future block list. Always admits.
    pub async fn check_user_block<F, Fut, T>(
        &self,
        event: InboundEvent,
        next: F,
    ) -> Result<T, SecurityError>
    where
        F: FnOnce(InboundEvent) -> Fut,
        Fut: Future<Output = T>,
    {
        Ok(next(event).await)
    }

    pub fn get_security_stats(&self) -> SecurityStats {
        SecurityStats {
            rate_limiter: self.limiter.get_stats(),
            validator_limits: validation::limits(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::RateLimitConfig;
    use crate::error::CheckKind;
    use crate::event::{EventKind, UserProfile};
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use std::sync::atomic::{AtomicUsize, Ordering};

    type CounterSample = (String, Vec<(String, String)>, u64);

    /// Run `f` against a thread-local recorder and return every counter it touched.
    fn recorded_counters(f: impl FnOnce()) -> Vec<CounterSample> {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        ::metrics::with_local_recorder(&recorder, f);

        let mut counters: Vec<CounterSample> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter_map(|(key, _, _, value)| match value {
                DebugValue::Counter(count) => {
                    let key = key.key();
                    let mut labels: Vec<_> = key
                        .labels()
                        .map(|l| (l.key().to_string(), l.value().to_string()))
                        .collect();
                    labels.sort();
                    Some((key.name().to_string(), labels, count))
                }
                _ => None,
            })
            .collect();
        counters.sort();
        counters
    }

    fn labels(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn middleware() -> SecurityMiddleware {
        let clock = Arc::new(ManualClock::default());
        let limiter = RateLimiter::new(RateLimitConfig::default(), clock);
        SecurityMiddleware::new(Arc::new(limiter), AdminList::new([1]))
    }

    struct PanickingScreen;

    impl EventScreen for PanickingScreen {
        fn screen(&self, _event: &InboundEvent) -> Result<ValidatedEvent, SecurityError> {
            panic!("screen exploded");
        }
    }

    #[tokio::test]
    async fn test_admitted_event_carries_decision() {
        let mw = middleware();
        let event = InboundEvent::message("1", UserProfile::new(7), "/start");

        let decision = mw
            .pipeline(event, |event| async move { event.context.security })
            .await
            .unwrap()
            .unwrap();

        assert_eq!(decision.category, Category::Command);
        assert!(decision.rate_limit.allowed);
        assert_eq!(decision.rate_limit.remaining, 9);
        assert_eq!(decision.validation.user.id, Some(7));
    }

    #[tokio::test]
    async fn test_missing_identity_is_unauthorized() {
        let mw = middleware();
        let calls = AtomicUsize::new(0);
        let event = InboundEvent::new("1", None, EventKind::Other);

        let err = mw
            .pipeline(event, |_| async { calls.fetch_add(1, Ordering::SeqCst) })
            .await
            .unwrap_err();

        assert_eq!(
            err,
            SecurityError::Unauthorized {
                kind: UnauthorizedKind::NoUserId
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_eleventh_command_is_limited() {
        let mw = middleware();
        for _ in 0..10 {
            let event = InboundEvent::message("1", UserProfile::new(7), "/start");
            mw.pipeline(event, |_| async {}).await.unwrap();
        }

        let event = InboundEvent::message("1", UserProfile::new(7), "/start");
        match mw.pipeline(event, |_| async {}).await.unwrap_err() {
            SecurityError::RateLimitExceeded {
                category,
                reset_after_secs,
                limit,
            } => {
                assert_eq!(category, Category::Command);
                assert_eq!(limit, 10);
                assert_eq!(reset_after_secs, 60);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_invalid_input_stops_before_handler() {
        let mw = middleware();
        let event = InboundEvent::message("1", UserProfile::new(7), "/exec rm");
        let err = mw.pipeline(event, |_| async { unreachable!() }).await.unwrap_err();
        assert!(matches!(
            err,
            SecurityError::ValidationFailed {
                kind: CheckKind::InvalidCommand,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_panicking_screen_fails_closed() {
        let mw = middleware().with_screen(Arc::new(PanickingScreen));
        let event = InboundEvent::message("1", UserProfile::new(7), "hello");
        let err = mw.pipeline(event, |_| async {}).await.unwrap_err();
        assert_eq!(err, SecurityError::Internal);
    }

    #[tokio::test]
    async fn test_admin_only() {
        let mw = middleware();

        let admin = InboundEvent::message("1", UserProfile::new(1), "/stats");
        assert_eq!(mw.admin_only(admin, |_| async { 5 }).await.unwrap(), 5);

        let stranger = InboundEvent::message("2", UserProfile::new(2), "/stats");
        let err = mw.admin_only(stranger, |_| async {}).await.unwrap_err();
        assert_eq!(
            err,
            SecurityError::Unauthorized {
                kind: UnauthorizedKind::NotAdmin
            }
        );

        // the admin guard does not count against the limiter
        assert_eq!(mw.get_security_stats().rate_limiter.total_requests, 0);
    }

    #[tokio::test]
    async fn test_check_user_block_always_admits() {
        let mw = middleware();
        let event = InboundEvent::message("1", UserProfile::new(2), "anything");
        assert!(mw.check_user_block(event, |_| async { true }).await.unwrap());
    }

    #[test]
    fn test_security_stats() {
        let mw = middleware();
        let mut event = InboundEvent::message("1", UserProfile::new(7), "hi");
        mw.admit(&mut event).unwrap();

        let stats = mw.get_security_stats();
        assert_eq!(stats.rate_limiter.total_users, 1);
        assert_eq!(stats.rate_limiter.total_requests, 1);
        assert_eq!(stats.validator_limits.max_callback_data_length, 64);
    }

    #[test]
    fn test_zero_id_is_treated_as_anonymous() {
        let mw = middleware();
        let mut event = InboundEvent::message("1", UserProfile::new(0), "/start");

        assert_eq!(
            mw.admit(&mut event).unwrap_err(),
            SecurityError::Unauthorized {
                kind: UnauthorizedKind::NoUserId
            }
        );
        assert_eq!(mw.limiter().tracked(), 0);
    }

    #[test]
    fn test_rate_limit_denial_is_counted() {
        let mw = middleware();
        let counters = recorded_counters(|| {
            for _ in 0..11 {
                let mut event = InboundEvent::message("1", UserProfile::new(7), "/start");
                let _ = mw.admit(&mut event);
            }
        });

        assert_eq!(
            counters,
            vec![(
                "rate_limit_exceeded_total".to_string(),
                labels(&[("category", "command"), ("user", "7")]),
                1
            )]
        );
    }

    #[test]
    fn test_validation_denial_is_counted() {
        let mw = middleware();
        let counters = recorded_counters(|| {
            let mut event = InboundEvent::message("1", UserProfile::new(7), "/eval");
            assert!(mw.admit(&mut event).is_err());
        });

        assert_eq!(
            counters,
            vec![(
                "validation_errors_total".to_string(),
                labels(&[("kind", "invalid_command"), ("user", "7")]),
                1
            )]
        );
    }

    #[test]
    fn test_missing_identity_is_counted() {
        let mw = middleware();
        let counters = recorded_counters(|| {
            let mut event = InboundEvent::new("1", None, EventKind::Other);
            assert!(mw.admit(&mut event).is_err());
        });

        assert_eq!(
            counters,
            vec![(
                "unauthorized_access_total".to_string(),
                labels(&[("type", "no_user_id"), ("user", "unknown")]),
                1
            )]
        );
    }

    #[test]
    fn test_internal_error_is_counted() {
        let mw = middleware().with_screen(Arc::new(PanickingScreen));
        let counters = recorded_counters(|| {
            let mut event = InboundEvent::message("1", UserProfile::new(7), "hello");
            assert_eq!(mw.admit(&mut event).unwrap_err(), SecurityError::Internal);
        });

        assert_eq!(
            counters,
            vec![("security_internal_errors_total".to_string(), vec![], 1)]
        );
    }

    #[test]
    fn test_admitted_event_counts_nothing() {
        let mw = middleware();
        let counters = recorded_counters(|| {
            let mut event = InboundEvent::message("1", UserProfile::new(7), "hello");
            mw.admit(&mut event).unwrap();
        });
        assert!(counters.is_empty());
    }
}
