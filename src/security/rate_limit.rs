//! Per-user, per-category fixed-window rate limiting.
//!
//! Each `(user, category)` pair owns one window. A request inside an active
//! window increments its count; the first request after the window elapsed
//! resets it to one. Windows are not sliding, so a burst straddling a window
//! boundary can see up to twice the limit.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crate::clock::Clock;
use crate::config::{RateLimitConfig, RuleConfig};
use crate::event::{EventKind, UserId};
use crate::lifecycle::sweeper::{SweepError, SweepTask};

/// Independent rate-limit buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Global,
    Command,
    Message,
    Callback,
    Inline,
    Export,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Global,
        Category::Command,
        Category::Message,
        Category::Callback,
        Category::Inline,
        Category::Export,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Command => "command",
            Self::Message => "message",
            Self::Callback => "callback",
            Self::Inline => "inline",
            Self::Export => "export",
        }
    }

    /// Bucket an inbound event. `/export` is a command but gets its own bucket.
    pub fn classify(kind: &EventKind) -> Self {
        match kind {
            EventKind::Message { .. } => match kind.command() {
                Some(command) if command.eq_ignore_ascii_case("/export") => Self::Export,
                Some(_) => Self::Command,
                None => Self::Message,
            },
            EventKind::Callback { .. } => Self::Callback,
            EventKind::InlineQuery { .. } => Self::Inline,
            EventKind::Other => Self::Global,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counter for one `(user, category)` pair.
#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    window_start: Instant,
    window: Duration,
}

impl RateWindow {
    fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.window_start) > self.window
    }

    /// Whole seconds until the window closes, rounded up, at least 1.
    fn reset_after_secs(&self, now: Instant) -> u64 {
        let left = self
            .window
            .saturating_sub(now.saturating_duration_since(self.window_start));
        (left.as_millis() as u64).div_ceil(1000).max(1)
    }
}

/// Outcome of [`RateLimiter::check_limit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    /// Set only on denial.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_after_secs: Option<u64>,
    /// Set only on denial.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Read-only view of a pair's usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LimitInfo {
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    /// Zero when no window is active.
    pub reset_after_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryStats {
    pub users: usize,
    pub requests: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RateLimiterStats {
    pub total_users: usize,
    pub total_requests: u64,
    pub categories: BTreeMap<Category, CategoryStats>,
}

type WindowMap = DashMap<(UserId, Category), RateWindow>;

fn purge_expired(windows: &WindowMap, now: Instant) -> usize {
    let mut removed = 0;
    windows.retain(|_, window| {
        let keep = !window.is_expired(now);
        if !keep {
            removed += 1;
        }
        keep
    });
    removed
}

/// Fixed-window limiter shared by every inbound event.
#[derive(Debug)]
pub struct RateLimiter {
    windows: Arc<WindowMap>,
    config: RateLimitConfig,
    clock: Arc<dyn Clock>,
    sweeper: Mutex<Option<SweepTask>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            config,
            clock,
            sweeper: Mutex::new(None),
        }
    }

    pub fn rule(&self, category: Category) -> RuleConfig {
        self.config.rule(category)
    }

    /// Count one request against `(user, category)` and decide whether it may proceed.
    ///
    /// The read-modify-write happens under the entry's shard lock, so concurrent
    /// callers on the same key never both take the last slot.
    pub fn check_limit(&self, user: UserId, category: Category) -> RateLimitDecision {
        let rule = self.config.rule(category);
        let now = self.clock.now();

        let mut entry = self
            .windows
            .entry((user, category))
            .or_insert_with(|| RateWindow {
                count: 0,
                window_start: now,
                window: rule.window(),
            });
        let window = entry.value_mut();

        if window.count == 0 || window.is_expired(now) {
            *window = RateWindow {
                count: 1,
                window_start: now,
                window: rule.window(),
            };
            return RateLimitDecision {
                allowed: true,
                remaining: rule.requests.saturating_sub(1),
                reset_after_secs: None,
                limit: None,
            };
        }

        if window.count < rule.requests {
            window.count += 1;
            return RateLimitDecision {
                allowed: true,
                remaining: rule.requests - window.count,
                reset_after_secs: None,
                limit: None,
            };
        }

        RateLimitDecision {
            allowed: false,
            remaining: 0,
            reset_after_secs: Some(window.reset_after_secs(now)),
            limit: Some(rule.requests),
        }
    }

    /// Current usage without counting a request.
    pub fn get_limit_info(&self, user: UserId, category: Category) -> LimitInfo {
        let rule = self.config.rule(category);
        let now = self.clock.now();

        match self.windows.get(&(user, category)) {
            Some(window) if !window.is_expired(now) => LimitInfo {
                used: window.count,
                limit: rule.requests,
                remaining: rule.requests.saturating_sub(window.count),
                reset_after_secs: window.reset_after_secs(now),
            },
            _ => LimitInfo {
                used: 0,
                limit: rule.requests,
                remaining: rule.requests,
                reset_after_secs: 0,
            },
        }
    }

    /// Drop every window of one user. Returns how many were removed.
    pub fn reset_user_limits(&self, user: UserId) -> usize {
        let removed = Category::ALL
            .iter()
            .filter(|category| self.windows.remove(&(user, **category)).is_some())
            .count();
        tracing::info!(user_id = %user, removed, "Rate limits reset");
        removed
    }

    /// Remove expired windows; active ones are untouched.
    pub fn cleanup(&self) -> usize {
        purge_expired(&self.windows, self.clock.now())
    }

    /// Aggregate over live windows.
    pub fn get_stats(&self) -> RateLimiterStats {
        let now = self.clock.now();
        let mut users = std::collections::HashSet::new();
        let mut stats = RateLimiterStats::default();

        for entry in self.windows.iter() {
            let ((user, category), window) = entry.pair();
            if window.is_expired(now) {
                continue;
            }
            users.insert(*user);
            stats.total_requests += u64::from(window.count);
            let per_category = stats.categories.entry(*category).or_default();
            per_category.users += 1;
            per_category.requests += u64::from(window.count);
        }

        stats.total_users = users.len();
        stats
    }

    /// Number of windows currently held, expired or not.
    pub fn tracked(&self) -> usize {
        self.windows.len()
    }

    /// Start the periodic cleanup. No-op if already running or disabled in config.
    pub fn start_sweep(&self) -> Result<(), SweepError> {
        if self.config.sweep_interval_secs == 0 {
            return Ok(());
        }
        let mut slot = self.sweeper.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return Ok(());
        }

        let windows = Arc::clone(&self.windows);
        let clock = Arc::clone(&self.clock);
        let task = SweepTask::spawn(
            "rate_limiter",
            Duration::from_secs(self.config.sweep_interval_secs),
            move || purge_expired(&windows, clock.now()),
        )?;
        *slot = Some(task);
        Ok(())
    }

    pub fn stop_sweep(&self) {
        let task = self
            .sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.stop();
        }
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
