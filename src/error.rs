//! Rejection taxonomy for the security pipeline.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::security::rate_limit::Category;
use crate::validation::ValidationError;

/// Which pipeline check rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    InvalidUserData,
    InvalidCommand,
    InvalidExpenseMessage,
    InvalidCallbackData,
    InlineQueryTooLong,
}

impl CheckKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidUserData => "invalid_user_data",
            Self::InvalidCommand => "invalid_command",
            Self::InvalidExpenseMessage => "invalid_expense_message",
            Self::InvalidCallbackData => "invalid_callback_data",
            Self::InlineQueryTooLong => "inline_query_too_long",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnauthorizedKind {
    NoUserId,
    NotAdmin,
}

impl UnauthorizedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoUserId => "no_user_id",
            Self::NotAdmin => "not_admin",
        }
    }
}

impl fmt::Display for UnauthorizedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an event was not admitted.
///
/// Every variant is terminal for the event: the handler never runs.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SecurityError {
    #[error("rate limit exceeded for {category}: {limit} allowed, retry in {reset_after_secs}s")]
    RateLimitExceeded {
        category: Category,
        reset_after_secs: u64,
        limit: u32,
    },

    #[error("{kind}: {}", join_causes(.causes))]
    ValidationFailed {
        kind: CheckKind,
        causes: Vec<ValidationError>,
    },

    #[error("unauthorized: {kind}")]
    Unauthorized { kind: UnauthorizedKind },

    #[error("security check failed")]
    Internal,
}

fn join_causes(causes: &[ValidationError]) -> String {
    causes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl SecurityError {
    pub fn validation(kind: CheckKind, cause: ValidationError) -> Self {
        Self::ValidationFailed {
            kind,
            causes: vec![cause],
        }
    }

    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::RateLimitExceeded { .. } => "rate_limit_exceeded",
            Self::ValidationFailed { kind, .. } => kind.as_str(),
            Self::Unauthorized { kind } => kind.as_str(),
            Self::Internal => "internal_error",
        }
    }

    /// Fallback English text for the denial; localized rendering belongs to the caller.
    pub fn user_message(&self) -> String {
        match self {
            Self::RateLimitExceeded {
                reset_after_secs,
                limit,
                ..
            } => format!(
                "Too many requests ({limit} allowed). Please try again in {reset_after_secs} s."
            ),
            Self::ValidationFailed { kind, .. } => match kind {
                CheckKind::InvalidUserData => "Your profile data could not be verified.",
                CheckKind::InvalidCommand => "Unknown or unavailable command.",
                CheckKind::InvalidExpenseMessage => {
                    "Could not read the expense. Use the format: 250 coffee"
                }
                CheckKind::InvalidCallbackData => "This button is no longer valid.",
                CheckKind::InlineQueryTooLong => "The search query is too long.",
            }
            .to_string(),
            Self::Unauthorized { kind } => match kind {
                UnauthorizedKind::NoUserId => "Unable to identify the sender.",
                UnauthorizedKind::NotAdmin => "This command is available to administrators only.",
            }
            .to_string(),
            Self::Internal => "Security check failed. Please try again later.".to_string(),
        }
    }
}
