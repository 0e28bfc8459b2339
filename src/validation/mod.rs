//! Input validation and sanitization.
//!
//! # Data Flow
//! ```text
//! untrusted text
//!     → patterns.rs (forbidden content, charsets)
//!     → expense.rs / input.rs / user.rs (accept or reject)
//!     → Result<T, ValidationError>
//!
//! sanitize.rs is a separate transform and never rejects.
//! ```
//!
//! # Design Decisions
//! - Every validator is a pure function; no state, no I/O
//! - Expected bad input is an `Err`, never a panic
//! - Callers compose validate + sanitize explicitly

pub mod expense;
pub mod input;
pub mod patterns;
pub mod sanitize;
pub mod user;

use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub use expense::{parse_edit_expense, parse_expense, validate_expense_message};
pub use expense::{EditedExpense, ExpenseEntry, ParsedExpense};
pub use input::{validate_callback_data, validate_command, validate_currency, validate_inline_query};
pub use sanitize::sanitize_text;
pub use user::{validate_user_data, SanitizedUser, UserValidation};

pub const MAX_EXPENSE_MESSAGE_LENGTH: usize = 200;
pub const MIN_AMOUNT: f64 = 0.01;
pub const MAX_AMOUNT: f64 = 999_999.0;
pub const MIN_DESCRIPTION_LENGTH: usize = 1;
pub const MAX_DESCRIPTION_LENGTH: usize = 100;
pub const MAX_CALLBACK_DATA_LENGTH: usize = 64;
pub const MAX_INLINE_QUERY_LENGTH: usize = 256;
pub const MIN_USERNAME_LENGTH: usize = 5;
pub const MAX_USERNAME_LENGTH: usize = 32;
pub const MAX_NAME_LENGTH: usize = 64;
pub const MAX_USER_ID: i64 = 999_999_999_999;
pub const MAX_TEXT_LENGTH: usize = 1000;

/// Why a piece of input was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    TooLong,
    ForbiddenContent,
    InvalidFormat,
    AmountTooSmall,
    AmountTooLarge,
    InvalidDescriptionFormat,
    DescriptionTooShort,
    DescriptionTooLong,
    NoDescription,
    Amount,
    Empty,
    InvalidCommandFormat,
    ForbiddenCommand,
    CallbackDataTooLong,
    InvalidCallbackFormat,
    ForbiddenCallbackContent,
    InlineQueryTooLong,
    InvalidUserId,
    InvalidUsername,
    InvalidFirstName,
    InvalidLastName,
    InvalidCurrencyFormat,
    UnsupportedCurrency,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::TooLong => "too_long",
            Self::ForbiddenContent => "forbidden_content",
            Self::InvalidFormat => "invalid_format",
            Self::AmountTooSmall => "amount_too_small",
            Self::AmountTooLarge => "amount_too_large",
            Self::InvalidDescriptionFormat => "invalid_description_format",
            Self::DescriptionTooShort => "description_too_short",
            Self::DescriptionTooLong => "description_too_long",
            Self::NoDescription => "no_description",
            Self::Amount => "amount",
            Self::Empty => "empty",
            Self::InvalidCommandFormat => "invalid_command_format",
            Self::ForbiddenCommand => "forbidden_command",
            Self::CallbackDataTooLong => "callback_data_too_long",
            Self::InvalidCallbackFormat => "invalid_callback_format",
            Self::ForbiddenCallbackContent => "forbidden_callback_content",
            Self::InlineQueryTooLong => "inline_query_too_long",
            Self::InvalidUserId => "invalid_user_id",
            Self::InvalidUsername => "invalid_username",
            Self::InvalidFirstName => "invalid_first_name",
            Self::InvalidLastName => "invalid_last_name",
            Self::InvalidCurrencyFormat => "invalid_currency_format",
            Self::UnsupportedCurrency => "unsupported_currency",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected input: the kind plus optional human-readable detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{kind}{}", format_detail(.detail))]
pub struct ValidationError {
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

fn format_detail(detail: &Option<String>) -> String {
    detail.as_ref().map(|d| format!(": {d}")).unwrap_or_default()
}

impl ValidationError {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, detail: None }
    }

    pub fn with_detail(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: Some(detail.into()),
        }
    }
}

impl From<ErrorKind> for ValidationError {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Outcome of a validator: the accepted (and sanitized) value, or why it was rejected.
pub type ValidationOutcome<T> = Result<T, ValidationError>;

/// Snapshot of every bound the validators enforce.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatorLimits {
    pub max_expense_message_length: usize,
    pub min_amount: f64,
    pub max_amount: f64,
    pub min_description_length: usize,
    pub max_description_length: usize,
    pub max_callback_data_length: usize,
    pub max_inline_query_length: usize,
    pub min_username_length: usize,
    pub max_username_length: usize,
    pub max_name_length: usize,
    pub max_user_id: i64,
    pub max_text_length: usize,
    pub supported_currencies: &'static [&'static str],
}

pub fn limits() -> ValidatorLimits {
    ValidatorLimits {
        max_expense_message_length: MAX_EXPENSE_MESSAGE_LENGTH,
        min_amount: MIN_AMOUNT,
        max_amount: MAX_AMOUNT,
        min_description_length: MIN_DESCRIPTION_LENGTH,
        max_description_length: MAX_DESCRIPTION_LENGTH,
        max_callback_data_length: MAX_CALLBACK_DATA_LENGTH,
        max_inline_query_length: MAX_INLINE_QUERY_LENGTH,
        min_username_length: MIN_USERNAME_LENGTH,
        max_username_length: MAX_USERNAME_LENGTH,
        max_name_length: MAX_NAME_LENGTH,
        max_user_id: MAX_USER_ID,
        max_text_length: MAX_TEXT_LENGTH,
        supported_currencies: input::SUPPORTED_CURRENCIES,
    }
}

/// Amount parse shared by the expense parsers; accepts `,` as the decimal separator.
pub(crate) fn parse_amount(raw: &str) -> Option<f64> {
    raw.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite())
}
