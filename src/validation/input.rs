//! Commands, callback payloads, inline queries and currency codes.

use super::patterns::{callback_charset, command, contains_forbidden, currency_code};
use super::sanitize::sanitize_text;
use super::{
    ErrorKind, ValidationError, ValidationOutcome, MAX_CALLBACK_DATA_LENGTH,
    MAX_INLINE_QUERY_LENGTH,
};

/// Commands that never reach a handler, whatever the caller's role.
pub const FORBIDDEN_COMMANDS: &[&str] = &["/eval", "/exec", "/system", "/admin"];

pub const SUPPORTED_CURRENCIES: &[&str] = &[
    "RUB", "USD", "EUR", "GBP", "CNY", "JPY", "KZT", "UAH", "BYN", "TRY", "AED", "GEL", "AMD",
    "UZS", "KGS", "THB", "INR",
];

/// A bare slash-command such as `/start`.
///
/// The blocklist is compared case-insensitively so `/EVAL` is caught too.
pub fn validate_command(text: &str) -> ValidationOutcome<String> {
    if !command().is_match(text) {
        return Err(ValidationError::with_detail(
            ErrorKind::InvalidCommandFormat,
            text.chars().take(32).collect::<String>(),
        ));
    }

    let lowered = text.to_ascii_lowercase();
    if FORBIDDEN_COMMANDS.contains(&lowered.as_str()) {
        return Err(ValidationError::with_detail(ErrorKind::ForbiddenCommand, text));
    }

    Ok(text.to_string())
}

/// Payload attached to an inline keyboard button.
pub fn validate_callback_data(data: &str) -> ValidationOutcome<String> {
    let length = data.chars().count();
    if length > MAX_CALLBACK_DATA_LENGTH {
        return Err(ValidationError::with_detail(
            ErrorKind::CallbackDataTooLong,
            format!("{length} > {MAX_CALLBACK_DATA_LENGTH}"),
        ));
    }
    if !callback_charset().is_match(data) {
        return Err(ErrorKind::InvalidCallbackFormat.into());
    }
    if contains_forbidden(data) {
        return Err(ErrorKind::ForbiddenCallbackContent.into());
    }
    Ok(data.to_string())
}

/// Inline-mode query; an empty query is valid. Returns the sanitized query.
pub fn validate_inline_query(query: &str) -> ValidationOutcome<String> {
    let length = query.chars().count();
    if length > MAX_INLINE_QUERY_LENGTH {
        return Err(ValidationError::with_detail(
            ErrorKind::InlineQueryTooLong,
            format!("{length} > {MAX_INLINE_QUERY_LENGTH}"),
        ));
    }
    Ok(sanitize_text(query))
}

/// ISO-4217 style code from the supported set.
pub fn validate_currency(code: &str) -> ValidationOutcome<String> {
    if !currency_code().is_match(code) {
        return Err(ErrorKind::InvalidCurrencyFormat.into());
    }
    if !SUPPORTED_CURRENCIES.contains(&code) {
        return Err(ValidationError::with_detail(ErrorKind::UnsupportedCurrency, code));
    }
    Ok(code.to_string())
}
