//! Free-text expense entries: `"<amount> <description>"`.
//!
//! Three entry points with different strictness:
//! - [`validate_expense_message`]: strict, used by the security pipeline
//! - [`parse_expense`]: first-time entry, caller-supplied description limit
//! - [`parse_edit_expense`]: edits, where either half may be omitted

use serde::Serialize;

use super::patterns::{contains_forbidden, description_charset, expense_loose, expense_strict};
use super::sanitize::sanitize_text;
use super::{
    parse_amount, ErrorKind, ValidationError, ValidationOutcome, MAX_AMOUNT,
    MAX_DESCRIPTION_LENGTH, MAX_EXPENSE_MESSAGE_LENGTH, MIN_AMOUNT, MIN_DESCRIPTION_LENGTH,
};

/// A fully validated expense message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExpenseEntry {
    pub amount: f64,
    pub description: String,
    pub sanitized_description: String,
}

/// Result of [`parse_expense`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedExpense {
    pub amount: f64,
    pub description: String,
}

/// Result of [`parse_edit_expense`]; at least one half is present.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditedExpense {
    pub amount: Option<f64>,
    pub description: Option<String>,
}

/// Strict validation of an expense message.
pub fn validate_expense_message(text: &str) -> ValidationOutcome<ExpenseEntry> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ErrorKind::InvalidInput.into());
    }

    let length = text.chars().count();
    if length > MAX_EXPENSE_MESSAGE_LENGTH {
        return Err(ValidationError::with_detail(
            ErrorKind::TooLong,
            format!("{length} > {MAX_EXPENSE_MESSAGE_LENGTH}"),
        ));
    }

    if contains_forbidden(text) {
        return Err(ErrorKind::ForbiddenContent.into());
    }

    let caps = expense_strict()
        .captures(text)
        .ok_or_else(|| ValidationError::from(ErrorKind::InvalidFormat))?;

    let amount = parse_amount(&caps[1])
        .ok_or_else(|| ValidationError::with_detail(ErrorKind::InvalidFormat, &caps[1]))?;
    if amount < MIN_AMOUNT {
        return Err(ValidationError::with_detail(
            ErrorKind::AmountTooSmall,
            format!("minimum is {MIN_AMOUNT}"),
        ));
    }
    if amount > MAX_AMOUNT {
        return Err(ValidationError::with_detail(
            ErrorKind::AmountTooLarge,
            format!("maximum is {MAX_AMOUNT}"),
        ));
    }

    let description = caps[2].trim();
    let description_length = description.chars().count();
    if description_length < MIN_DESCRIPTION_LENGTH {
        return Err(ErrorKind::DescriptionTooShort.into());
    }
    if description_length > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::with_detail(
            ErrorKind::DescriptionTooLong,
            format!("{description_length} > {MAX_DESCRIPTION_LENGTH}"),
        ));
    }
    if !description_charset().is_match(description) {
        return Err(ErrorKind::InvalidDescriptionFormat.into());
    }

    Ok(ExpenseEntry {
        amount,
        description: description.to_string(),
        sanitized_description: sanitize_text(description),
    })
}

fn check_loose_amount(raw: &str) -> ValidationOutcome<f64> {
    match parse_amount(raw) {
        Some(amount) if amount > 0.0 && amount <= MAX_AMOUNT => Ok(amount),
        _ => Err(ValidationError::with_detail(ErrorKind::Amount, raw)),
    }
}

fn check_description_length(description: &str, max: usize) -> ValidationOutcome<()> {
    let length = description.chars().count();
    if length > max {
        return Err(ValidationError::with_detail(
            ErrorKind::TooLong,
            format!("{length} > {max}"),
        ));
    }
    Ok(())
}

/// Looser parse used for first-time expense entry.
pub fn parse_expense(
    text: &str,
    max_description_length: usize,
) -> ValidationOutcome<ParsedExpense> {
    let text = text.trim();
    if contains_forbidden(text) {
        return Err(ErrorKind::ForbiddenContent.into());
    }

    let caps = expense_loose()
        .captures(text)
        .ok_or_else(|| ValidationError::from(ErrorKind::InvalidFormat))?;

    let amount = check_loose_amount(&caps[1])?;

    let description = caps.get(2).map_or("", |m| m.as_str().trim());
    if description.is_empty() {
        return Err(ErrorKind::NoDescription.into());
    }
    check_description_length(description, max_description_length)?;

    Ok(ParsedExpense {
        amount,
        description: description.to_string(),
    })
}

/// Parse an edit: amount only, description only, or both.
pub fn parse_edit_expense(
    text: &str,
    max_description_length: usize,
) -> ValidationOutcome<EditedExpense> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ErrorKind::Empty.into());
    }
    if contains_forbidden(text) {
        return Err(ErrorKind::ForbiddenContent.into());
    }

    let (amount, description) = match expense_loose().captures(text) {
        Some(caps) => {
            let amount = check_loose_amount(&caps[1])?;
            let description = caps
                .get(2)
                .map(|m| m.as_str().trim())
                .filter(|d| !d.is_empty());
            (Some(amount), description)
        }
        None => (None, Some(text)),
    };

    if let Some(description) = description {
        check_description_length(description, max_description_length)?;
    }

    Ok(EditedExpense {
        amount,
        description: description.map(str::to_string),
    })
}
