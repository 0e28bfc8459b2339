//! Sender profile fields.

use serde::Serialize;

use super::patterns::{person_name, username};
use super::sanitize::sanitize_text;
use super::{ErrorKind, ValidationError, MAX_NAME_LENGTH, MAX_USER_ID};
use crate::event::UserProfile;

/// The fields of a profile that passed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SanitizedUser {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Every field error found plus the accepted fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserValidation {
    pub errors: Vec<ValidationError>,
    pub sanitized: SanitizedUser,
}

impl UserValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<SanitizedUser, Vec<ValidationError>> {
        if self.errors.is_empty() {
            Ok(self.sanitized)
        } else {
            Err(self.errors)
        }
    }
}

fn check_name(value: &str, kind: ErrorKind) -> Result<String, ValidationError> {
    let length = value.chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(ValidationError::with_detail(
            kind,
            format!("{length} > {MAX_NAME_LENGTH}"),
        ));
    }
    if !person_name().is_match(value) {
        return Err(kind.into());
    }
    Ok(sanitize_text(value))
}

/// Validate every field; does not stop at the first error.
pub fn validate_user_data(profile: &UserProfile) -> UserValidation {
    let mut report = UserValidation::default();

    if (1..=MAX_USER_ID).contains(&profile.id) {
        report.sanitized.id = Some(profile.id);
    } else {
        report.errors.push(ValidationError::with_detail(
            ErrorKind::InvalidUserId,
            profile.id.to_string(),
        ));
    }

    if let Some(name) = &profile.username {
        if username().is_match(name) {
            report.sanitized.username = Some(name.clone());
        } else {
            report.errors.push(ErrorKind::InvalidUsername.into());
        }
    }

    if let Some(first) = &profile.first_name {
        match check_name(first, ErrorKind::InvalidFirstName) {
            Ok(clean) => report.sanitized.first_name = Some(clean),
            Err(e) => report.errors.push(e),
        }
    }

    if let Some(last) = &profile.last_name {
        match check_name(last, ErrorKind::InvalidLastName) {
            Ok(clean) => report.sanitized.last_name = Some(clean),
            Err(e) => report.errors.push(e),
        }
    }

    report
}
