//! Shape-dependent validation stage of the pipeline.

use serde::Serialize;

use crate::error::{CheckKind, SecurityError};
use crate::event::{EventKind, InboundEvent};
use crate::validation::{
    sanitize_text, validate_callback_data, validate_command, validate_expense_message,
    validate_inline_query, validate_user_data, ExpenseEntry, SanitizedUser,
};

/// The validated payload, by event shape.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidatedInput {
    Command {
        command: String,
        args: Option<String>,
    },
    Expense(ExpenseEntry),
    Text {
        sanitized: String,
    },
    Callback {
        data: String,
    },
    InlineQuery {
        query: String,
    },
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedEvent {
    pub user: SanitizedUser,
    pub input: ValidatedInput,
}

/// Validation stage. Implementations must not block.
pub trait EventScreen: Send + Sync {
    fn screen(&self, event: &InboundEvent) -> Result<ValidatedEvent, SecurityError>;
}

/// Sender profile first, then the payload.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultScreen;

fn looks_like_expense(text: &str) -> bool {
    text.trim_start()
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit())
}

fn screen_input(kind: &EventKind) -> Result<ValidatedInput, SecurityError> {
    if let Some(command) = kind.command() {
        let command = validate_command(command)
            .map_err(|e| SecurityError::validation(CheckKind::InvalidCommand, e))?;
        return Ok(ValidatedInput::Command {
            command,
            args: kind.command_args().map(sanitize_text),
        });
    }

    match kind {
        EventKind::Message { text } if looks_like_expense(text) => validate_expense_message(text)
            .map(ValidatedInput::Expense)
            .map_err(|e| SecurityError::validation(CheckKind::InvalidExpenseMessage, e)),
        EventKind::Message { text } => Ok(ValidatedInput::Text {
            sanitized: sanitize_text(text),
        }),
        EventKind::Callback { data } => validate_callback_data(data)
            .map(|data| ValidatedInput::Callback { data })
            .map_err(|e| SecurityError::validation(CheckKind::InvalidCallbackData, e)),
        EventKind::InlineQuery { query } => validate_inline_query(query)
            .map(|query| ValidatedInput::InlineQuery { query })
            .map_err(|e| SecurityError::validation(CheckKind::InlineQueryTooLong, e)),
        EventKind::Other => Ok(ValidatedInput::None),
    }
}

impl EventScreen for DefaultScreen {
    fn screen(&self, event: &InboundEvent) -> Result<ValidatedEvent, SecurityError> {
        let user = match &event.from {
            Some(profile) => validate_user_data(profile).into_result().map_err(|causes| {
                SecurityError::ValidationFailed {
                    kind: CheckKind::InvalidUserData,
                    causes,
                }
            })?,
            None => SanitizedUser::default(),
        };

        Ok(ValidatedEvent {
            user,
            input: screen_input(&event.kind)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::UserProfile;
    use crate::validation::ErrorKind;

    fn screen(event: InboundEvent) -> Result<ValidatedEvent, SecurityError> {
        DefaultScreen.screen(&event)
    }

    fn text(body: &str) -> InboundEvent {
        InboundEvent::message("1", UserProfile::new(7), body)
    }

    fn check_kind(err: SecurityError) -> CheckKind {
        match err {
            SecurityError::ValidationFailed { kind, .. } => kind,
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_command_with_args() {
        let validated = screen(text("/add@bot  250   coffee")).unwrap();
        assert_eq!(
            validated.input,
            ValidatedInput::Command {
                command: "/add".into(),
                args: Some("250 coffee".into()),
            }
        );
        assert_eq!(validated.user.id, Some(7));
    }

    #[test]
    fn test_forbidden_command() {
        let err = screen(text("/eval 1+1")).unwrap_err();
        assert_eq!(check_kind(err), CheckKind::InvalidCommand);
    }

    #[test]
    fn test_expense_and_plain_text() {
        let validated = screen(text("200 продукты")).unwrap();
        match validated.input {
            ValidatedInput::Expense(entry) => {
                assert_eq!(entry.amount, 200.0);
                assert_eq!(entry.description, "продукты");
            }
            other => panic!("expected expense, got {other:?}"),
        }

        let err = screen(text("1000000 продукты")).unwrap_err();
        assert_eq!(check_kind(err), CheckKind::InvalidExpenseMessage);

        let validated = screen(text("  hello   <world> ")).unwrap();
        assert_eq!(
            validated.input,
            ValidatedInput::Text {
                sanitized: "hello world".into()
            }
        );
    }

    #[test]
    fn test_callback_and_inline() {
        let result = screen(InboundEvent::callback("cb", UserProfile::new(7), "a".repeat(65)));
        let err = result.unwrap_err();
        match err {
            SecurityError::ValidationFailed { kind, causes } => {
                assert_eq!(kind, CheckKind::InvalidCallbackData);
                assert_eq!(causes[0].kind, ErrorKind::CallbackDataTooLong);
            }
            other => panic!("unexpected {other:?}"),
        }

        let result = screen(InboundEvent::inline_query("iq", UserProfile::new(7), "x".repeat(300)));
        let err = result.unwrap_err();
        assert_eq!(check_kind(err), CheckKind::InlineQueryTooLong);
    }

    #[test]
    fn test_bad_profile_is_checked_first() {
        let mut profile = UserProfile::new(7);
        profile.username = Some("ab".into());
        let err = screen(InboundEvent::message("1", profile, "/eval")).unwrap_err();
        assert_eq!(check_kind(err), CheckKind::InvalidUserData);
    }
}
