//! Inbound event model shared by the gate, the pipeline and the handlers.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::security::middleware::SecurityDecision;

/// Caller identity as asserted by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<UserId> for i64 {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sender profile fields carried on every update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl UserProfile {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn user_id(&self) -> UserId {
        UserId(self.id)
    }
}

/// Shape of an inbound update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Text message; slash-commands included.
    Message { text: String },
    /// Inline keyboard button press.
    Callback { data: String },
    /// Inline-mode query.
    InlineQuery { query: String },
    /// Anything the guard has no specific rules for.
    Other,
}

impl EventKind {
    pub fn is_callback(&self) -> bool {
        matches!(self, Self::Callback { .. })
    }

    /// Command token of a text message: the first word, minus any `@botname` suffix.
    pub fn command(&self) -> Option<&str> {
        match self {
            Self::Message { text } if text.starts_with('/') => {
                let token = text.split_whitespace().next().unwrap_or(text.as_str());
                Some(token.split_once('@').map_or(token, |(command, _)| command))
            }
            _ => None,
        }
    }

    /// Text following the command token, if any.
    pub fn command_args(&self) -> Option<&str> {
        match self {
            Self::Message { text } if text.starts_with('/') => text
                .split_once(char::is_whitespace)
                .map(|(_, rest)| rest.trim())
                .filter(|rest| !rest.is_empty()),
            _ => None,
        }
    }
}

/// Per-event context; the pipeline writes its decision here.
#[derive(Debug, Clone, Default)]
pub struct EventContext {
    pub security: Option<SecurityDecision>,
}

/// A single update delivered by the transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Transport-assigned id; for callbacks this is the callback query id.
    pub id: String,
    #[serde(default)]
    pub from: Option<UserProfile>,
    #[serde(flatten)]
    pub kind: EventKind,
    #[serde(skip)]
    pub context: EventContext,
}

impl InboundEvent {
    pub fn new(id: impl Into<String>, from: Option<UserProfile>, kind: EventKind) -> Self {
        Self {
            id: id.into(),
            from,
            kind,
            context: EventContext::default(),
        }
    }

    pub fn message(id: impl Into<String>, from: UserProfile, text: impl Into<String>) -> Self {
        Self::new(id, Some(from), EventKind::Message { text: text.into() })
    }

    pub fn callback(id: impl Into<String>, from: UserProfile, data: impl Into<String>) -> Self {
        Self::new(id, Some(from), EventKind::Callback { data: data.into() })
    }

    pub fn inline_query(
        id: impl Into<String>,
        from: UserProfile,
        query: impl Into<String>,
    ) -> Self {
        Self::new(id, Some(from), EventKind::InlineQuery { query: query.into() })
    }

    /// Sender identity; a zero or negative id counts as no identity.
    pub fn user_id(&self) -> Option<UserId> {
        self.from
            .as_ref()
            .filter(|profile| profile.id > 0)
            .map(UserProfile::user_id)
    }
}
