//! Session records and token kinds.

use bazaar_core::{SessionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A user session as stored in the key-value store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    /// Free-form values attached by request handlers.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, Value>,
}

impl Session {
    /// Creates a fresh session for a user.
    #[must_use]
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::generate(),
            user_id,
            email: email.into(),
            created_at: now,
            last_activity: now,
            data: HashMap::new(),
        }
    }

    /// Marks the session as used right now.
    pub fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}

/// Partial update of a session. `None` leaves the field untouched; `data`
/// entries are merged key by key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUpdate {
    pub user_id: Option<UserId>,
    pub email: Option<String>,
    pub data: Option<HashMap<String, Value>>,
}

impl SessionUpdate {
    /// Update that merges a single data entry.
    #[must_use]
    pub fn with_data(key: impl Into<String>, value: Value) -> Self {
        Self {
            data: Some(HashMap::from([(key.into(), value)])),
            ..Default::default()
        }
    }

    pub(crate) fn apply_to(self, session: &mut Session) {
        if let Some(user_id) = self.user_id {
            session.user_id = user_id;
        }
        if let Some(email) = self.email {
            session.email = email;
        }
        if let Some(data) = self.data {
            session.data.extend(data);
        }
    }
}

/// Kinds of single-use token. Each kind owns a key prefix in the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    PasswordReset,
}

impl TokenKind {
    /// Store key prefix for tokens of this kind.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::PasswordReset => "password_reset",
        }
    }
}
