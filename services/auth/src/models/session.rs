//! Session record model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The one user currently signed in on this profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Epoch milliseconds at login or sign-up
    #[serde(rename = "loginTime", alias = "signupTime")]
    pub created_at: i64,
}

impl SessionRecord {
    /// Build a record, deriving the name from the email when none is given
    pub fn new(email: &str, name: Option<&str>, created_at: DateTime<Utc>) -> Self {
        let name = name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| local_part(email).to_string());

        Self {
            email: email.trim().to_string(),
            name: Some(name),
            created_at: created_at.timestamp_millis(),
        }
    }

    /// Name to show for this user, falling back to the email local-part
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => local_part(&self.email),
        }
    }

    /// Upper-cased first letter of the display name
    pub fn initial(&self) -> Option<char> {
        self.display_name()
            .chars()
            .next()
            .and_then(|c| c.to_uppercase().next())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.created_at)
    }
}

/// The part of an email address before `@`, or the whole string without one
pub fn local_part(email: &str) -> &str {
    let email = email.trim();
    email.split_once('@').map_or(email, |(local, _)| local)
}

/// Notification sent to listeners whenever the session changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started(SessionRecord),
    Ended,
}
