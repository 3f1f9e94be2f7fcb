//! Session management over a persisted key-value store
//!
//! There is no credential verification: a login succeeds as soon as its
//! inputs pass validation, and it replaces whatever session was stored.

use chrono::Utc;
use common::store::KeyValueStore;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::error::{SessionError, SessionResult};
use crate::models::{SessionEvent, SessionRecord};
use crate::validation::{PasswordPolicy, evaluate_password, validate_required};

/// Store key holding the serialized session record
pub const SESSION_KEY: &str = "user";

const EVENT_CAPACITY: usize = 16;

/// Holds the single optional session record
#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    policy: PasswordPolicy,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Create a new session store
    pub fn new(store: Arc<dyn KeyValueStore>, policy: PasswordPolicy) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            policy,
            events,
        }
    }

    pub fn policy(&self) -> PasswordPolicy {
        self.policy
    }

    /// Listen for session changes
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Get the current session, if any
    ///
    /// Never fails. A store error reads as no session; a record that cannot
    /// be parsed is removed and reads as no session.
    pub async fn current(&self) -> Option<SessionRecord> {
        let raw = match self.store.get(SESSION_KEY).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!("Failed to read session: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<SessionRecord>(&raw) {
            Ok(record) => Some(record),
            Err(e) => {
                error!("Failed to parse session, discarding it: {}", e);
                if let Err(e) = self.store.delete(SESSION_KEY).await {
                    warn!("Failed to discard corrupt session: {}", e);
                }
                None
            }
        }
    }

    /// Whether a session exists
    pub async fn is_signed_in(&self) -> bool {
        self.current().await.is_some()
    }

    /// Log in as `email`
    ///
    /// Both fields must be non-empty and the password must pass the store's
    /// [`PasswordPolicy`]. The name is derived from the email.
    pub async fn start_session(&self, email: &str, password: &str) -> SessionResult<SessionRecord> {
        validate_required("email", email).map_err(SessionError::MissingField)?;
        validate_required("password", password).map_err(SessionError::MissingField)?;

        let (accepted, evaluation) = self.policy.check(password);
        if !accepted {
            info!("Login rejected for {}: {}", email, evaluation.message);
            return Err(SessionError::WeakPassword(evaluation));
        }

        let record = SessionRecord::new(email, None, Utc::now());
        self.persist(&record).await?;
        info!("Session started for {}", record.email);
        Ok(record)
    }

    /// Create an account and log in
    ///
    /// Sign-up always requires a strong password, whatever the login policy.
    pub async fn sign_up(
        &self,
        name: Option<&str>,
        email: &str,
        password: &str,
        confirmation: &str,
    ) -> SessionResult<SessionRecord> {
        validate_required("email", email).map_err(SessionError::MissingField)?;
        validate_required("password", password).map_err(SessionError::MissingField)?;

        if password != confirmation {
            return Err(SessionError::PasswordMismatch);
        }

        let evaluation = evaluate_password(password);
        if !evaluation.valid {
            info!("Sign-up rejected for {}: {}", email, evaluation.message);
            return Err(SessionError::WeakPassword(evaluation));
        }

        let record = SessionRecord::new(email, name, Utc::now());
        self.persist(&record).await?;
        info!("Account created for {}", record.email);
        Ok(record)
    }

    /// Log out. Safe to call without a session.
    pub async fn end_session(&self) -> SessionResult<()> {
        self.store.delete(SESSION_KEY).await?;
        info!("Session ended");
        let _ = self.events.send(SessionEvent::Ended);
        Ok(())
    }

    async fn persist(&self, record: &SessionRecord) -> SessionResult<()> {
        let raw = serde_json::to_string(record)?;
        self.store.set(SESSION_KEY, &raw).await?;
        let _ = self.events.send(SessionEvent::Started(record.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::store::MemoryStore;

    fn session_store(policy: PasswordPolicy) -> (Arc<MemoryStore>, SessionStore) {
        let store = Arc::new(MemoryStore::new());
        let sessions = SessionStore::new(store.clone(), policy);
        (store, sessions)
    }

    #[tokio::test]
    async fn test_start_session_derives_name() {
        let (_, sessions) = session_store(PasswordPolicy::Strict);
        assert_eq!(sessions.current().await, None);

        let record = sessions.start_session("a@b.com", "Str0ng!pw").await.unwrap();
        assert_eq!(record.name.as_deref(), Some("a"));
        assert_eq!(sessions.current().await, Some(record));
    }

    #[tokio::test]
    async fn test_login_overwrites_previous_session() {
        let (_, sessions) = session_store(PasswordPolicy::Strict);
        sessions.start_session("a@b.com", "Str0ng!pw").await.unwrap();
        sessions.start_session("c@d.com", "An0ther!pw").await.unwrap();

        let current = sessions.current().await.unwrap();
        assert_eq!(current.email, "c@d.com");
    }

    #[tokio::test]
    async fn test_empty_fields_rejected() {
        let (store, sessions) = session_store(PasswordPolicy::Strict);

        let err = sessions.start_session("", "Str0ng!pw").await.unwrap_err();
        assert!(matches!(err, SessionError::MissingField("email")));

        let err = sessions.start_session("a@b.com", "").await.unwrap_err();
        assert!(matches!(err, SessionError::MissingField("password")));

        assert_eq!(store.get(SESSION_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_weak_password_reports_evaluation() {
        let (_, sessions) = session_store(PasswordPolicy::Strict);
        let err = sessions.start_session("a@b.com", "password").await.unwrap_err();

        match err {
            SessionError::WeakPassword(evaluation) => {
                assert!(!evaluation.valid);
                assert!(evaluation.requirements.lowercase);
                assert_eq!(
                    evaluation.message,
                    "Password must contain one uppercase letter, one number, one special character"
                );
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!sessions.is_signed_in().await);
    }

    #[tokio::test]
    async fn test_minimum_length_policy() {
        let (_, sessions) = session_store(PasswordPolicy::MinimumLength);
        assert!(sessions.start_session("a@b.com", "password").await.is_ok());
        assert!(matches!(
            sessions.start_session("a@b.com", "short").await,
            Err(SessionError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn test_sign_up() {
        let (_, sessions) = session_store(PasswordPolicy::MinimumLength);

        let err = sessions
            .sign_up(Some("Ann"), "ann@b.com", "Str0ng!pw", "Str0ng!px")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::PasswordMismatch));

        // sign-up stays strict even when login is lenient
        let err = sessions
            .sign_up(Some("Ann"), "ann@b.com", "password", "password")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::WeakPassword(_)));

        let record = sessions
            .sign_up(Some("Ann"), "ann@b.com", "Str0ng!pw", "Str0ng!pw")
            .await
            .unwrap();
        assert_eq!(record.display_name(), "Ann");
        assert_eq!(sessions.current().await, Some(record));
    }

    #[tokio::test]
    async fn test_end_session_is_idempotent() {
        let (_, sessions) = session_store(PasswordPolicy::Strict);
        sessions.start_session("a@b.com", "Str0ng!pw").await.unwrap();

        sessions.end_session().await.unwrap();
        assert_eq!(sessions.current().await, None);
        sessions.end_session().await.unwrap();
        assert_eq!(sessions.current().await, None);
    }

    #[tokio::test]
    async fn test_corrupt_record_is_discarded() {
        let (store, sessions) = session_store(PasswordPolicy::Strict);
        store.set(SESSION_KEY, "{not json").await.unwrap();

        assert_eq!(sessions.current().await, None);
        assert_eq!(store.get(SESSION_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_listeners_are_notified() {
        let (_, sessions) = session_store(PasswordPolicy::Strict);
        let mut events = sessions.subscribe();

        let record = sessions.start_session("a@b.com", "Str0ng!pw").await.unwrap();
        sessions.end_session().await.unwrap();

        assert_eq!(events.recv().await.unwrap(), SessionEvent::Started(record));
        assert_eq!(events.recv().await.unwrap(), SessionEvent::Ended);
    }
}
