//! Error types for the session store

use common::error::StoreError;
use thiserror::Error;

use crate::validation::PasswordEvaluation;

/// Why a login or sign-up was refused
#[derive(Error, Debug)]
pub enum SessionError {
    /// A required form field was empty
    #[error("Please enter {0}")]
    MissingField(&'static str),

    /// The password does not satisfy the active policy
    #[error("{}", .0.message)]
    WeakPassword(PasswordEvaluation),

    /// Sign-up password and confirmation differ
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// The record could not be written
    #[error("Failed to persist session: {0}")]
    Store(#[from] StoreError),

    /// The record could not be serialized
    #[error("Failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Type alias for Result with SessionError
pub type SessionResult<T> = Result<T, SessionError>;
