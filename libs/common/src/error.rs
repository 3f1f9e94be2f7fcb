//! Custom error types for the common library
//!
//! This module defines application-specific error types that can be used
//! throughout the workspace.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred while creating the schema
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Error type for key-value store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backing file could not be read or written
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but does not hold a JSON object of strings
    #[error("Store file is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),

    /// Redis rejected the command or the connection failed
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),
}

/// Type alias for Result with StoreError
pub type StoreResult<T> = Result<T, StoreError>;
