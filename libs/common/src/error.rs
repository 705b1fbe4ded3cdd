//! Error types for the shared infrastructure
//!
//! Services wrap these into their own HTTP-facing errors; nothing in this
//! crate knows about status codes.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Errors raised while talking to PostgreSQL
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Errors raised while talking to Redis
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(#[source] redis::RedisError),

    #[error("Cache command error: {0}")]
    Command(#[source] redis::RedisError),

    /// A cached value could not be encoded or decoded
    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Type alias for Result with CacheError
pub type CacheResult<T> = Result<T, CacheError>;
