//! Shared infrastructure for the identity workspace
//!
//! Database pooling and migrations, the Redis cache handle, tracing setup
//! and the error types they raise.

pub mod cache;
pub mod database;
pub mod error;
pub mod telemetry;

pub use error::{CacheError, CacheResult, DatabaseError, DatabaseResult};
