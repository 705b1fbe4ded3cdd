//! PostgreSQL connection pooling, health checks and migrations

use std::time::Duration;

use sqlx::{PgPool, migrate::Migrator, postgres::PgPoolOptions};
use tracing::{error, info};

use crate::error::{DatabaseError, DatabaseResult};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections kept open
    pub min_connections: u32,
    /// Time to wait for a free connection, in seconds
    pub connection_timeout: u64,
}

impl DatabaseConfig {
    /// Build a configuration with the default pool sizing
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: 10,
            min_connections: 1,
            connection_timeout: 30,
        }
    }
}

/// Initialize a PostgreSQL connection pool
pub async fn init_pool(config: &DatabaseConfig) -> DatabaseResult<PgPool> {
    if config.database_url.is_empty() {
        return Err(DatabaseError::Configuration(
            "database url must not be empty".to_string(),
        ));
    }
    if config.min_connections > config.max_connections {
        return Err(DatabaseError::Configuration(format!(
            "min_connections ({}) exceeds max_connections ({})",
            config.min_connections, config.max_connections
        )));
    }

    info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Initializing database connection pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect(&config.database_url)
        .await
        .map_err(DatabaseError::Connection)?;

    info!("Database connection pool initialized successfully");
    Ok(pool)
}

/// Check database connectivity
///
/// Returns `Ok(false)` rather than an error when the database answers with a
/// failure, so callers can decide whether an unhealthy database is fatal.
pub async fn health_check(pool: &PgPool) -> DatabaseResult<bool> {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => Ok(true),
        Err(e) => {
            error!(error = %e, "Database health check failed");
            Ok(false)
        }
    }
}

/// Apply all pending migrations of `migrator`
pub async fn run_migrations(pool: &PgPool, migrator: &Migrator) -> DatabaseResult<()> {
    migrator.run(pool).await?;
    info!(count = migrator.iter().count(), "Database migrations applied");
    Ok(())
}
