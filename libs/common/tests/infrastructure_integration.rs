//! Integration tests for the infrastructure components
//!
//! These need a running PostgreSQL (`DATABASE_URL`) and Redis (`REDIS_URL`)
//! and are ignored by default: `cargo test -- --ignored` runs them.

use common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool},
};
use sqlx::Row;

#[tokio::test]
#[ignore = "requires PostgreSQL"]
async fn test_database_roundtrip() -> Result<(), Box<dyn std::error::Error>> {
    let url = std::env::var("DATABASE_URL")?;
    let pool = init_pool(&DatabaseConfig::new(url)).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;
    let result: i32 = row.get("result");
    assert_eq!(result, 1);

    Ok(())
}

#[tokio::test]
#[ignore = "requires Redis"]
async fn test_cache_take_is_single_use() -> Result<(), Box<dyn std::error::Error>> {
    let config = RedisConfig {
        url: std::env::var("REDIS_URL").unwrap_or_else(|_| RedisConfig::default().url),
    };
    let pool = RedisPool::new(&config)?;
    assert!(pool.health_check().await?, "Redis health check failed");

    let key = "integration_take_key";
    pool.set(key, "value", Some(10)).await?;

    assert_eq!(pool.take(key).await?, Some("value".to_string()));
    assert_eq!(pool.take(key).await?, None);

    pool.set(key, "again", None).await?;
    pool.delete(key).await?;
    assert_eq!(pool.get(key).await?, None);

    Ok(())
}
