//! Token repository: one refresh-token record per user

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use super::TokenStore;
use crate::models::TokenRecord;

/// Token repository
#[derive(Clone)]
pub struct TokenRepository {
    pool: PgPool,
}

impl TokenRepository {
    /// Create a new token repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TokenStore for TokenRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<TokenRecord>> {
        let row = sqlx::query(
            r#"
            SELECT user_id, refresh_token, locked, created_at, updated_at
            FROM tokens
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(TokenRecord {
                user_id: row.try_get("user_id")?,
                refresh_token: row.try_get("refresh_token")?,
                locked: row.try_get("locked")?,
                created_at: row.try_get("created_at")?,
                updated_at: row.try_get("updated_at")?,
            })),
            None => Ok(None),
        }
    }

    async fn store_refresh_token(&self, user_id: Uuid, token_hash: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO tokens (user_id, refresh_token)
            VALUES ($1, $2)
            ON CONFLICT (user_id)
            DO UPDATE SET refresh_token = EXCLUDED.refresh_token, updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(token_hash)
        .execute(&self.pool)
        .await?;

        debug!(user_id = %user_id, rows = result.rows_affected(), "refresh token stored");
        Ok(result.rows_affected() > 0)
    }

    async fn invalidate_refresh_token(&self, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE tokens
            SET refresh_token = NULL, updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        debug!(user_id = %user_id, rows = result.rows_affected(), "refresh token cleared");
        Ok(result.rows_affected() > 0)
    }
}
