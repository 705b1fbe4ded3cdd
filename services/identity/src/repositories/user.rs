//! User repository for database operations

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::{debug, warn};
use uuid::Uuid;

use super::UserStore;
use crate::models::{NewUser, User};

const USER_COLUMNS: &str = "id, email, username, password_hash, first_name, last_name, \
                            avatar_url, role, created_at, updated_at";

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, condition: &str, value: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {condition}");
        let row = sqlx::query(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }
}

fn user_from_row(row: &PgRow) -> Result<User> {
    let role: String = row.try_get("role")?;
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        avatar_url: row.try_get("avatar_url")?,
        role: role.parse()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserStore for UserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        debug!(user_id = %id, "Finding user by ID");

        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_one("email = $1", email).await
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_one("username = $1", username).await
    }

    async fn find_by_email_or_username(&self, identifier: &str) -> Result<Option<User>> {
        self.find_one("email = lower($1) OR username = $1 LIMIT 1", identifier)
            .await
    }

    async fn create(&self, new_user: &NewUser) -> Result<Option<User>> {
        debug!(email = %new_user.email, "Creating new user");

        let sql = format!(
            "INSERT INTO users (email, username, password_hash, first_name, last_name, avatar_url, role) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {USER_COLUMNS}"
        );
        let result = sqlx::query(&sql)
            .bind(&new_user.email)
            .bind(&new_user.username)
            .bind(&new_user.password_hash)
            .bind(&new_user.first_name)
            .bind(&new_user.last_name)
            .bind(&new_user.avatar_url)
            .bind(new_user.role.as_str())
            .fetch_one(&self.pool)
            .await;

        match result {
            Ok(row) => Ok(Some(user_from_row(&row)?)),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                warn!(email = %new_user.email, constraint = ?e.constraint(), "user insert refused");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
