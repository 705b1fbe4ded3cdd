//! Persistence seams for users and refresh-token records
//!
//! Services depend on the [`UserStore`] and [`TokenStore`] traits; the
//! PostgreSQL implementations live in [`user`] and [`token`].

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{NewUser, TokenRecord, User};

pub mod token;
pub mod user;

#[cfg(test)]
pub mod memory;

pub use token::TokenRepository;
pub use user::UserRepository;

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// `email` is expected in its normalized (lowercase) form
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Matches `identifier` against the email (case-insensitively) or the username
    async fn find_by_email_or_username(&self, identifier: &str) -> Result<Option<User>>;

    /// Insert a user; `Ok(None)` when a uniqueness constraint refused the row
    async fn create(&self, new_user: &NewUser) -> Result<Option<User>>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<TokenRecord>>;

    /// Insert or overwrite the user's refresh-token hash; `true` when acknowledged
    async fn store_refresh_token(&self, user_id: Uuid, token_hash: &str) -> Result<bool>;

    /// Clear the user's refresh-token hash; `false` when there was no record
    async fn invalidate_refresh_token(&self, user_id: Uuid) -> Result<bool>;
}
