//! Refresh-token record, one per user

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-side state of a user's refresh token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    pub user_id: Uuid,
    /// Argon2 hash of the last issued refresh token; `None` after logout
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
