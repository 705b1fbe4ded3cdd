//! Request and response payloads of the `/auth` endpoints

use serde::{Deserialize, Serialize};

use crate::jwt::TokenPair;

/// Request for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email or username
    pub identifier: String,
    pub password: String,
}

/// Request for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// Response carrying a freshly issued token pair
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

impl TokenResponse {
    pub fn bearer(pair: TokenPair, expires_in: u64) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}
