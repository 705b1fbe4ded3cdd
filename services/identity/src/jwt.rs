//! JWT service for token generation and validation
//!
//! Access and refresh tokens are HS256 JWTs signed with separate secrets, so a
//! token of one kind can never be verified as the other even before the
//! `token_type` claim is checked.

use anyhow::{Result, bail};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;
use uuid::Uuid;

use crate::models::Role;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret for signing access tokens
    pub access_secret: String,
    /// Access token lifetime in seconds
    pub access_token_expiry: u64,
    /// Secret for signing refresh tokens
    pub refresh_secret: String,
    /// Refresh token lifetime in seconds
    pub refresh_token_expiry: u64,
}

/// Longest accepted token lifetime, ten years
pub const MAX_EXPIRY_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Parse a lifetime such as `900`, `45s`, `15m`, `1h` or `7d` into seconds
pub fn parse_expiry(raw: &str) -> Result<u64> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);

    if digits.is_empty() {
        bail!("invalid token lifetime '{raw}': expected a number");
    }
    let value: u64 = digits.parse()?;
    let multiplier = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        other => bail!("invalid token lifetime '{raw}': unknown unit '{other}'"),
    };
    if value == 0 {
        bail!("invalid token lifetime '{raw}': must be positive");
    }

    match value.checked_mul(multiplier) {
        Some(seconds) if seconds <= MAX_EXPIRY_SECONDS => Ok(seconds),
        _ => bail!("invalid token lifetime '{raw}': must be at most ten years"),
    }
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User roles, empty on refresh tokens
    pub roles: Vec<Role>,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Unique token id
    pub jti: Uuid,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// A freshly issued access/refresh token pair
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    access: KeyPair,
    refresh: KeyPair,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self> {
        if config.access_secret.is_empty() || config.refresh_secret.is_empty() {
            bail!("JWT secrets must not be empty");
        }
        if config.access_secret == config.refresh_secret {
            tracing::warn!("access and refresh tokens share a signing secret");
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        Ok(JwtService {
            access: KeyPair::from_secret(&config.access_secret),
            refresh: KeyPair::from_secret(&config.refresh_secret),
            validation,
            config,
        })
    }

    fn expires_at(now: u64, lifetime: u64) -> Result<u64> {
        now.checked_add(lifetime)
            .ok_or_else(|| anyhow::anyhow!("token expiry overflows"))
    }

    fn now() -> Result<u64> {
        Ok(SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
            .as_secs())
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        let key = match claims.token_type {
            TokenType::Access => &self.access.encoding,
            TokenType::Refresh => &self.refresh.encoding,
        };
        let token = encode(&Header::new(Algorithm::HS256), claims, key)?;
        debug!(user_id = %claims.sub, token_type = ?claims.token_type, "jwt signed");
        Ok(token)
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user_id: Uuid, roles: &[Role]) -> Result<String> {
        let now = Self::now()?;
        self.sign(&Claims {
            sub: user_id,
            roles: roles.to_vec(),
            iat: now,
            exp: Self::expires_at(now, self.config.access_token_expiry)?,
            jti: Uuid::new_v4(),
            token_type: TokenType::Access,
        })
    }

    /// Generate a refresh token for a user
    pub fn generate_refresh_token(&self, user_id: Uuid) -> Result<String> {
        let now = Self::now()?;
        self.sign(&Claims {
            sub: user_id,
            roles: vec![],
            iat: now,
            exp: Self::expires_at(now, self.config.refresh_token_expiry)?,
            jti: Uuid::new_v4(),
            token_type: TokenType::Refresh,
        })
    }

    /// Generate both tokens at once
    pub fn generate_pair(&self, user_id: Uuid, roles: &[Role]) -> Result<TokenPair> {
        Ok(TokenPair {
            access_token: self.generate_access_token(user_id, roles)?,
            refresh_token: self.generate_refresh_token(user_id)?,
        })
    }

    fn validate(&self, token: &str, expected: TokenType) -> Result<Claims> {
        let key = match expected {
            TokenType::Access => &self.access.decoding,
            TokenType::Refresh => &self.refresh.decoding,
        };
        let claims = decode::<Claims>(token, key, &self.validation)?.claims;
        if claims.token_type != expected {
            bail!("expected {:?} token, got {:?}", expected, claims.token_type);
        }
        Ok(claims)
    }

    /// Validate an access token and return the claims
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        self.validate(token, TokenType::Access)
    }

    /// Validate a refresh token's signature and expiry
    ///
    /// This does not consult the stored hash; see
    /// `AuthService::validate_refresh_token` for that.
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        self.validate(token, TokenType::Refresh)
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }
}
