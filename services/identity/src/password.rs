//! Argon2 hashing for passwords and refresh tokens

use anyhow::{Context, Result};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use rand::rngs::OsRng;
use tokio::task::spawn_blocking;
use tracing::error;

/// Hash `plain` into a PHC string with a fresh random salt
pub fn hash_password(plain: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!("Failed to hash password: {}", e)
        })?
        .to_string();
    Ok(hash)
}

/// Check `plain` against a PHC string produced by [`hash_password`]
///
/// A mismatch is `Ok(false)`; only a malformed stored hash is an error.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// [`hash_password`] on the blocking pool
pub async fn spawn_hash(plain: String) -> Result<String> {
    spawn_blocking(move || hash_password(&plain))
        .await
        .context("hashing task panicked")?
}

/// [`verify_password`] on the blocking pool
pub async fn spawn_verify(plain: String, hash: String) -> Result<bool> {
    spawn_blocking(move || verify_password(&plain, &hash))
        .await
        .context("verification task panicked")?
}
