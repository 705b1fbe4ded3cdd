//! Credential checks, token issuance and refresh-token rotation

use std::sync::Arc;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{Registration, register_user};
use crate::{
    error::{AuthError, AuthResult},
    jwt::JwtService,
    models::{LoginRequest, NewUser, RegisterRequest, Role, TokenResponse, User},
    oauth::OAuthUserProfile,
    password,
    repositories::{TokenStore, UserStore},
    validation,
};

const ACCESS_DENIED: &str = "Access denied";

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    tokens: Arc<dyn TokenStore>,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserStore>, tokens: Arc<dyn TokenStore>, jwt: JwtService) -> Self {
        Self { users, tokens, jwt }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    /// Authenticate with email or username and issue a token pair
    #[instrument(skip_all)]
    pub async fn login(&self, request: LoginRequest) -> AuthResult<TokenResponse> {
        let user = self
            .users
            .find_by_email_or_username(request.identifier.trim())
            .await?
            .ok_or_else(|| AuthError::unauthorized("User not found!"))?;

        // OAuth-only accounts have no password to compare against
        let Some(hash) = user.password_hash.clone() else {
            warn!(user_id = %user.id, "password login on passwordless account");
            return Err(AuthError::unauthorized("Invalid credentials"));
        };

        if !password::spawn_verify(request.password, hash).await? {
            warn!(user_id = %user.id, "invalid password");
            return Err(AuthError::unauthorized("Invalid credentials"));
        }

        let tokens = self.issue_tokens(&user).await?;
        info!(user_id = %user.id, "user logged in");
        Ok(tokens)
    }

    /// Self-service registration, always with the `user` role
    #[instrument(skip_all)]
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<User> {
        register_user(
            self.users.as_ref(),
            Registration {
                email: request.email,
                username: request.username,
                password: request.password,
                first_name: request.first_name,
                last_name: request.last_name,
                role: Role::User,
            },
        )
        .await
    }

    /// Issue a fresh pair for a caller already through the refresh guard
    #[instrument(skip(self))]
    pub async fn refresh(&self, user_id: Uuid) -> AuthResult<TokenResponse> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::unauthorized(ACCESS_DENIED))?;

        let tokens = self.issue_tokens(&user).await?;
        info!(user_id = %user.id, "refresh token rotated");
        Ok(tokens)
    }

    /// Compare a presented refresh token with the stored hash
    #[instrument(skip(self, refresh_token))]
    pub async fn validate_refresh_token(&self, user_id: Uuid, refresh_token: &str) -> AuthResult<()> {
        let record = self
            .tokens
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AuthError::unauthorized(ACCESS_DENIED))?;

        if record.locked {
            warn!(%user_id, "refresh on locked token record");
            return Err(AuthError::unauthorized(ACCESS_DENIED));
        }

        let Some(hash) = record.refresh_token else {
            return Err(AuthError::unauthorized(ACCESS_DENIED));
        };

        if !password::spawn_verify(refresh_token.to_string(), hash).await? {
            warn!(%user_id, "refresh token does not match stored hash");
            return Err(AuthError::unauthorized(ACCESS_DENIED));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn logout(&self, user_id: Uuid) -> AuthResult<()> {
        if !self.tokens.invalidate_refresh_token(user_id).await? {
            return Err(AuthError::bad_request("Failed to invalidate refresh token"));
        }
        info!(%user_id, "user logged out");
        Ok(())
    }

    /// Find or create the user behind a provider profile, then issue tokens
    #[instrument(skip_all, fields(provider_id = %profile.provider_id))]
    pub async fn oauth_login(&self, profile: &OAuthUserProfile) -> AuthResult<TokenResponse> {
        if !profile.verified_email {
            return Err(AuthError::unauthorized("Email address is not verified"));
        }

        let email = validation::normalize_email(&profile.email);
        validation::validate_email(&email).map_err(AuthError::BadRequest)?;

        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => self.create_oauth_user(email, profile).await?,
        };

        let tokens = self.issue_tokens(&user).await?;
        info!(user_id = %user.id, "user logged in through oauth");
        Ok(tokens)
    }

    async fn create_oauth_user(&self, email: String, profile: &OAuthUserProfile) -> AuthResult<User> {
        let new_user = NewUser {
            email: email.clone(),
            username: None,
            password_hash: None,
            first_name: profile.first_name.trim().to_string(),
            last_name: profile.last_name.trim().to_string(),
            avatar_url: profile.avatar_url.clone(),
            role: Role::User,
        };

        if let Some(user) = self.users.create(&new_user).await? {
            info!(user_id = %user.id, "user created");
            return Ok(user);
        }

        // A concurrent callback for the same email won the insert
        self.users
            .find_by_email(&email)
            .await?
            .ok_or_else(|| AuthError::bad_request("Failed to create user"))
    }

    /// Sign a pair for `user` and persist the hash of its refresh token
    async fn issue_tokens(&self, user: &User) -> AuthResult<TokenResponse> {
        let pair = self.jwt.generate_pair(user.id, &[user.role])?;
        let hash = password::spawn_hash(pair.refresh_token.clone()).await?;

        if !self.tokens.store_refresh_token(user.id, &hash).await? {
            return Err(AuthError::bad_request("Failed to store refresh token"));
        }

        Ok(TokenResponse::bearer(pair, self.jwt.access_token_expiry()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        jwt::tests::test_service,
        repositories::memory::{MemoryTokenStore, MemoryUserStore},
    };

    struct Harness {
        service: AuthService,
        users: Arc<MemoryUserStore>,
        tokens: Arc<MemoryTokenStore>,
    }

    fn harness() -> Harness {
        let users = Arc::new(MemoryUserStore::default());
        let tokens = Arc::new(MemoryTokenStore::default());
        let service = AuthService::new(users.clone(), tokens.clone(), test_service());
        Harness {
            service,
            users,
            tokens,
        }
    }

    fn registration() -> RegisterRequest {
        RegisterRequest {
            email: "John.Doe@Example.com".to_string(),
            username: Some("johndoe".to_string()),
            password: "password123".to_string(),
            first_name: " John ".to_string(),
            last_name: "Doe".to_string(),
        }
    }

    fn login(identifier: &str, password: &str) -> LoginRequest {
        LoginRequest {
            identifier: identifier.to_string(),
            password: password.to_string(),
        }
    }

    fn google_profile(email: &str) -> OAuthUserProfile {
        OAuthUserProfile {
            provider_id: "1089".to_string(),
            email: email.to_string(),
            first_name: "Jane".to_string(),
            last_name: "Smith".to_string(),
            avatar_url: Some("https://example.com/jane.png".to_string()),
            verified_email: true,
        }
    }

    fn message(err: AuthError) -> String {
        err.to_string()
    }

    #[tokio::test]
    async fn test_register_normalizes_input() {
        let h = harness();
        let user = h.service.register(registration()).await.unwrap();

        assert_eq!(user.email, "john.doe@example.com");
        assert_eq!(user.first_name, "John");
        assert_eq!(user.role, Role::User);
        assert!(user.password_hash.as_deref().unwrap().starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_before_writing() {
        let h = harness();
        h.service.register(registration()).await.unwrap();

        let mut same_email = registration();
        same_email.email = "JOHN.DOE@example.com".to_string();
        same_email.username = Some("other".to_string());
        let err = h.service.register(same_email).await.unwrap_err();
        assert!(matches!(err, AuthError::BadRequest(_)));
        assert_eq!(message(err), "User already exists");

        let mut same_username = registration();
        same_username.email = "someone@example.com".to_string();
        let err = h.service.register(same_username).await.unwrap_err();
        assert_eq!(message(err), "Username already taken");

        assert_eq!(h.users.len().await, 1);
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_input() {
        let h = harness();
        let mut short = registration();
        short.password = "short".to_string();
        assert!(matches!(
            h.service.register(short).await,
            Err(AuthError::BadRequest(_))
        ));

        let mut bad_email = registration();
        bad_email.email = "not-an-email".to_string();
        assert!(matches!(
            h.service.register(bad_email).await,
            Err(AuthError::BadRequest(_))
        ));
        assert_eq!(h.users.len().await, 0);
    }

    #[tokio::test]
    async fn test_login_persists_matching_hash() {
        let h = harness();
        let user = h.service.register(registration()).await.unwrap();

        let tokens = h
            .service
            .login(login("john.doe@example.com", "password123"))
            .await
            .unwrap();
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, 900);

        let record = h.tokens.find_by_user_id(user.id).await.unwrap().unwrap();
        let hash = record.refresh_token.unwrap();
        assert!(password::verify_password(&tokens.refresh_token, &hash).unwrap());
        assert!(!password::verify_password(&tokens.access_token, &hash).unwrap());

        let claims = h.service.jwt().validate_access_token(&tokens.access_token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.roles, vec![Role::User]);
    }

    #[tokio::test]
    async fn test_login_by_username() {
        let h = harness();
        h.service.register(registration()).await.unwrap();
        assert!(h.service.login(login("johndoe", "password123")).await.is_ok());
    }

    #[tokio::test]
    async fn test_wrong_password_issues_nothing() {
        let h = harness();
        let user = h.service.register(registration()).await.unwrap();

        let err = h
            .service
            .login(login("johndoe", "password124"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(_)));
        assert_eq!(message(err), "Invalid credentials");
        assert!(h.tokens.find_by_user_id(user.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let h = harness();
        let err = h
            .service
            .login(login("nobody@example.com", "password123"))
            .await
            .unwrap_err();
        assert_eq!(message(err), "User not found!");
    }

    #[tokio::test]
    async fn test_unacknowledged_token_write_fails_login() {
        let h = harness();
        h.service.register(registration()).await.unwrap();
        h.tokens.refuse_writes(true);

        let err = h
            .service
            .login(login("johndoe", "password123"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::BadRequest(_)));
        assert_eq!(message(err), "Failed to store refresh token");
    }

    #[tokio::test]
    async fn test_logout_invalidates_refresh_token() {
        let h = harness();
        let user = h.service.register(registration()).await.unwrap();
        let tokens = h.service.login(login("johndoe", "password123")).await.unwrap();

        h.service
            .validate_refresh_token(user.id, &tokens.refresh_token)
            .await
            .unwrap();

        h.service.logout(user.id).await.unwrap();
        let err = h
            .service
            .validate_refresh_token(user.id, &tokens.refresh_token)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_logout_without_record_fails() {
        let h = harness();
        let err = h.service.logout(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(message(err), "Failed to invalidate refresh token");
    }

    #[tokio::test]
    async fn test_refresh_rotates_token() {
        let h = harness();
        let user = h.service.register(registration()).await.unwrap();
        let first = h.service.login(login("johndoe", "password123")).await.unwrap();

        let second = h.service.refresh(user.id).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);

        assert!(
            h.service
                .validate_refresh_token(user.id, &first.refresh_token)
                .await
                .is_err()
        );
        assert!(
            h.service
                .validate_refresh_token(user.id, &second.refresh_token)
                .await
                .is_ok()
        );
    }

    #[tokio::test]
    async fn test_locked_record_is_refused() {
        let h = harness();
        let user = h.service.register(registration()).await.unwrap();
        let tokens = h.service.login(login("johndoe", "password123")).await.unwrap();
        h.tokens.lock(user.id).await;

        assert!(matches!(
            h.service
                .validate_refresh_token(user.id, &tokens.refresh_token)
                .await,
            Err(AuthError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_oauth_login_creates_user_once() {
        let h = harness();

        let first = h
            .service
            .oauth_login(&google_profile("Jane.Smith@example.com"))
            .await
            .unwrap();
        let second = h
            .service
            .oauth_login(&google_profile("jane.smith@example.com"))
            .await
            .unwrap();
        assert_eq!(h.users.len().await, 1);

        let jwt = h.service.jwt();
        let a = jwt.validate_access_token(&first.access_token).unwrap();
        let b = jwt.validate_access_token(&second.access_token).unwrap();
        assert_eq!(a.sub, b.sub);

        let user = h.users.find_by_id(a.sub).await.unwrap().unwrap();
        assert!(user.password_hash.is_none());
        assert_eq!(user.avatar_url.as_deref(), Some("https://example.com/jane.png"));
    }

    #[tokio::test]
    async fn test_oauth_links_existing_account() {
        let h = harness();
        let user = h.service.register(registration()).await.unwrap();

        let tokens = h
            .service
            .oauth_login(&google_profile("john.doe@example.com"))
            .await
            .unwrap();
        let claims = h.service.jwt().validate_access_token(&tokens.access_token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(h.users.len().await, 1);
    }

    #[tokio::test]
    async fn test_oauth_account_cannot_password_login() {
        let h = harness();
        h.service
            .oauth_login(&google_profile("jane.smith@example.com"))
            .await
            .unwrap();

        let err = h
            .service
            .login(login("jane.smith@example.com", "password123"))
            .await
            .unwrap_err();
        assert_eq!(message(err), "Invalid credentials");
    }

    #[tokio::test]
    async fn test_unverified_oauth_email_is_refused() {
        let h = harness();
        let mut profile = google_profile("jane.smith@example.com");
        profile.verified_email = false;

        assert!(matches!(
            h.service.oauth_login(&profile).await,
            Err(AuthError::Unauthorized(_))
        ));
        assert_eq!(h.users.len().await, 0);
    }
}
