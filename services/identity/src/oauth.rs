//! OAuth2 integration for Google sign-in
//!
//! The login endpoint stores the PKCE verifier in Redis keyed by the CSRF
//! state; the callback takes it back out exactly once.

use anyhow::Result;
use common::cache::RedisPool;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl, basic::BasicClient,
};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// How long a started login may take before its state expires
pub const OAUTH_STATE_TTL_SECONDS: u64 = 600;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Scopes requested from Google
pub const GOOGLE_SCOPES: &[&str] = &["email", "profile"];

/// OAuth2 configuration for Google
#[derive(Debug, Clone)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Our callback URL registered with Google
    pub redirect_url: String,
}

/// OAuth2 client wrapper
#[derive(Clone)]
pub struct OAuthClient {
    client: BasicClient,
    http: reqwest::Client,
    userinfo_url: String,
}

impl OAuthClient {
    /// Create a new OAuth2 client for Google
    pub fn google(config: &GoogleOAuthConfig) -> Result<Self> {
        Self::with_endpoints(config, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GOOGLE_USERINFO_URL)
    }

    fn with_endpoints(
        config: &GoogleOAuthConfig,
        auth_url: &str,
        token_url: &str,
        userinfo_url: &str,
    ) -> Result<Self> {
        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(auth_url.to_string())?,
            Some(TokenUrl::new(token_url.to_string())?),
        )
        .set_redirect_uri(RedirectUrl::new(config.redirect_url.clone())?);

        Ok(Self {
            client,
            http: reqwest::Client::new(),
            userinfo_url: userinfo_url.to_string(),
        })
    }

    /// Client whose provider endpoints all point at `base`
    #[cfg(test)]
    pub(crate) fn for_test(config: &GoogleOAuthConfig, base: &str) -> Result<Self> {
        Self::with_endpoints(
            config,
            &format!("{base}/auth"),
            &format!("{base}/token"),
            &format!("{base}/userinfo"),
        )
    }

    /// Generate authorization URL with PKCE
    pub fn authorize_url(&self, scopes: &[&str]) -> (String, CsrfToken, PkceCodeVerifier) {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut request = self
            .client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge);

        for scope in scopes {
            request = request.add_scope(Scope::new(scope.to_string()));
        }

        let (auth_url, csrf_token) = request.url();
        (auth_url.to_string(), csrf_token, pkce_verifier)
    }

    /// Exchange an authorization code for the provider's access token
    pub async fn exchange_code(&self, code: String, pkce_verifier: PkceCodeVerifier) -> Result<String> {
        info!("Exchanging Google authorization code");

        let token_response = self
            .client
            .exchange_code(AuthorizationCode::new(code))
            .set_pkce_verifier(pkce_verifier)
            .request_async(oauth2::reqwest::async_http_client)
            .await?;

        Ok(token_response.access_token().secret().clone())
    }

    /// Fetch the Google userinfo profile
    pub async fn fetch_profile(&self, access_token: &str) -> Result<OAuthUserProfile> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("Failed to get Google user profile: {}", response.status());
        }

        let google_user: GoogleUser = response.json().await?;
        Ok(google_user.into())
    }
}

/// Google userinfo response
#[derive(Debug, Deserialize)]
struct GoogleUser {
    id: String,
    email: String,
    #[serde(default)]
    verified_email: bool,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl From<GoogleUser> for OAuthUserProfile {
    fn from(user: GoogleUser) -> Self {
        OAuthUserProfile {
            provider_id: user.id,
            email: user.email,
            first_name: user.given_name.unwrap_or_default(),
            last_name: user.family_name.unwrap_or_default(),
            avatar_url: user.picture,
            verified_email: user.verified_email,
        }
    }
}

/// Profile information handed over by an OAuth provider
#[derive(Debug, Clone)]
pub struct OAuthUserProfile {
    pub provider_id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub verified_email: bool,
}

/// Pending login stored in Redis between redirect and callback
#[derive(Debug, Serialize, Deserialize)]
pub struct OAuthSession {
    pub pkce_verifier: String,
    pub created_at: u64,
}

fn state_key(state: &str) -> String {
    format!("oauth_state:{}", state)
}

/// Remember the PKCE verifier for `csrf_token`
pub async fn save_session(
    redis: &RedisPool,
    csrf_token: &CsrfToken,
    pkce_verifier: &PkceCodeVerifier,
) -> Result<()> {
    let created_at = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
    let session = OAuthSession {
        pkce_verifier: pkce_verifier.secret().clone(),
        created_at,
    };
    redis
        .set_json(
            &state_key(csrf_token.secret()),
            &session,
            Some(OAUTH_STATE_TTL_SECONDS),
        )
        .await?;
    debug!("oauth state stored");
    Ok(())
}

/// Take the pending login for `state`, if any; a state can be used once
pub async fn take_session(redis: &RedisPool, state: &str) -> Result<Option<PkceCodeVerifier>> {
    let session: Option<OAuthSession> = redis.take_json(&state_key(state)).await?;
    Ok(session.map(|s| PkceCodeVerifier::new(s.pkce_verifier)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GoogleOAuthConfig {
        GoogleOAuthConfig {
            client_id: "client-123".to_string(),
            client_secret: "shh".to_string(),
            redirect_url: "http://localhost:3000/api/v1/auth/oauth/google/callback".to_string(),
        }
    }

    #[test]
    fn test_authorize_url_carries_pkce_and_state() {
        let client = OAuthClient::google(&config()).unwrap();
        let (url, csrf, _verifier) = client.authorize_url(GOOGLE_SCOPES);

        assert!(url.starts_with(GOOGLE_AUTH_URL));
        assert!(url.contains("client_id=client-123"));
        assert!(url.contains("code_challenge_method=S256"));
        assert!(url.contains(&format!("state={}", csrf.secret())));
        assert!(url.contains("scope=email+profile"));
    }

    #[test]
    fn test_each_login_gets_fresh_state() {
        let client = OAuthClient::google(&config()).unwrap();
        let (_, a, _) = client.authorize_url(GOOGLE_SCOPES);
        let (_, b, _) = client.authorize_url(GOOGLE_SCOPES);
        assert_ne!(a.secret(), b.secret());
    }

    #[test]
    fn test_invalid_redirect_url_is_rejected() {
        let mut config = config();
        config.redirect_url = "not a url".to_string();
        assert!(OAuthClient::google(&config).is_err());
    }

    #[test]
    fn test_google_profile_mapping() {
        let raw = r#"{
            "id": "1089",
            "email": "jane.smith@example.com",
            "verified_email": true,
            "given_name": "Jane",
            "picture": "https://example.com/jane.png"
        }"#;
        let profile: OAuthUserProfile = serde_json::from_str::<GoogleUser>(raw).unwrap().into();

        assert_eq!(profile.provider_id, "1089");
        assert_eq!(profile.first_name, "Jane");
        assert_eq!(profile.last_name, "");
        assert_eq!(profile.avatar_url.as_deref(), Some("https://example.com/jane.png"));
        assert!(profile.verified_email);
    }

    #[test]
    fn test_state_keys_are_namespaced() {
        assert_eq!(state_key("abc"), "oauth_state:abc");
    }
}
