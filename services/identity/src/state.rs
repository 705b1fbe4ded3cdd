use std::sync::Arc;

use common::cache::RedisPool;

use crate::{
    jwt::JwtService,
    oauth::OAuthClient,
    repositories::{TokenStore, UserStore},
    service::{AuthService, UsersService},
};

/// Everything the Google login flow needs besides the services
pub struct GoogleLogin {
    pub client: OAuthClient,
    pub redis: RedisPool,
    /// Client URL the callback redirects to with `?token=`
    pub success_redirect: String,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub users: UsersService,
    /// `None` when Google OAuth is not configured
    pub google: Option<Arc<GoogleLogin>>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        tokens: Arc<dyn TokenStore>,
        jwt: JwtService,
        google: Option<GoogleLogin>,
    ) -> Self {
        Self {
            auth: AuthService::new(users.clone(), tokens, jwt),
            users: UsersService::new(users),
            google: google.map(Arc::new),
        }
    }
}
