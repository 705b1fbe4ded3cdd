//! Middleware for bearer-token authentication and role checks

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::{AuthError, AuthResult},
    models::Role,
    state::AppState,
};

/// The authenticated principal, inserted into request extensions
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub roles: Vec<Role>,
}

impl CurrentUser {
    pub fn has_any_role(&self, allowed: &[Role]) -> bool {
        self.roles.iter().any(|role| allowed.contains(role))
    }
}

fn bearer_token(header: Option<TypedHeader<Authorization<Bearer>>>) -> AuthResult<String> {
    header
        .map(|TypedHeader(Authorization(bearer))| bearer.token().to_string())
        .ok_or_else(|| AuthError::unauthorized("Missing bearer token"))
}

/// Require a valid access token
pub async fn require_access_token(
    State(state): State<AppState>,
    header: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> AuthResult<Response> {
    let token = bearer_token(header)?;
    let claims = state.auth.jwt().validate_access_token(&token).map_err(|e| {
        debug!(error = %e, "access token rejected");
        AuthError::unauthorized("Invalid or expired token")
    })?;

    req.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        roles: claims.roles,
    });
    Ok(next.run(req).await)
}

/// Require a refresh token that is valid and still matches the stored hash
pub async fn require_refresh_token(
    State(state): State<AppState>,
    header: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request,
    next: Next,
) -> AuthResult<Response> {
    let token = bearer_token(header)?;
    let claims = state.auth.jwt().validate_refresh_token(&token).map_err(|e| {
        debug!(error = %e, "refresh token rejected");
        AuthError::unauthorized("Invalid or expired token")
    })?;

    state.auth.validate_refresh_token(claims.sub, &token).await?;

    req.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        roles: claims.roles,
    });
    Ok(next.run(req).await)
}

async fn require_roles(allowed: &[Role], req: Request, next: Next) -> AuthResult<Response> {
    let user = req
        .extensions()
        .get::<CurrentUser>()
        .ok_or_else(|| AuthError::unauthorized("Missing bearer token"))?;

    if !user.has_any_role(allowed) {
        debug!(user_id = %user.id, "missing required role");
        return Err(AuthError::Forbidden);
    }
    Ok(next.run(req).await)
}

/// Must run after [`require_access_token`]
pub async fn require_admin(req: Request, next: Next) -> AuthResult<Response> {
    require_roles(&[Role::Admin], req, next).await
}
