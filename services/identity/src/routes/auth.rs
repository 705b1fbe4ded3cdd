//! `/auth` endpoints

use anyhow::Context;
use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use oauth2::PkceCodeVerifier;
use reqwest::Url;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::{
    error::{AuthError, AuthResult},
    extract,
    middleware::{CurrentUser, require_access_token, require_refresh_token},
    models::{LoginRequest, RegisterRequest, TokenResponse, UserResponse},
    oauth::{self, GOOGLE_SCOPES},
    state::{AppState, GoogleLogin},
};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
        .route(
            "/logout",
            post(logout).route_layer(middleware::from_fn_with_state(
                state.clone(),
                require_access_token,
            )),
        )
        .route(
            "/refresh",
            post(refresh).route_layer(middleware::from_fn_with_state(
                state,
                require_refresh_token,
            )),
        )
        .route("/oauth/google/login", get(google_login))
        .route("/oauth/google/callback", get(google_callback))
}

async fn login(
    State(state): State<AppState>,
    extract::Json(payload): extract::Json<LoginRequest>,
) -> AuthResult<Json<TokenResponse>> {
    Ok(Json(state.auth.login(payload).await?))
}

async fn register(
    State(state): State<AppState>,
    extract::Json(payload): extract::Json<RegisterRequest>,
) -> AuthResult<impl IntoResponse> {
    let user = state.auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AuthResult<impl IntoResponse> {
    state.auth.logout(user.id).await?;
    Ok(Json(json!({ "message": "Logged out successfully" })))
}

async fn refresh(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AuthResult<Json<TokenResponse>> {
    Ok(Json(state.auth.refresh(user.id).await?))
}

fn configured_google(state: &AppState) -> AuthResult<&GoogleLogin> {
    state
        .google
        .as_deref()
        .ok_or(AuthError::NotConfigured("Google OAuth"))
}

async fn google_login(State(state): State<AppState>) -> AuthResult<Redirect> {
    let google = configured_google(&state)?;
    let (auth_url, csrf_token, pkce_verifier) = google.client.authorize_url(GOOGLE_SCOPES);

    oauth::save_session(&google.redis, &csrf_token, &pkce_verifier).await?;
    info!("redirecting to Google");

    Ok(Redirect::to(&auth_url))
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

async fn google_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> AuthResult<Redirect> {
    let google = configured_google(&state)?;

    if let Some(error) = params.error {
        warn!(%error, "Google denied the authorization request");
        return Err(AuthError::unauthorized("Authorization was denied"));
    }
    let (Some(code), Some(csrf_state)) = (params.code, params.state) else {
        return Err(AuthError::bad_request("Missing code or state"));
    };

    let pkce_verifier = oauth::take_session(&google.redis, &csrf_state)
        .await?
        .ok_or_else(|| AuthError::unauthorized("Invalid or expired OAuth state"))?;

    complete_google_login(&state, google, code, pkce_verifier).await
}

/// Exchange the code, sign the user in and redirect to the client
async fn complete_google_login(
    state: &AppState,
    google: &GoogleLogin,
    code: String,
    pkce_verifier: PkceCodeVerifier,
) -> AuthResult<Redirect> {
    let provider_token = google
        .client
        .exchange_code(code, pkce_verifier)
        .await
        .map_err(|e| {
            warn!(error = %e, "Google code exchange failed");
            AuthError::unauthorized("Invalid authorization code")
        })?;
    let profile = google
        .client
        .fetch_profile(&provider_token)
        .await
        .map_err(|e| {
            warn!(error = %e, "Google profile fetch failed");
            AuthError::unauthorized("Could not fetch Google profile")
        })?;
    let tokens = state.auth.oauth_login(&profile).await?;

    let mut target = Url::parse(&google.success_redirect).context("invalid success redirect")?;
    target
        .query_pairs_mut()
        .append_pair("token", &tokens.access_token);

    Ok(Redirect::to(target.as_str()))
}
