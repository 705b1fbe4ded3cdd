//! HTTP surface of the identity service, mounted under `/api/v1`

use anyhow::{Context, Result, bail};
use axum::{
    Json, Router,
    http::{HeaderValue, Method, Request, header},
    response::IntoResponse,
    routing::get,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

use crate::state::AppState;

mod auth;
mod users;

/// Create the router for the identity service
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth::router(state.clone()))
        .nest("/users", users::router(state.clone()));

    Router::new()
        .nest("/api/v1", api)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Request span without the query string, which may carry OAuth codes
fn request_span<B>(request: &Request<B>) -> Span {
    tracing::info_span!(
        "request",
        method = %request.method(),
        path = %request.uri().path(),
        version = ?request.version(),
    )
}

/// CORS policy from a comma separated origin list, or `*` for any origin
pub fn cors_layer(allow_origin: &str) -> Result<CorsLayer> {
    let origin = if allow_origin.trim() == "*" {
        AllowOrigin::from(Any)
    } else {
        let origins = allow_origin
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(|o| {
                if o == "*" {
                    bail!("CORS origin '*' cannot be combined with other origins");
                }
                HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin '{o}'"))
            })
            .collect::<Result<Vec<_>>>()?;
        AllowOrigin::list(origins)
    };

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "identity"
    }))
}
