//! `/users` endpoints, all behind the access guard

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    error::AuthResult,
    extract,
    middleware::{CurrentUser, require_access_token, require_admin},
    models::{CreateUserRequest, MeResponse, ProfileResponse, UserResponse},
    state::AppState,
};

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(create_user).route_layer(middleware::from_fn(require_admin)),
        )
        .route("/me", get(me))
        .route("/:id/profile", get(profile))
        .route_layer(middleware::from_fn_with_state(state, require_access_token))
}

async fn create_user(
    State(state): State<AppState>,
    extract::Json(payload): extract::Json<CreateUserRequest>,
) -> AuthResult<impl IntoResponse> {
    let user = state.users.create(payload).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

async fn me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> AuthResult<Json<MeResponse>> {
    Ok(Json(state.users.me(user.id).await?))
}

async fn profile(
    State(state): State<AppState>,
    extract::Path(id): extract::Path<Uuid>,
) -> AuthResult<Json<ProfileResponse>> {
    Ok(Json(state.users.profile(id).await?))
}
