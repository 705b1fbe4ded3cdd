//! Request extractors whose rejections use the service's error body

use axum::extract::{
    FromRequest, FromRequestParts, Request,
    rejection::{JsonRejection, PathRejection},
};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::AuthError;

/// [`axum::Json`] that rejects with [`AuthError::BadRequest`]
pub struct Json<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(JsonRejection::MissingJsonContentType(_)) => {
                Err(AuthError::bad_request("Invalid content type"))
            }
            Err(rejection) => Err(AuthError::BadRequest(rejection.body_text())),
        }
    }
}

/// [`axum::extract::Path`] that rejects with [`AuthError::BadRequest`]
pub struct Path<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        axum::extract::Path::<T>::from_request_parts(parts, state)
            .await
            .map(|axum::extract::Path(value)| Path(value))
            .map_err(|rejection: PathRejection| AuthError::BadRequest(rejection.body_text()))
    }
}
