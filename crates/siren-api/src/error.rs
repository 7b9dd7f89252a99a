//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("permission denied: {0}")]
  PermissionDenied(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::PermissionDenied(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}

/// Map a store-layer error onto an HTTP-meaningful [`ApiError`] by walking
/// its source chain for a domain error. Anything unrecognised stays a 500.
pub(crate) fn classify<E>(err: E) -> ApiError
where
  E: std::error::Error + Send + Sync + 'static,
{
  let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(err);
  let mut current: Option<&(dyn std::error::Error + 'static)> =
    Some(boxed.as_ref());
  while let Some(e) = current {
    if let Some(core) = e.downcast_ref::<siren_core::Error>() {
      return match core {
        siren_core::Error::NotFound { .. } => {
          ApiError::NotFound(core.to_string())
        }
        siren_core::Error::InvalidTransition { .. } => {
          ApiError::Conflict(core.to_string())
        }
        siren_core::Error::InvalidEvent(_)
        | siren_core::Error::Serialization(_) => {
          ApiError::BadRequest(core.to_string())
        }
      };
    }
    current = e.source();
  }
  ApiError::Store(boxed)
}
