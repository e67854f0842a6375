//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  /// Missing and not-owned are deliberately the same response.
  #[error("not found or access denied")]
  NotFound,

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("{0}")]
  QuotaExceeded(String),

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("internal error: {0}")]
  Internal(#[source] BoxError),
}

impl From<glean_core::Error> for ApiError {
  fn from(e: glean_core::Error) -> Self {
    use glean_core::Error as E;
    match e {
      E::NotFoundOrDenied => ApiError::NotFound,
      E::QuotaExceeded(m) => ApiError::QuotaExceeded(m),
      E::UrlCount { .. } | E::UnknownVariant { .. } | E::InvalidMonth(_) => {
        ApiError::BadRequest(e.to_string())
      }
      other => ApiError::Internal(Box::new(other)),
    }
  }
}

impl From<glean_pipeline::Error> for ApiError {
  fn from(e: glean_pipeline::Error) -> Self {
    use glean_pipeline::Error as E;
    match e {
      E::Core(core) => core.into(),
      E::Store(inner) => ApiError::Store(inner),
      E::UnknownModel(_) => ApiError::BadRequest(e.to_string()),
      other => ApiError::Internal(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::NotFound => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::QuotaExceeded(_) => StatusCode::TOO_MANY_REQUESTS,
      ApiError::Store(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let message = match &self {
      ApiError::BadRequest(m) | ApiError::QuotaExceeded(m) => m.clone(),
      other => other.to_string(),
    };
    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"glean\""),
      );
    }
    res
  }
}
