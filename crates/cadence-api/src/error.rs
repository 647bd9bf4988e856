//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body has the shape `{"error": "<message>", "code": "<CODE>"}`.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use cadence_core::{Coded, ErrorCode};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// Refused because of current state. `code` is either `CONFLICT` or
  /// `NEEDS_CONFIRMATION`.
  #[error("conflict: {message}")]
  Conflict { code: ErrorCode, message: String },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a store error by its [`ErrorCode`].
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Coded + Send + Sync + 'static,
  {
    match err.code() {
      ErrorCode::NotFound => ApiError::NotFound(err.to_string()),
      ErrorCode::Validation => ApiError::BadRequest(err.to_string()),
      code @ (ErrorCode::Conflict | ErrorCode::NeedsConfirmation) => {
        ApiError::Conflict { code, message: err.to_string() }
      }
      ErrorCode::Internal => ApiError::Store(Box::new(err)),
    }
  }

  pub fn code(&self) -> Option<ErrorCode> {
    match self {
      ApiError::Unauthorized => None,
      ApiError::NotFound(_) => Some(ErrorCode::NotFound),
      ApiError::BadRequest(_) => Some(ErrorCode::Validation),
      ApiError::Conflict { code, .. } => Some(*code),
      ApiError::Store(_) => Some(ErrorCode::Internal),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let code = self.code();
    let (status, message) = match self {
      ApiError::Unauthorized => {
        let mut res = (
          StatusCode::UNAUTHORIZED,
          Json(json!({ "error": "unauthorized" })),
        )
          .into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"cadence\""),
        );
        return res;
      }
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
      ApiError::Conflict { message, .. } => (StatusCode::CONFLICT, message),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
      }
    };
    (status, Json(json!({ "error": message, "code": code }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
    let resp = err.into_response();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
  }

  #[tokio::test]
  async fn needs_confirmation_maps_to_409_with_code() {
    let err = ApiError::store(cadence_core::Error::NeedsConfirmation { linked_records: 3 });
    let (status, body) = body_json(err).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "NEEDS_CONFIRMATION");
  }

  #[tokio::test]
  async fn validation_maps_to_400() {
    let err = ApiError::store(cadence_core::Error::Validation("bad".into()));
    let (status, body) = body_json(err).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION");
  }

  #[tokio::test]
  async fn internal_errors_are_not_leaked() {
    let err = ApiError::Store(Box::new(std::io::Error::other("disk on fire")));
    let (status, body) = body_json(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "INTERNAL");
    assert!(!body["error"].as_str().unwrap().contains("disk"));
  }

  #[tokio::test]
  async fn unauthorized_sets_challenge_header() {
    let resp = ApiError::Unauthorized.into_response();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }
}
