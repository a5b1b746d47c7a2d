//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use cabinet_core::ErrorKind;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] cabinet_core::Error),

  #[error("not found: {0}")]
  NotFound(String),

  /// Malformed request body or query string.
  #[error("invalid request: {0}")]
  BadRequest(String),

  #[error("unauthorized: {0}")]
  Unauthorized(&'static str),

  /// Authenticated, but not as the owner of the resource.
  #[error("forbidden: {0}")]
  Forbidden(&'static str),

  #[error("internal error: {0}")]
  Internal(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn kind(&self) -> &'static str {
    match self {
      ApiError::Core(e) => match e.kind() {
        ErrorKind::NotFound => "not_found",
        ErrorKind::Validation => "validation",
        ErrorKind::Conflict => "conflict",
        ErrorKind::Internal => "internal",
      },
      ApiError::NotFound(_) => "not_found",
      ApiError::BadRequest(_) => "validation",
      ApiError::Unauthorized(_) => "unauthorized",
      ApiError::Forbidden(_) => "forbidden",
      ApiError::Internal(_) | ApiError::Store(_) => "internal",
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Core(e) => match e.kind() {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
      },
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
      ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::Internal(_) | ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { ApiError::BadRequest(rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status == StatusCode::INTERNAL_SERVER_ERROR {
      tracing::error!(error = %self, "request failed");
    }

    let body = Json(json!({ "kind": self.kind(), "error": self.to_string() }));
    let mut res = (status, body).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use cabinet_core::profile::UserId;

  use super::*;

  #[test]
  fn every_variant_has_a_status() {
    let cases = [
      (ApiError::from(cabinet_core::Error::ProfileNotFound(UserId::from("x"))), 404, "not_found"),
      (cabinet_core::Error::validation("email", "bad").into(), 422, "validation"),
      (cabinet_core::Error::EmailTaken("a@example.ru".into()).into(), 409, "conflict"),
      (ApiError::NotFound("plan".into()), 404, "not_found"),
      (ApiError::BadRequest("body".into()), 422, "validation"),
      (ApiError::Unauthorized("token"), 401, "unauthorized"),
      (ApiError::Forbidden("owner"), 403, "forbidden"),
      (ApiError::Internal("boom".into()), 500, "internal"),
      (ApiError::Store("disk".into()), 500, "internal"),
    ];
    for (err, status, kind) in cases {
      assert_eq!(err.status().as_u16(), status, "{err}");
      assert_eq!(err.kind(), kind, "{err}");
    }
  }

  #[test]
  fn unauthorized_carries_a_bearer_challenge() {
    let res = ApiError::Unauthorized("token").into_response();
    assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
    let res = ApiError::Forbidden("owner").into_response();
    assert!(res.headers().get(header::WWW_AUTHENTICATE).is_none());
  }
}
