//! Error types and axum `IntoResponse` implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A required secret is not configured. Always denies.
  #[error("server misconfigured: {0}")]
  Configuration(String),
  #[error("unauthorized")]
  Unauthorized,
  #[error("not found: {0}")]
  NotFound(String),
  #[error("conflict: {0}")]
  Conflict(String),
  #[error("bad request: {0}")]
  BadRequest(String),
  /// The audit trail could not be written, so the action it guards fails.
  #[error("audit write failed: {0}")]
  AuditWrite(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Classify a backend error, surfacing missing records as 404 and
  /// backward lifecycle moves as 409.
  pub fn from_store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    let mut cur: Option<&(dyn std::error::Error + 'static)> = Some(&e);
    while let Some(err) = cur {
      if let Some(core) = err.downcast_ref::<docket_core::Error>() {
        if let docket_core::Error::DecisionNotFound(id) = core {
          return Error::NotFound(format!("decision {id} not found"));
        }
        if core.is_lifecycle_conflict() {
          return Error::Conflict(core.to_string());
        }
      }
      cur = err.source();
    }
    Error::Store(Box::new(e))
  }

  pub fn audit<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Error::AuditWrite(Box::new(e))
  }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = match &self {
      Error::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
      Error::Unauthorized => StatusCode::UNAUTHORIZED,
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::Conflict(_) => StatusCode::CONFLICT,
      Error::BadRequest(_) => StatusCode::BAD_REQUEST,
      Error::AuditWrite(_) | Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if let Error::Unauthorized = self {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Bearer realm=\"docket\""),
      );
    }
    res
  }
}
