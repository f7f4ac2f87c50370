//! The authority gate: bearer-token extractor for the API and session-cookie
//! middleware for the dashboard.
//!
//! Both fail closed. A missing secret is a server misconfiguration and denies
//! every request; it is never read as "no auth required".

use axum::{
  extract::{FromRequestParts, Request},
  http::{HeaderMap, header, request::Parts},
  middleware::Next,
  response::{IntoResponse, Redirect, Response},
};

use crate::{AppState, Backend, ServerConfig, error::Error};

/// Name of the dashboard session cookie.
pub const SESSION_COOKIE: &str = "docket_session";

/// The only accepted session cookie value.
pub const SESSION_MARKER: &str = "valid";

pub const LOGIN_PATH: &str = "/login";
pub const LOGOUT_PATH: &str = "/logout";

/// Secrets the gate checks against, built once at startup.
#[derive(Clone, Default)]
pub struct GateConfig {
  /// Shared bearer token for `/api` routes.
  pub export_secret:           Option<String>,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub dashboard_password_hash: Option<String>,
}

impl GateConfig {
  /// Blank values count as unset.
  pub fn from_config(config: &ServerConfig) -> Self {
    let non_blank = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());
    Self {
      export_secret:           non_blank(&config.export_secret),
      dashboard_password_hash: non_blank(&config.dashboard_password_hash),
    }
  }
}

/// Zero-size marker: present in the handler means the request carried the
/// configured bearer token.
pub struct Authorized;

/// Check the `Authorization: Bearer <token>` header against `gate`.
pub fn authorize(headers: &HeaderMap, gate: &GateConfig) -> Result<(), Error> {
  let secret = gate.export_secret.as_deref().ok_or_else(|| {
    Error::Configuration("export secret is not configured".to_string())
  })?;

  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(Error::Unauthorized)?;

  let token = header_val
    .strip_prefix("Bearer ")
    .filter(|t| !t.is_empty())
    .ok_or(Error::Unauthorized)?;

  if token != secret {
    return Err(Error::Unauthorized);
  }

  Ok(())
}

impl<S: Backend> FromRequestParts<AppState<S>> for Authorized {
  type Rejection = Error;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    authorize(&parts.headers, &state.gate).inspect_err(|e| {
      tracing::warn!(path = %parts.uri.path(), error = %e, "bearer gate rejected request");
    })?;
    Ok(Authorized)
  }
}

// ─── Session cookie ───────────────────────────────────────────────────────────

/// Whether any `Cookie` header carries `docket_session=valid`.
pub fn has_valid_session(headers: &HeaderMap) -> bool {
  headers
    .get_all(header::COOKIE)
    .iter()
    .filter_map(|v| v.to_str().ok())
    .flat_map(|v| v.split(';'))
    .filter_map(|pair| pair.trim().split_once('='))
    .any(|(name, value)| name == SESSION_COOKIE && value == SESSION_MARKER)
}

/// Percent-encode a return target for use as the `next` query value.
pub fn encode_next(target: &str) -> String {
  url::form_urlencoded::byte_serialize(target.as_bytes()).collect()
}

/// Middleware for dashboard routes. Requests without a valid session are
/// redirected to the login page with `next` set to the original path and
/// query. The login and logout routes are exempt.
pub async fn require_session(req: Request, next: Next) -> Response {
  let path = req.uri().path();
  if path == LOGIN_PATH || path == LOGOUT_PATH || has_valid_session(req.headers()) {
    return next.run(req).await;
  }

  let target = req.uri().path_and_query().map_or(path, |pq| pq.as_str());
  tracing::warn!(%target, "session gate redirecting to login");
  Redirect::to(&format!("{LOGIN_PATH}?next={}", encode_next(target))).into_response()
}
