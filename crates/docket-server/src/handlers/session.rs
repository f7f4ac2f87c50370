//! Login and logout for the dashboard session cookie.
//!
//! Both routes sit behind [`require_session`](crate::auth::require_session)
//! but are exempt from it, so an expired session can never loop.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::{
  Form,
  extract::{Query, State},
  http::header,
  response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
  AppState, Backend,
  auth::{LOGIN_PATH, SESSION_COOKIE, SESSION_MARKER, encode_next},
  error::Error,
};

const DEFAULT_LANDING: &str = "/dashboard";

/// Only same-site absolute paths are followed after login. Control
/// characters are refused since they cannot appear in a `Location` header.
fn safe_next(next: Option<&str>) -> &str {
  match next {
    Some(p)
      if p.starts_with('/')
        && !p.starts_with("//")
        && !p.contains('\\')
        && !p.bytes().any(|b| b.is_ascii_control()) =>
    {
      p
    }
    _ => DEFAULT_LANDING,
  }
}

fn escape_attr(s: &str) -> String {
  s.replace('&', "&amp;")
    .replace('"', "&quot;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
}

#[derive(Debug, Deserialize)]
pub struct LoginParams {
  pub next:  Option<String>,
  pub error: Option<String>,
}

/// `GET /login`
pub async fn login_form(Query(params): Query<LoginParams>) -> Html<String> {
  let next = escape_attr(safe_next(params.next.as_deref()));
  let notice = if params.error.is_some() {
    "<p>Incorrect password.</p>"
  } else {
    ""
  };
  Html(format!(
    "<!doctype html><title>Docket sign-in</title>{notice}\
     <form method=\"post\" action=\"{LOGIN_PATH}\">\
     <input type=\"hidden\" name=\"next\" value=\"{next}\">\
     <input type=\"password\" name=\"password\" autofocus>\
     <button type=\"submit\">Sign in</button></form>"
  ))
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
  pub password: String,
  pub next:     Option<String>,
}

/// `POST /login`: sets the session cookie on a correct password.
pub async fn login<S: Backend>(
  State(state): State<AppState<S>>,
  Form(form): Form<LoginForm>,
) -> Result<Response, Error> {
  let hash = state.gate.dashboard_password_hash.as_deref().ok_or_else(|| {
    Error::Configuration("dashboard password is not configured".to_string())
  })?;

  let parsed = PasswordHash::new(hash).map_err(|e| {
    Error::Configuration(format!("dashboard password hash is invalid: {e}"))
  })?;

  let next = safe_next(form.next.as_deref());

  if Argon2::default()
    .verify_password(form.password.as_bytes(), &parsed)
    .is_err()
  {
    tracing::warn!("dashboard login failed");
    let retry = format!("{LOGIN_PATH}?error=1&next={}", encode_next(next));
    return Ok(Redirect::to(&retry).into_response());
  }

  let cookie = format!("{SESSION_COOKIE}={SESSION_MARKER}; Path=/; HttpOnly; SameSite=Lax");
  Ok(([(header::SET_COOKIE, cookie)], Redirect::to(next)).into_response())
}

/// `GET|POST /logout`: clears the session cookie.
pub async fn logout() -> Response {
  let cookie = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax");
  ([(header::SET_COOKIE, cookie)], Redirect::to(LOGIN_PATH)).into_response()
}
