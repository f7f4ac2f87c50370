//! HTTP layer for Docket.
//!
//! Exposes an axum [`Router`] serving the review snapshot, audited exports and
//! webhook deliveries, the decision lifecycle API and the audit log, backed by
//! any store implementing both [`DecisionStore`] and [`AuditLog`].
//!
//! `/api/*` routes sit behind the bearer gate; `/dashboard` sits behind the
//! session cookie.

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router, middleware,
  routing::{get, post},
};
use docket_core::store::{AuditLog, DecisionStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::GateConfig;
use handlers::{audit, decisions, review, session};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `DOCKET_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                    String,
  pub port:                    u16,
  pub store_path:              PathBuf,
  /// Bearer token for `/api`. Unset means every API call is refused.
  pub export_secret:           Option<String>,
  /// argon2 PHC string for the dashboard login. Unset means login is refused.
  pub dashboard_password_hash: Option<String>,
}

// ─── Application state ────────────────────────────────────────────────────────

/// A storage backend usable by the server.
pub trait Backend: DecisionStore + AuditLog + Clone + Send + Sync + 'static {}

impl<T> Backend for T where T: DecisionStore + AuditLog + Clone + Send + Sync + 'static {}

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: Backend> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
  pub gate:   Arc<GateConfig>,
}

impl<S: Backend> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    let gate = GateConfig::from_config(&config);
    Self {
      store:  Arc::new(store),
      config: Arc::new(config),
      gate:   Arc::new(gate),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the axum [`Router`] for the Docket server.
pub fn router<S: Backend>(state: AppState<S>) -> Router {
  let api = Router::new()
    // Review
    .route("/review", get(review::current::<S>))
    .route("/review/{id}/export", get(review::export::<S>))
    .route("/review/{id}/webhook", post(review::webhook::<S>))
    // Decisions
    .route("/decisions", get(decisions::list::<S>).post(decisions::create::<S>))
    .route("/decisions/{id}", get(decisions::get_one::<S>))
    .route("/decisions/{id}/snapshots", post(decisions::snapshot::<S>))
    .route("/decisions/{id}/lock", post(decisions::lock::<S>))
    .route("/decisions/{id}/archive", post(decisions::archive::<S>))
    // Audit
    .route("/decisions/{id}/audit", get(audit::for_decision::<S>))
    .route("/audit", get(audit::replay::<S>));

  let dashboard = Router::new()
    .route("/dashboard", get(review::dashboard::<S>))
    .route("/login", get(session::login_form).post(session::login::<S>))
    .route("/logout", get(session::logout).post(session::logout))
    .layer(middleware::from_fn(auth::require_session));

  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api)
    .merge(dashboard)
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::OnceLock;

  use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
  };
  use chrono::{Duration, Utc};
  use docket_core::{
    audit::{AuditAction, AuditEvent, NewAuditEvent},
    decision::{Decision, NewDecision, Snapshot},
    snapshot::ReviewSnapshot,
    store::Audited,
  };
  use docket_store_sqlite::SqliteStore;
  use rand_core::OsRng;
  use serde_json::{Value, json};
  use tower::ServiceExt as _;
  use uuid::Uuid;

  const SECRET: &str = "s3cr3t";
  const PASSWORD: &str = "hunter2";

  fn password_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH
      .get_or_init(|| {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
          .hash_password(PASSWORD.as_bytes(), &salt)
          .unwrap()
          .to_string()
      })
      .clone()
  }

  fn config(secret: Option<&str>, hash: Option<String>) -> ServerConfig {
    ServerConfig {
      host:                    "127.0.0.1".to_string(),
      port:                    8080,
      store_path:              PathBuf::from(":memory:"),
      export_secret:           secret.map(str::to_owned),
      dashboard_password_hash: hash,
    }
  }

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState::new(store, config(Some(SECRET), None))
  }

  async fn seed(state: &AppState<SqliteStore>, area: &str, impact: &str, age_days: i64) -> Decision {
    let mut input = NewDecision::new(format!("{area} {impact} {age_days}d"), area, impact);
    input.decided_at = Some(Utc::now() - Duration::days(age_days));
    state.store.record_decision(input).await.unwrap().value
  }

  async fn send<S: Backend>(
    state:   AppState<S>,
    method:  &str,
    uri:     &str,
    headers: Vec<(header::HeaderName, &str)>,
    body:    Body,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    router(state).oneshot(builder.body(body).unwrap()).await.unwrap()
  }

  async fn api<S: Backend>(state: AppState<S>, method: &str, uri: &str) -> Response {
    let auth = format!("Bearer {SECRET}");
    send(state, method, uri, vec![(header::AUTHORIZATION, auth.as_str())], Body::empty()).await
  }

  async fn api_json<S: Backend>(state: AppState<S>, method: &str, uri: &str, body: Value) -> Response {
    let auth = format!("Bearer {SECRET}");
    send(
      state,
      method,
      uri,
      vec![
        (header::AUTHORIZATION, auth.as_str()),
        (header::CONTENT_TYPE, "application/json"),
      ],
      Body::from(body.to_string()),
    )
    .await
  }

  async fn json_body(resp: Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
  }

  fn location(resp: &Response) -> &str {
    resp.headers().get(header::LOCATION).unwrap().to_str().unwrap()
  }

  // ── Bearer gate ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_is_ungated() {
    let state = make_state().await;
    let resp = send(state, "GET", "/health", vec![], Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn correct_token_passes_gate() {
    let state = make_state().await;
    let resp = api(state, "GET", "/api/review").await;
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn wrong_token_returns_401() {
    let state = make_state().await;
    let resp = send(
      state,
      "GET",
      "/api/review",
      vec![(header::AUTHORIZATION, "Bearer wrong")],
      Body::empty(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(resp.headers().contains_key(header::WWW_AUTHENTICATE));
  }

  #[tokio::test]
  async fn every_api_route_requires_the_token() {
    let state = make_state().await;
    let d = seed(&state, "OPS", "HIGH", 40).await;
    let routes = [
      ("GET", "/api/review".to_string()),
      ("GET", format!("/api/review/{}/export", d.id)),
      ("POST", format!("/api/review/{}/webhook", d.id)),
      ("GET", "/api/decisions".to_string()),
      ("POST", "/api/decisions".to_string()),
      ("GET", format!("/api/decisions/{}", d.id)),
      ("POST", format!("/api/decisions/{}/snapshots", d.id)),
      ("POST", format!("/api/decisions/{}/lock", d.id)),
      ("POST", format!("/api/decisions/{}/archive", d.id)),
      ("GET", format!("/api/decisions/{}/audit", d.id)),
      ("GET", "/api/audit".to_string()),
    ];
    for (method, uri) in routes {
      let resp = send(state.clone(), method, &uri, vec![], Body::empty()).await;
      assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
    }

    // Nothing slipped through; the seed's own creation is the only event.
    assert_eq!(state.store.replay().await.unwrap().len(), 1);
    let cur = state.store.get_decision(d.id).await.unwrap().unwrap();
    assert!(cur.snapshots.is_empty() && cur.archived_at.is_none());
  }

  #[tokio::test]
  async fn unset_secret_is_a_server_error_not_a_pass() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = AppState::new(store, config(None, None));
    let resp = api(state, "GET", "/api/review").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  // ── Review snapshot ─────────────────────────────────────────────────────────

  #[tokio::test]
  async fn review_ranks_candidates() {
    let state = make_state().await;
    let sales = seed(&state, "SALES", "HIGH", 100).await;
    let product = seed(&state, "PRODUCT", "HIGH", 40).await;
    seed(&state, "PRODUCT", "LOW", 2).await;

    let resp = api(state, "GET", "/api/review").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let snap: ReviewSnapshot = serde_json::from_value(json_body(resp).await).unwrap();

    assert_eq!(snap.recent.len(), 2);
    assert_eq!(snap.recent[0].decision_id, product.id);
    assert_eq!(snap.recent[0].priority, 190);
    assert!(snap.recent[0].needs_review);
    assert_eq!(snap.recent[1].decision_id, sales.id);
    assert_eq!(snap.recent[1].priority, 80);
    assert!(!snap.recent[1].needs_review);
  }

  // ── Export ──────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn export_returns_candidate_and_audits_once() {
    let state = make_state().await;
    let d = seed(&state, "PRODUCT", "HIGH", 40).await;

    let resp = api(state.clone(), "GET", &format!("/api/review/{}/export", d.id)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["review"]["decision_id"], d.id.to_string());
    assert_eq!(body["review"]["priority"], 190);
    assert_eq!(body["review"]["status"], "recorded");
    assert!(body["exported_at"].is_string());

    let events = state.store.load(d.id).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].action, AuditAction::Created);
    assert_eq!(events[1].action, AuditAction::ExportRequested);
  }

  #[tokio::test]
  async fn export_of_absent_review_is_404_without_audit() {
    let state = make_state().await;
    let fresh = seed(&state, "PRODUCT", "LOW", 1).await;
    let before = state.store.replay().await.unwrap();

    for id in [Uuid::new_v4(), fresh.id] {
      let resp = api(state.clone(), "GET", &format!("/api/review/{id}/export")).await;
      assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
    assert_eq!(state.store.replay().await.unwrap(), before);
  }

  // ── Webhook ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn webhook_reports_delivery_and_audits() {
    let state = make_state().await;
    let d = seed(&state, "OPS", "HIGH", 31).await;

    let resp = api(state.clone(), "POST", &format!("/api/review/{}/webhook", d.id)).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = json_body(resp).await;
    assert_eq!(body["delivered"], true);
    assert_eq!(body["review_id"], d.id.to_string());
    assert!(body["delivered_at"].is_string());

    let events = state.store.load(d.id).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[1].action, AuditAction::WebhookTriggered);
  }

  #[tokio::test]
  async fn webhook_for_unknown_review_is_404() {
    let state = make_state().await;
    let resp = api(state, "POST", &format!("/api/review/{}/webhook", Uuid::new_v4())).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  // ── Decision lifecycle ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn lifecycle_over_http_is_audited() {
    let state = make_state().await;

    let resp = api_json(
      state.clone(),
      "POST",
      "/api/decisions",
      json!({ "title": "Sunset v1 API", "area": "PRODUCT", "impact": "HIGH" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let created = json_body(resp).await;
    assert_eq!(created["status"], "recorded");
    let id = created["id"].as_str().unwrap().to_string();

    let resp = api(state.clone(), "POST", &format!("/api/decisions/{id}/snapshots")).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(json_body(resp).await["status"], "snapshotted");

    let resp = api(state.clone(), "POST", &format!("/api/decisions/{id}/lock")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["status"], "locked");

    let resp = api(state.clone(), "POST", &format!("/api/decisions/{id}/archive")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(json_body(resp).await["status"], "archived");

    let resp = api(state.clone(), "GET", &format!("/api/decisions/{id}/audit")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let events: Vec<AuditEvent> = serde_json::from_value(json_body(resp).await).unwrap();
    let trail: Vec<(AuditAction, Option<String>)> = events
      .iter()
      .map(|e| {
        let to = e.metadata.as_ref().and_then(|m| m.get("to")).and_then(|v| v.as_str());
        (e.action, to.map(str::to_owned))
      })
      .collect();
    assert_eq!(trail, vec![
      (AuditAction::Created, None),
      (AuditAction::StatusUpdated, Some("snapshotted".into())),
      (AuditAction::StatusUpdated, Some("locked".into())),
      (AuditAction::StatusUpdated, Some("archived".into())),
    ]);
  }

  #[tokio::test]
  async fn snapshot_with_note_body() {
    let state = make_state().await;
    let d = seed(&state, "OPS", "LOW", 1).await;
    let resp = api_json(
      state.clone(),
      "POST",
      &format!("/api/decisions/{}/snapshots", d.id),
      json!({ "note": "quarterly review" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body = json_body(resp).await;
    assert_eq!(body["snapshots"][0]["note"], "quarterly review");
  }

  #[tokio::test]
  async fn backward_moves_are_conflicts() {
    let state = make_state().await;
    let d = seed(&state, "OPS", "HIGH", 1).await;

    let resp = api(state.clone(), "POST", &format!("/api/decisions/{}/lock", d.id)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    api(state.clone(), "POST", &format!("/api/decisions/{}/archive", d.id)).await;
    let resp = api(state.clone(), "POST", &format!("/api/decisions/{}/snapshots", d.id)).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // Only the creation and the archive are on record; rejected moves leave
    // no trail.
    let actions: Vec<_> =
      state.store.load(d.id).await.unwrap().into_iter().map(|e| e.action).collect();
    assert_eq!(actions, vec![AuditAction::Created, AuditAction::StatusUpdated]);
  }

  #[tokio::test]
  async fn unknown_decision_is_404() {
    let state = make_state().await;
    let id = Uuid::new_v4();
    for (method, uri) in [
      ("GET", format!("/api/decisions/{id}")),
      ("POST", format!("/api/decisions/{id}/lock")),
      ("POST", format!("/api/decisions/{id}/archive")),
    ] {
      let resp = api(state.clone(), method, &uri).await;
      assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{method} {uri}");
    }
  }

  #[tokio::test]
  async fn blank_title_is_rejected() {
    let state = make_state().await;
    let resp = api_json(
      state,
      "POST",
      "/api/decisions",
      json!({ "title": " ", "area": "OPS", "impact": "LOW" }),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
  }

  // ── Audit failure ───────────────────────────────────────────────────────────

  #[derive(Debug, thiserror::Error)]
  #[error("audit storage offline")]
  struct Offline;

  /// Delegates decisions to SQLite; every standalone audit append fails.
  #[derive(Clone)]
  struct FailingAudit(SqliteStore);

  impl DecisionStore for FailingAudit {
    type Error = docket_store_sqlite::Error;
    async fn record_decision(&self, input: NewDecision) -> Result<Audited<Decision>, Self::Error> { self.0.record_decision(input).await }
    async fn get_decision(&self, id: Uuid) -> Result<Option<Decision>, Self::Error> { self.0.get_decision(id).await }
    async fn list_decisions(&self) -> Result<Vec<Decision>, Self::Error> { self.0.list_decisions().await }
    async fn append_snapshot(&self, id: Uuid, note: Option<String>) -> Result<Audited<Snapshot>, Self::Error> { self.0.append_snapshot(id, note).await }
    async fn lock_latest_snapshot(&self, id: Uuid) -> Result<Audited<Snapshot>, Self::Error> { self.0.lock_latest_snapshot(id).await }
    async fn archive(&self, id: Uuid) -> Result<Audited<Decision>, Self::Error> { self.0.archive(id).await }
  }

  impl AuditLog for FailingAudit {
    type Error = Offline;
    async fn append(&self, _: NewAuditEvent) -> Result<AuditEvent, Self::Error> { Err(Offline) }
    async fn load(&self, _: Uuid) -> Result<Vec<AuditEvent>, Self::Error> { Ok(vec![]) }
    async fn replay(&self) -> Result<Vec<AuditEvent>, Self::Error> { Ok(vec![]) }
  }

  #[tokio::test]
  async fn failed_audit_write_fails_the_export() {
    let inner = SqliteStore::open_in_memory().await.unwrap();
    let mut input = NewDecision::new("x", "PRODUCT", "HIGH");
    input.decided_at = Some(Utc::now() - Duration::days(40));
    let d = inner.record_decision(input).await.unwrap().value;

    let state = AppState::new(FailingAudit(inner), config(Some(SECRET), None));
    for (method, uri) in [
      ("GET", format!("/api/review/{}/export", d.id)),
      ("POST", format!("/api/review/{}/webhook", d.id)),
    ] {
      let resp = api(state.clone(), method, &uri).await;
      assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "{method} {uri}");
      let body = json_body(resp).await;
      assert!(body["error"].as_str().unwrap().contains("audit"), "{body}");
    }
  }

  /// A store in a scratch file, so a second connection can take the audit
  /// table offline underneath the server.
  struct ScratchDb(PathBuf);

  impl ScratchDb {
    fn new() -> Self {
      Self(std::env::temp_dir().join(format!("docket-{}.sqlite3", Uuid::new_v4())))
    }

    fn set_audit_offline(&self, offline: bool) {
      let conn = rusqlite::Connection::open(&self.0).unwrap();
      let sql = if offline {
        "CREATE TRIGGER audit_offline BEFORE INSERT ON audit_events
         BEGIN SELECT RAISE(ABORT, 'audit storage offline'); END;"
      } else {
        "DROP TRIGGER audit_offline;"
      };
      conn.execute_batch(sql).unwrap();
    }
  }

  impl Drop for ScratchDb {
    fn drop(&mut self) {
      for suffix in ["", "-wal", "-shm"] {
        let mut path = self.0.clone().into_os_string();
        path.push(suffix);
        let _ = std::fs::remove_file(path);
      }
    }
  }

  #[tokio::test]
  async fn failed_audit_write_rolls_back_create() {
    let db = ScratchDb::new();
    let state = AppState::new(SqliteStore::open(&db.0).await.unwrap(), config(Some(SECRET), None));
    let body = json!({ "title": "Sunset v1 API", "area": "PRODUCT", "impact": "HIGH" });

    db.set_audit_offline(true);
    let resp = api_json(state.clone(), "POST", "/api/decisions", body.clone()).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(state.store.list_decisions().await.unwrap().is_empty());
    assert!(state.store.replay().await.unwrap().is_empty());

    db.set_audit_offline(false);
    let resp = api_json(state.clone(), "POST", "/api/decisions", body).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(state.store.list_decisions().await.unwrap().len(), 1);
    assert_eq!(state.store.replay().await.unwrap().len(), 1);
  }

  #[tokio::test]
  async fn failed_audit_write_rolls_back_lifecycle_moves() {
    let db = ScratchDb::new();
    let state = AppState::new(SqliteStore::open(&db.0).await.unwrap(), config(Some(SECRET), None));
    let d = seed(&state, "OPS", "HIGH", 1).await;
    let resp = api(state.clone(), "POST", &format!("/api/decisions/{}/snapshots", d.id)).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let before = state.store.get_decision(d.id).await.unwrap().unwrap();
    let trail = state.store.replay().await.unwrap();

    db.set_audit_offline(true);
    for action in ["snapshots", "lock", "archive"] {
      let uri = format!("/api/decisions/{}/{action}", d.id);
      let resp = api(state.clone(), "POST", &uri).await;
      assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR, "{uri}");
      assert_eq!(state.store.get_decision(d.id).await.unwrap().unwrap(), before, "{uri}");
      assert_eq!(state.store.replay().await.unwrap(), trail, "{uri}");
    }

    // A retry is not mistaken for a repeat of a move that never happened.
    db.set_audit_offline(false);
    for (action, status) in [("lock", "locked"), ("archive", "archived")] {
      let uri = format!("/api/decisions/{}/{action}", d.id);
      let resp = api(state.clone(), "POST", &uri).await;
      assert_eq!(resp.status(), StatusCode::OK, "{uri}");
      assert_eq!(json_body(resp).await["status"], status);
    }

    let events = state.store.load(d.id).await.unwrap();
    let moves: Vec<(&str, &str)> = events[2..]
      .iter()
      .map(|e| {
        let m = e.metadata.as_ref().unwrap();
        (m["from"].as_str().unwrap(), m["to"].as_str().unwrap())
      })
      .collect();
    assert_eq!(moves, vec![("snapshotted", "locked"), ("locked", "archived")]);
  }

  // ── Session gate ────────────────────────────────────────────────────────────

  async fn session_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState::new(store, config(Some(SECRET), Some(password_hash())))
  }

  #[tokio::test]
  async fn dashboard_without_session_redirects_to_login() {
    let state = session_state().await;
    let resp = send(state, "GET", "/dashboard", vec![], Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login?next=%2Fdashboard");
  }

  #[tokio::test]
  async fn dashboard_redirect_keeps_query() {
    let state = session_state().await;
    let resp = send(state.clone(), "GET", "/dashboard?tab=ops&sort=age", vec![], Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    let to_login = location(&resp).to_owned();
    assert_eq!(to_login, "/login?next=%2Fdashboard%3Ftab%3Dops%26sort%3Dage");

    // The login form carries the full target into its hidden field.
    let resp = send(state.clone(), "GET", &to_login, vec![], Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("value=\"/dashboard?tab=ops&amp;sort=age\""), "{html}");

    let next = "next=%2Fdashboard%3Ftab%3Dops%26sort%3Dage";
    let resp = post_login(state.clone(), &format!("password=nope&{next}")).await;
    assert_eq!(location(&resp), "/login?error=1&next=%2Fdashboard%3Ftab%3Dops%26sort%3Dage");

    let resp = post_login(state, &format!("password={PASSWORD}&{next}")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard?tab=ops&sort=age");
  }

  #[tokio::test]
  async fn dashboard_with_wrong_marker_redirects() {
    let state = session_state().await;
    let resp = send(
      state,
      "GET",
      "/dashboard",
      vec![(header::COOKIE, "docket_session=forged")],
      Body::empty(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
  }

  #[tokio::test]
  async fn dashboard_with_session_serves_snapshot() {
    let state = session_state().await;
    seed(&state, "OPS", "HIGH", 45).await;
    let resp = send(
      state,
      "GET",
      "/dashboard",
      vec![(header::COOKIE, "docket_session=valid")],
      Body::empty(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let snap: ReviewSnapshot = serde_json::from_value(json_body(resp).await).unwrap();
    assert_eq!(snap.recent.len(), 1);
  }

  #[tokio::test]
  async fn login_and_logout_are_exempt() {
    let state = session_state().await;
    let resp = send(state.clone(), "GET", "/login?next=/dashboard", vec![], Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = send(state, "GET", "/logout", vec![], Body::empty()).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login");
    let cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"), "{cookie}");
  }

  async fn post_login(state: AppState<SqliteStore>, form: &str) -> Response {
    send(
      state,
      "POST",
      "/login",
      vec![(header::CONTENT_TYPE, "application/x-www-form-urlencoded")],
      Body::from(form.to_string()),
    )
    .await
  }

  #[tokio::test]
  async fn correct_password_sets_session_cookie() {
    let state = session_state().await;
    let resp = post_login(state, &format!("password={PASSWORD}&next=%2Fdashboard")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");
    let cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("docket_session=valid"), "{cookie}");
  }

  #[tokio::test]
  async fn wrong_password_returns_to_login() {
    let state = session_state().await;
    let resp = post_login(state, "password=nope&next=%2Fdashboard").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert!(location(&resp).starts_with("/login?error=1"));
    assert!(!resp.headers().contains_key(header::SET_COOKIE));
  }

  #[tokio::test]
  async fn login_with_control_characters_in_next() {
    let state = session_state().await;

    let resp = post_login(state.clone(), "password=nope&next=%2Fa%0Ab").await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/login?error=1&next=%2Fdashboard");
    assert!(!resp.headers().contains_key(header::SET_COOKIE));

    let resp = post_login(state, &format!("password={PASSWORD}&next=%2Fdashboard%0D")).await;
    assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&resp), "/dashboard");
    let cookie = resp.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cookie.starts_with("docket_session=valid"), "{cookie}");
  }

  #[tokio::test]
  async fn login_without_configured_hash_is_a_server_error() {
    let state = make_state().await;
    let resp = post_login(state, &format!("password={PASSWORD}")).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
