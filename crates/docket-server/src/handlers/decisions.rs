//! Handlers for `/api/decisions` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/decisions` | All decisions with derived status |
//! | `POST` | `/api/decisions` | Body: [`CreateBody`]; returns 201 |
//! | `GET`  | `/api/decisions/:id` | 404 if not found |
//! | `POST` | `/api/decisions/:id/snapshots` | Body: `{"note":"..."}` (optional) |
//! | `POST` | `/api/decisions/:id/lock` | Locks the latest snapshot |
//! | `POST` | `/api/decisions/:id/archive` | Terminal |
//!
//! Every write commits together with its audit event in the store; if the
//! event cannot be written the change is rolled back and the request fails.

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use docket_core::{
  decision::{Decision, Impact, NewDecision},
  lifecycle::ResolvedDecision,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{AppState, Backend, auth::Authorized, error::Error};

async fn fetch<S: Backend>(state: &AppState<S>, id: Uuid) -> Result<Decision, Error> {
  state
    .store
    .get_decision(id)
    .await
    .map_err(Error::from_store)?
    .ok_or_else(|| Error::NotFound(format!("decision {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /api/decisions`
pub async fn list<S: Backend>(
  _auth: Authorized,
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<ResolvedDecision>>, Error> {
  let decisions = state.store.list_decisions().await.map_err(Error::from_store)?;
  Ok(Json(decisions.into_iter().map(ResolvedDecision::from).collect()))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /api/decisions/:id`
pub async fn get_one<S: Backend>(
  _auth: Authorized,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ResolvedDecision>, Error> {
  Ok(Json(fetch(&state, id).await?.into()))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /api/decisions`.
#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub title:      String,
  pub area:       String,
  pub impact:     Impact,
  /// Defaults to now.
  pub decided_at: Option<DateTime<Utc>>,
}

/// `POST /api/decisions`, returning 201 and the stored decision.
pub async fn create<S: Backend>(
  _auth: Authorized,
  State(state): State<AppState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, Error> {
  if body.title.trim().is_empty() {
    return Err(Error::BadRequest("title must not be empty".to_string()));
  }

  let recorded = state
    .store
    .record_decision(NewDecision {
      title:      body.title,
      area:       body.area,
      impact:     body.impact,
      decided_at: body.decided_at,
    })
    .await
    .map_err(Error::from_store)?;

  tracing::info!(decision_id = %recorded.value.id, seq = recorded.event.seq, "decision recorded");
  Ok((StatusCode::CREATED, Json(ResolvedDecision::from(recorded.value))))
}

// ─── Lifecycle ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct SnapshotBody {
  pub note: Option<String>,
}

/// `POST /api/decisions/:id/snapshots`; the body is optional.
pub async fn snapshot<S: Backend>(
  _auth: Authorized,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
  body: Option<Json<SnapshotBody>>,
) -> Result<impl IntoResponse, Error> {
  let body = body.map(|Json(b)| b).unwrap_or_default();

  state
    .store
    .append_snapshot(id, body.note)
    .await
    .map_err(Error::from_store)?;

  Ok((StatusCode::CREATED, Json(ResolvedDecision::from(fetch(&state, id).await?))))
}

/// `POST /api/decisions/:id/lock`
pub async fn lock<S: Backend>(
  _auth: Authorized,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ResolvedDecision>, Error> {
  state
    .store
    .lock_latest_snapshot(id)
    .await
    .map_err(Error::from_store)?;

  Ok(Json(fetch(&state, id).await?.into()))
}

/// `POST /api/decisions/:id/archive`
pub async fn archive<S: Backend>(
  _auth: Authorized,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ResolvedDecision>, Error> {
  let archived = state.store.archive(id).await.map_err(Error::from_store)?;
  Ok(Json(archived.value.into()))
}
