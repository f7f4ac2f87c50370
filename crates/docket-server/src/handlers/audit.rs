//! Handlers for reading the audit log.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/decisions/:id/audit` | Events for one decision, in write order |
//! | `GET`  | `/api/audit` | The whole log, in write order |

use axum::{
  Json,
  extract::{Path, State},
};
use docket_core::audit::AuditEvent;
use uuid::Uuid;

use crate::{AppState, Backend, auth::Authorized, error::Error};

/// `GET /api/decisions/:id/audit`
pub async fn for_decision<S: Backend>(
  _auth: Authorized,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<AuditEvent>>, Error> {
  let events = state.store.load(id).await.map_err(Error::from_store)?;
  Ok(Json(events))
}

/// `GET /api/audit`
pub async fn replay<S: Backend>(
  _auth: Authorized,
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<AuditEvent>>, Error> {
  let events = state.store.replay().await.map_err(Error::from_store)?;
  Ok(Json(events))
}
