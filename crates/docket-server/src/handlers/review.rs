//! Review snapshot, export and webhook handlers.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/api/review` | Current [`ReviewSnapshot`] |
//! | `GET`  | `/api/review/:id/export` | One candidate; audited |
//! | `POST` | `/api/review/:id/webhook` | Logged delivery; audited |
//! | `GET`  | `/dashboard` | Same snapshot, behind the session cookie |

use axum::{
  Json,
  extract::{Path, State},
};
use chrono::{DateTime, Utc};
use docket_core::{
  audit::{AuditAction, NewAuditEvent},
  snapshot::{ReviewCandidate, ReviewSnapshot},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::current_snapshot;
use crate::{AppState, Backend, auth::Authorized, error::Error};

/// Body of `GET /api/review/:id/export`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewExport {
  pub exported_at: DateTime<Utc>,
  pub review:      ReviewCandidate,
}

/// Body of `POST /api/review/:id/webhook`.
#[derive(Debug, Serialize, Deserialize)]
pub struct WebhookDelivery {
  pub delivered:    bool,
  pub review_id:    Uuid,
  pub delivered_at: DateTime<Utc>,
}

/// Find `id` in the current snapshot.
async fn candidate<S: Backend>(
  state: &AppState<S>,
  id: Uuid,
) -> Result<(ReviewSnapshot, ReviewCandidate), Error> {
  let snapshot = current_snapshot(state).await?;
  let found = snapshot
    .find(id)
    .cloned()
    .ok_or_else(|| Error::NotFound(format!("review {id} not in current snapshot")))?;
  Ok((snapshot, found))
}

/// `GET /api/review`
pub async fn current<S: Backend>(
  _auth: Authorized,
  State(state): State<AppState<S>>,
) -> Result<Json<ReviewSnapshot>, Error> {
  Ok(Json(current_snapshot(&state).await?))
}

/// `GET /dashboard`
pub async fn dashboard<S: Backend>(
  State(state): State<AppState<S>>,
) -> Result<Json<ReviewSnapshot>, Error> {
  Ok(Json(current_snapshot(&state).await?))
}

/// `GET /api/review/:id/export`
///
/// The export is recorded in the audit log before the payload is returned;
/// if the append fails, so does the export.
pub async fn export<S: Backend>(
  _auth: Authorized,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<ReviewExport>, Error> {
  let (snapshot, review) = candidate(&state, id).await?;

  state
    .store
    .append(
      NewAuditEvent::new(id, AuditAction::ExportRequested)
        .with("snapshot_id", snapshot.snapshot_id.as_str())
        .with("priority", review.priority),
    )
    .await
    .map_err(Error::audit)?;

  Ok(Json(ReviewExport { exported_at: Utc::now(), review }))
}

/// `POST /api/review/:id/webhook`
///
/// Delivery is logged rather than transmitted.
pub async fn webhook<S: Backend>(
  _auth: Authorized,
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<WebhookDelivery>, Error> {
  let (snapshot, review) = candidate(&state, id).await?;

  state
    .store
    .append(
      NewAuditEvent::new(id, AuditAction::WebhookTriggered)
        .with("snapshot_id", snapshot.snapshot_id.as_str())
        .with("priority", review.priority),
    )
    .await
    .map_err(Error::audit)?;

  let delivered_at = Utc::now();
  tracing::info!(
    review_id = %id,
    priority = review.priority,
    needs_review = review.needs_review,
    "review webhook delivered"
  );

  Ok(Json(WebhookDelivery { delivered: true, review_id: id, delivered_at }))
}
