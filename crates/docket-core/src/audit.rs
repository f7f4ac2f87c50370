//! Audit events, the append-only trail of lifecycle and access activity.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, decision::Decision, lifecycle::Status};

/// What happened to a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
  #[serde(rename = "created")]
  Created,
  #[serde(rename = "status_updated")]
  StatusUpdated,
  #[serde(rename = "review.export.requested")]
  ExportRequested,
  #[serde(rename = "review.webhook.triggered")]
  WebhookTriggered,
}

impl AuditAction {
  /// The wire and storage name; matches the serde renames above.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Created => "created",
      Self::StatusUpdated => "status_updated",
      Self::ExportRequested => "review.export.requested",
      Self::WebhookTriggered => "review.webhook.triggered",
    }
  }
}

impl FromStr for AuditAction {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "created" => Ok(Self::Created),
      "status_updated" => Ok(Self::StatusUpdated),
      "review.export.requested" => Ok(Self::ExportRequested),
      "review.webhook.triggered" => Ok(Self::WebhookTriggered),
      other => Err(Error::UnknownAuditAction(other.to_owned())),
    }
  }
}

impl std::fmt::Display for AuditAction {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A persisted audit record. Once written, no field is ever updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
  /// Position in the single global sequence; strictly increasing.
  pub seq:         i64,
  pub decision_id: Uuid,
  pub action:      AuditAction,
  /// Assigned by the log at write time; never earlier than the previous
  /// event's timestamp.
  pub recorded_at: DateTime<Utc>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub metadata:    Option<serde_json::Map<String, serde_json::Value>>,
}

/// Input to [`crate::store::AuditLog::append`]. `seq` and `recorded_at` are
/// always assigned by the log.
#[derive(Debug, Clone)]
pub struct NewAuditEvent {
  pub decision_id: Uuid,
  pub action:      AuditAction,
  pub metadata:    Option<serde_json::Map<String, serde_json::Value>>,
}

impl NewAuditEvent {
  pub fn new(decision_id: Uuid, action: AuditAction) -> Self {
    Self { decision_id, action, metadata: None }
  }

  /// Attach one metadata entry, creating the map on first use.
  pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
    self
      .metadata
      .get_or_insert_with(serde_json::Map::new)
      .insert(key.to_owned(), value.into());
    self
  }

  /// The `created` event for a freshly recorded decision.
  pub fn created(decision: &Decision) -> Self {
    Self::new(decision.id, AuditAction::Created)
      .with("area", decision.area.as_str())
      .with("impact", decision.impact.as_str())
  }

  /// A `status_updated` event recording the transition `from → to`.
  pub fn status_change(decision_id: Uuid, from: Status, to: Status) -> Self {
    Self::new(decision_id, AuditAction::StatusUpdated)
      .with("from", from.as_str())
      .with("to", to.as_str())
  }
}
