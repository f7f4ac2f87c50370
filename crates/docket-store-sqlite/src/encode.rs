//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Audit metadata is stored as
//! compact JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use docket_core::{
  audit::{AuditAction, AuditEvent},
  decision::{Decision, Impact, Snapshot},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ────────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

/// Decode the review clock. An unparseable value is logged and read as
/// `None` (age zero).
fn decode_review_clock(decision_id: &str, s: Option<&str>) -> Option<DateTime<Utc>> {
  let s = s?;
  match decode_dt(s) {
    Ok(dt) => Some(dt),
    Err(e) => {
      tracing::warn!(%decision_id, value = %s, error = %e, "unparseable decided_at; treating as age 0");
      None
    }
  }
}

// ─── Audit metadata ───────────────────────────────────────────────────────────

/// Encoded on the connection thread, so failures surface as a rusqlite error
/// and abort the surrounding transaction.
pub fn encode_metadata(
  m: Option<&serde_json::Map<String, serde_json::Value>>,
) -> rusqlite::Result<Option<String>> {
  m.map(serde_json::to_string)
    .transpose()
    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))
}

pub fn decode_metadata(
  s: Option<&str>,
) -> Result<Option<serde_json::Map<String, serde_json::Value>>> {
  s.map(serde_json::from_str).transpose().map_err(Error::from)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `snapshots` row.
pub struct RawSnapshot {
  pub snapshot_id: String,
  pub decision_id: String,
  pub captured_at: String,
  pub note:        Option<String>,
  pub locked_at:   Option<String>,
}

impl RawSnapshot {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      snapshot_id: row.get(0)?,
      decision_id: row.get(1)?,
      captured_at: row.get(2)?,
      note:        row.get(3)?,
      locked_at:   row.get(4)?,
    })
  }

  pub fn into_snapshot(self) -> Result<Snapshot> {
    Ok(Snapshot {
      snapshot_id: decode_uuid(&self.snapshot_id)?,
      captured_at: decode_dt(&self.captured_at)?,
      note:        self.note,
      locked_at:   self.locked_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from a `decisions` row.
pub struct RawDecision {
  pub decision_id: String,
  pub title:       String,
  pub area:        String,
  pub impact:      String,
  pub decided_at:  Option<String>,
  pub created_at:  String,
  pub updated_at:  String,
  pub archived_at: Option<String>,
}

impl RawDecision {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      decision_id: row.get(0)?,
      title:       row.get(1)?,
      area:        row.get(2)?,
      impact:      row.get(3)?,
      decided_at:  row.get(4)?,
      created_at:  row.get(5)?,
      updated_at:  row.get(6)?,
      archived_at: row.get(7)?,
    })
  }

  /// Assemble a [`Decision`]; `snapshots` must already be in position order.
  pub fn into_decision(self, snapshots: Vec<RawSnapshot>) -> Result<Decision> {
    let decided_at = decode_review_clock(&self.decision_id, self.decided_at.as_deref());
    Ok(Decision {
      id: decode_uuid(&self.decision_id)?,
      title: self.title,
      area: self.area,
      impact: Impact::from(self.impact),
      decided_at,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
      archived_at: self.archived_at.as_deref().map(decode_dt).transpose()?,
      snapshots: snapshots
        .into_iter()
        .map(RawSnapshot::into_snapshot)
        .collect::<Result<_>>()?,
    })
  }
}

/// Raw values read directly from an `audit_events` row.
pub struct RawAuditEvent {
  pub seq:         i64,
  pub decision_id: String,
  pub action:      String,
  pub recorded_at: String,
  pub metadata:    Option<String>,
}

impl RawAuditEvent {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      seq:         row.get(0)?,
      decision_id: row.get(1)?,
      action:      row.get(2)?,
      recorded_at: row.get(3)?,
      metadata:    row.get(4)?,
    })
  }

  pub fn into_event(self) -> Result<AuditEvent> {
    Ok(AuditEvent {
      seq:         self.seq,
      decision_id: decode_uuid(&self.decision_id)?,
      action:      self.action.parse::<AuditAction>()?,
      recorded_at: decode_dt(&self.recorded_at)?,
      metadata:    decode_metadata(self.metadata.as_deref())?,
    })
  }
}
