//! Decision types, the tracked unit of the Docket register.
//!
//! A decision carries its business fields (area, impact, decision date) and
//! the structural markers its lifecycle status is derived from: an ordered
//! list of snapshots and an optional archive timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Areas ───────────────────────────────────────────────────────────────────

/// Areas whose high-impact decisions must be re-reviewed once they age.
pub const CRITICAL_AREAS: [&str; 2] = ["PRODUCT", "OPS"];

/// Exact, case-sensitive membership test against [`CRITICAL_AREAS`].
pub fn is_critical_area(area: &str) -> bool { CRITICAL_AREAS.contains(&area) }

// ─── Impact ──────────────────────────────────────────────────────────────────

/// The declared business impact of a decision.
///
/// Serialised as the bare string (`"HIGH"`, `"MEDIUM"`, `"LOW"`); any other
/// value is kept verbatim in [`Impact::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Impact {
  High,
  Medium,
  Low,
  Other(String),
}

impl Impact {
  pub fn as_str(&self) -> &str {
    match self {
      Self::High => "HIGH",
      Self::Medium => "MEDIUM",
      Self::Low => "LOW",
      Self::Other(s) => s,
    }
  }

  pub fn is_high(&self) -> bool { matches!(self, Self::High) }
}

impl From<String> for Impact {
  fn from(s: String) -> Self {
    match s.as_str() {
      "HIGH" => Self::High,
      "MEDIUM" => Self::Medium,
      "LOW" => Self::Low,
      _ => Self::Other(s),
    }
  }
}

impl From<&str> for Impact {
  fn from(s: &str) -> Self { Self::from(s.to_owned()) }
}

impl From<Impact> for String {
  fn from(i: Impact) -> Self {
    match i {
      Impact::Other(s) => s,
      other => other.as_str().to_owned(),
    }
  }
}

// ─── Snapshot ────────────────────────────────────────────────────────────────

/// A point-in-time capture attached to a decision. Only the latest snapshot
/// of a decision decides whether it is locked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
  pub snapshot_id: Uuid,
  pub captured_at: DateTime<Utc>,
  pub note:        Option<String>,
  pub locked_at:   Option<DateTime<Utc>>,
}

impl Snapshot {
  pub fn is_locked(&self) -> bool { self.locked_at.is_some() }
}

// ─── Decision ────────────────────────────────────────────────────────────────

/// A tracked organisational decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
  pub id:          Uuid,
  pub title:       String,
  pub area:        String,
  pub impact:      Impact,
  /// The review clock: age-based rules measure from this instant. `None`
  /// when the stored value is missing or unparseable, which reads as age 0.
  pub decided_at:  Option<DateTime<Utc>>,
  pub created_at:  DateTime<Utc>,
  /// Last edit of the record itself. Informational only.
  pub updated_at:  DateTime<Utc>,
  /// Presence is authoritative and terminal.
  pub archived_at: Option<DateTime<Utc>>,
  /// Chronological; the last element is the latest snapshot.
  #[serde(default)]
  pub snapshots:   Vec<Snapshot>,
}

impl Decision {
  pub fn latest_snapshot(&self) -> Option<&Snapshot> { self.snapshots.last() }

  pub fn is_archived(&self) -> bool { self.archived_at.is_some() }

  pub fn in_critical_area(&self) -> bool { is_critical_area(&self.area) }
}

// ─── NewDecision ─────────────────────────────────────────────────────────────

/// Input to [`crate::store::DecisionStore::record_decision`].
/// `created_at` and `updated_at` are always set by the store.
#[derive(Debug, Clone)]
pub struct NewDecision {
  pub title:      String,
  pub area:       String,
  pub impact:     Impact,
  /// Defaults to the creation instant when not supplied.
  pub decided_at: Option<DateTime<Utc>>,
}

impl NewDecision {
  pub fn new(
    title: impl Into<String>,
    area: impl Into<String>,
    impact: impl Into<Impact>,
  ) -> Self {
    Self {
      title:      title.into(),
      area:       area.into(),
      impact:     impact.into(),
      decided_at: None,
    }
  }
}
