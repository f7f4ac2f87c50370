//! Lifecycle status derivation.
//!
//! A decision's status is never stored. It is computed on read from the
//! structural markers on the record, in a fixed order: the archive marker
//! wins over the lock marker of the latest snapshot, which wins over the mere
//! presence of snapshots.

use serde::{Deserialize, Serialize};

use crate::decision::Decision;

// ─── Computed status ─────────────────────────────────────────────────────────

/// The lifecycle status of a decision, computed at query time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
  Draft,
  Recorded,
  Snapshotted,
  Locked,
  Archived,
}

impl Status {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Draft => "draft",
      Self::Recorded => "recorded",
      Self::Snapshotted => "snapshotted",
      Self::Locked => "locked",
      Self::Archived => "archived",
    }
  }
}

impl std::fmt::Display for Status {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Derive the status of `decision`. Total and side-effect free.
///
/// The branch order is the contract: `Archived` is absorbing and masks any
/// snapshot state, and only the latest snapshot's lock marker counts.
pub fn derive_status(decision: &Decision) -> Status {
  if decision.archived_at.is_some() {
    return Status::Archived;
  }

  let latest = decision.snapshots.last();
  if latest.is_some_and(|s| s.locked_at.is_some()) {
    return Status::Locked;
  }

  if !decision.snapshots.is_empty() {
    return Status::Snapshotted;
  }

  if exists(decision) {
    return Status::Recorded;
  }

  Status::Draft
}

/// A record built from nothing (nil id, blank title) has never been recorded.
fn exists(decision: &Decision) -> bool {
  !decision.id.is_nil() || !decision.title.trim().is_empty()
}

// ─── Resolved view ───────────────────────────────────────────────────────────

/// A decision bundled with its derived status, as served to API callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedDecision {
  #[serde(flatten)]
  pub decision: Decision,
  pub status:   Status,
}

impl From<Decision> for ResolvedDecision {
  fn from(decision: Decision) -> Self {
    let status = derive_status(&decision);
    Self { decision, status }
  }
}

#[cfg(test)]
mod tests {
  use chrono::{TimeZone, Utc};
  use uuid::Uuid;

  use super::*;
  use crate::decision::{Impact, Snapshot};

  fn decision() -> Decision {
    let ts = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    Decision {
      id:          Uuid::new_v4(),
      title:       "Adopt Postgres".into(),
      area:        "OPS".into(),
      impact:      Impact::High,
      decided_at:  Some(ts),
      created_at:  ts,
      updated_at:  ts,
      archived_at: None,
      snapshots:   vec![],
    }
  }

  fn snapshot(locked: bool) -> Snapshot {
    let ts = Utc.timestamp_opt(1_700_000_100, 0).unwrap();
    Snapshot {
      snapshot_id: Uuid::new_v4(),
      captured_at: ts,
      note:        None,
      locked_at:   locked.then_some(ts),
    }
  }

  #[test]
  fn fresh_decision_is_recorded() {
    assert_eq!(derive_status(&decision()), Status::Recorded);
  }

  #[test]
  fn any_snapshot_makes_it_snapshotted() {
    let mut d = decision();
    d.snapshots.push(snapshot(false));
    assert_eq!(derive_status(&d), Status::Snapshotted);
  }

  #[test]
  fn locked_latest_snapshot_wins_over_unlocked_earlier_ones() {
    let mut d = decision();
    d.snapshots.push(snapshot(false));
    d.snapshots.push(snapshot(false));
    d.snapshots.push(snapshot(true));
    assert_eq!(derive_status(&d), Status::Locked);
  }

  #[test]
  fn earlier_lock_does_not_override_unlocked_latest() {
    let mut d = decision();
    d.snapshots.push(snapshot(true));
    d.snapshots.push(snapshot(false));
    assert_eq!(derive_status(&d), Status::Snapshotted);
  }

  #[test]
  fn archived_masks_everything() {
    let mut d = decision();
    d.archived_at = Some(Utc::now());
    assert_eq!(derive_status(&d), Status::Archived);

    d.snapshots.push(snapshot(false));
    assert_eq!(derive_status(&d), Status::Archived);

    d.snapshots.push(snapshot(true));
    assert_eq!(derive_status(&d), Status::Archived);
  }

  #[test]
  fn structurally_empty_record_is_draft() {
    let mut d = decision();
    d.id = Uuid::nil();
    d.title = "  ".into();
    assert_eq!(derive_status(&d), Status::Draft);
  }

  #[test]
  fn resolved_decision_serialises_flat_with_status() {
    let resolved = ResolvedDecision::from(decision());
    let json = serde_json::to_value(&resolved).unwrap();
    assert_eq!(json["status"], "recorded");
    assert_eq!(json["impact"], "HIGH");
    assert!(json.get("decision").is_none());
  }
}
