//! Review snapshots: the point-in-time view of decisions due for attention.
//!
//! A snapshot is never stored and never cached; callers rebuild it from the
//! current decisions on every request. Its id is a SHA-256 digest over the
//! evaluation instant and the ordered candidate ids, so identical inputs
//! always produce the same id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{
  decision::{Decision, Impact},
  lifecycle::{Status, derive_status},
  review::{decision_age, is_stale, needs_review, priority},
};

/// One decision's review state inside a [`ReviewSnapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewCandidate {
  pub decision_id:  Uuid,
  pub title:        String,
  pub area:         String,
  pub impact:       Impact,
  pub status:       Status,
  pub age_days:     i64,
  pub is_stale:     bool,
  pub needs_review: bool,
  pub priority:     u32,
}

impl ReviewCandidate {
  /// Evaluate `decision` at `as_of`.
  pub fn evaluate(decision: &Decision, as_of: DateTime<Utc>) -> Self {
    Self {
      decision_id:  decision.id,
      title:        decision.title.clone(),
      area:         decision.area.clone(),
      impact:       decision.impact.clone(),
      status:       derive_status(decision),
      age_days:     decision_age(decision, as_of),
      is_stale:     is_stale(decision, as_of),
      needs_review: needs_review(decision, as_of),
      priority:     priority(decision, as_of),
    }
  }

  /// The inclusion rule for the `recent` list.
  pub fn is_review_candidate(&self) -> bool {
    self.is_stale || self.needs_review || self.impact.is_high()
  }
}

/// An immutable, ranked view of the decisions that warrant review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewSnapshot {
  pub snapshot_id:  String,
  pub evaluated_at: DateTime<Utc>,
  /// Highest priority first; equal scores keep input order.
  pub recent:       Vec<ReviewCandidate>,
}

impl ReviewSnapshot {
  /// Build a snapshot of `decisions` as of `as_of`. Does not read the clock.
  pub fn build(as_of: DateTime<Utc>, decisions: &[Decision]) -> Self {
    let mut recent: Vec<ReviewCandidate> = decisions
      .iter()
      .map(|d| ReviewCandidate::evaluate(d, as_of))
      .filter(ReviewCandidate::is_review_candidate)
      .collect();

    // `sort_by` is stable.
    recent.sort_by(|a, b| b.priority.cmp(&a.priority));

    Self {
      snapshot_id: compute_snapshot_id(as_of, &recent),
      evaluated_at: as_of,
      recent,
    }
  }

  pub fn find(&self, decision_id: Uuid) -> Option<&ReviewCandidate> {
    self.recent.iter().find(|c| c.decision_id == decision_id)
  }
}

fn compute_snapshot_id(as_of: DateTime<Utc>, recent: &[ReviewCandidate]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(as_of.timestamp_micros().to_le_bytes());
  for c in recent {
    hasher.update(c.decision_id.as_bytes());
    hasher.update(c.priority.to_le_bytes());
  }
  hex::encode(hasher.finalize())
}
