//! Staleness, needs-review and priority rules.
//!
//! Every function takes the evaluation instant `now` explicitly so results
//! are reproducible. Age is measured from [`Decision::decided_at`]; a missing
//! decision date reads as age zero.

use chrono::{DateTime, Utc};

use crate::decision::Decision;

/// A decision older than this many whole days is stale.
pub const STALE_AFTER_DAYS: i64 = 30;

/// Minimum age, in whole days, before a critical high-impact decision is due
/// for re-review.
pub const REVIEW_AFTER_DAYS: i64 = 30;

pub const NEEDS_REVIEW_POINTS: u32 = 100;
pub const STALE_POINTS: u32 = 50;
pub const HIGH_IMPACT_POINTS: u32 = 30;
pub const CRITICAL_AREA_POINTS: u32 = 10;

/// Highest score [`priority`] can produce.
pub const MAX_PRIORITY: u32 =
  NEEDS_REVIEW_POINTS + STALE_POINTS + HIGH_IMPACT_POINTS + CRITICAL_AREA_POINTS;

// ─── Evaluator ───────────────────────────────────────────────────────────────

/// Whole days elapsed between `timestamp` and `now`, floored. Future
/// timestamps count as zero.
pub fn age_in_days(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
  (now - timestamp).num_days().max(0)
}

/// Age of `decision` at `now`; zero when it has no decision date.
pub fn decision_age(decision: &Decision, now: DateTime<Utc>) -> i64 {
  decision
    .decided_at
    .map(|ts| age_in_days(ts, now))
    .unwrap_or(0)
}

/// Age-only check; impact and area play no part.
pub fn is_stale(decision: &Decision, now: DateTime<Utc>) -> bool {
  decision_age(decision, now) > STALE_AFTER_DAYS
}

/// True only when the decision is old enough, high impact, and in a critical
/// area. Each condition alone is necessary.
pub fn needs_review(decision: &Decision, now: DateTime<Utc>) -> bool {
  decision_age(decision, now) >= REVIEW_AFTER_DAYS
    && decision.impact.is_high()
    && decision.in_critical_area()
}

// ─── Scorer ──────────────────────────────────────────────────────────────────

/// Additive urgency score in `0..=MAX_PRIORITY`. Higher is more urgent.
pub fn priority(decision: &Decision, now: DateTime<Utc>) -> u32 {
  let mut score = 0;
  if needs_review(decision, now) {
    score += NEEDS_REVIEW_POINTS;
  }
  if is_stale(decision, now) {
    score += STALE_POINTS;
  }
  if decision.impact.is_high() {
    score += HIGH_IMPACT_POINTS;
  }
  if decision.in_critical_area() {
    score += CRITICAL_AREA_POINTS;
  }
  score
}
