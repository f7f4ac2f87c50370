//! Plain-text rendering of API responses.

use docket_core::{
  audit::AuditEvent, lifecycle::ResolvedDecision, snapshot::ReviewSnapshot,
};

fn flag(b: bool) -> &'static str { if b { "yes" } else { "-" } }

pub fn review(snap: &ReviewSnapshot) -> String {
  let mut out = format!(
    "snapshot {} at {}\n",
    &snap.snapshot_id[..12.min(snap.snapshot_id.len())],
    snap.evaluated_at.to_rfc3339()
  );
  if snap.recent.is_empty() {
    out.push_str("nothing to review\n");
    return out;
  }
  out.push_str(&format!(
    "{:>4}  {:<36}  {:<11}  {:>4}  {:<5}  {:<6}  {}\n",
    "PRI", "ID", "STATUS", "AGE", "STALE", "REVIEW", "TITLE"
  ));
  for c in &snap.recent {
    out.push_str(&format!(
      "{:>4}  {:<36}  {:<11}  {:>4}  {:<5}  {:<6}  {}\n",
      c.priority,
      c.decision_id,
      c.status.as_str(),
      c.age_days,
      flag(c.is_stale),
      flag(c.needs_review),
      c.title
    ));
  }
  out
}

pub fn decisions(list: &[ResolvedDecision]) -> String {
  let mut out = String::new();
  for r in list {
    let d = &r.decision;
    out.push_str(&format!(
      "{:<36}  {:<11}  {:<8}  {:<8}  {}\n",
      d.id,
      r.status.as_str(),
      d.area,
      d.impact.as_str(),
      d.title
    ));
  }
  out
}

pub fn audit(events: &[AuditEvent]) -> String {
  let mut out = String::new();
  for e in events {
    let meta = e
      .metadata
      .as_ref()
      .map(|m| serde_json::Value::Object(m.clone()).to_string())
      .unwrap_or_default();
    out.push_str(&format!(
      "{:>6}  {}  {:<36}  {:<24}  {}\n",
      e.seq,
      e.recorded_at.to_rfc3339(),
      e.decision_id,
      e.action.as_str(),
      meta
    ));
  }
  out
}
