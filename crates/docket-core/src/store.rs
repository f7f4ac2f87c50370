//! The `DecisionStore` and `AuditLog` traits.
//!
//! Both are implemented by storage backends (e.g. `docket-store-sqlite`).
//! Higher layers (`docket-server`) depend on these abstractions, not on any
//! concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  audit::{AuditEvent, NewAuditEvent},
  decision::{Decision, NewDecision, Snapshot},
};

// ─── Decisions ───────────────────────────────────────────────────────────────

/// The result of a register write, with the audit event committed alongside
/// it.
#[derive(Debug, Clone)]
pub struct Audited<T> {
  pub value: T,
  pub event: AuditEvent,
}

/// Abstraction over the decision register.
///
/// Lifecycle writes only ever move a decision forward. Each transition checks
/// and writes atomically, and rejects moves that would demote the derived
/// status (snapshotting an archived or locked decision, re-locking, locking
/// without a snapshot, archiving twice).
///
/// Every write appends its audit event (`created` or `status_updated`) in the
/// same transaction as the change. If the event cannot be written the change
/// is rolled back, so the register never holds an unaudited state. The
/// `from` status of a transition is read inside that transaction.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait DecisionStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new decision with no snapshots and no archive marker.
  fn record_decision(
    &self,
    input: NewDecision,
  ) -> impl Future<Output = Result<Audited<Decision>, Self::Error>> + Send + '_;

  /// Retrieve a decision (with its snapshots, oldest first). `None` if
  /// absent.
  fn get_decision(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Decision>, Self::Error>> + Send + '_;

  /// All decisions in creation order.
  fn list_decisions(
    &self,
  ) -> impl Future<Output = Result<Vec<Decision>, Self::Error>> + Send + '_;

  /// Append a new, unlocked snapshot.
  fn append_snapshot(
    &self,
    id: Uuid,
    note: Option<String>,
  ) -> impl Future<Output = Result<Audited<Snapshot>, Self::Error>> + Send + '_;

  /// Set `locked_at` on the latest snapshot.
  fn lock_latest_snapshot(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Audited<Snapshot>, Self::Error>> + Send + '_;

  /// Set `archived_at`. Terminal.
  fn archive(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Audited<Decision>, Self::Error>> + Send + '_;
}

// ─── Audit log ───────────────────────────────────────────────────────────────

/// An append-only, durable log of [`AuditEvent`]s.
///
/// Appends are serialised: concurrent callers never interleave partial writes
/// and never reorder one another. Readers only ever observe committed events.
pub trait AuditLog: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Durably append `event`. Returns only once the event is committed; on
  /// error nothing was recorded.
  fn append(
    &self,
    event: NewAuditEvent,
  ) -> impl Future<Output = Result<AuditEvent, Self::Error>> + Send + '_;

  /// Events for `decision_id`, in write order.
  fn load(
    &self,
    decision_id: Uuid,
  ) -> impl Future<Output = Result<Vec<AuditEvent>, Self::Error>> + Send + '_;

  /// The whole log from the beginning, in write order.
  fn replay(
    &self,
  ) -> impl Future<Output = Result<Vec<AuditEvent>, Self::Error>> + Send + '_;
}
