//! Error types for `docket-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("decision not found: {0}")]
  DecisionNotFound(Uuid),

  #[error("decision {0} is archived")]
  Archived(Uuid),

  #[error("latest snapshot of decision {0} is locked")]
  Locked(Uuid),

  #[error("latest snapshot of decision {0} is already locked")]
  AlreadyLocked(Uuid),

  #[error("decision {0} has no snapshot to lock")]
  NoSnapshot(Uuid),

  #[error("unknown audit action: {0:?}")]
  UnknownAuditAction(String),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

impl Error {
  /// Whether this error rejects a backward lifecycle move rather than
  /// reporting a missing record or a fault.
  pub fn is_lifecycle_conflict(&self) -> bool {
    matches!(
      self,
      Self::Archived(_)
        | Self::Locked(_)
        | Self::AlreadyLocked(_)
        | Self::NoSnapshot(_)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
