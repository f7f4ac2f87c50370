pub mod audit;
pub mod decisions;
pub mod review;
pub mod session;

use chrono::Utc;
use docket_core::snapshot::ReviewSnapshot;

use crate::{AppState, Backend, error::Error};

/// Rebuild the review snapshot from the current register. Never cached.
pub(crate) async fn current_snapshot<S: Backend>(
  state: &AppState<S>,
) -> Result<ReviewSnapshot, Error> {
  let decisions = state.store.list_decisions().await.map_err(Error::from_store)?;
  Ok(ReviewSnapshot::build(Utc::now(), &decisions))
}
