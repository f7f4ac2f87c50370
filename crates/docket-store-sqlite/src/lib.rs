//! SQLite backend for the Docket decision register and audit log.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. That thread is the single writer: every
//! lifecycle transition and every audit append runs as one closure and one
//! transaction on it, so concurrent callers are serialised.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
