//! Core types and trait definitions for the Docket decision register.
//!
//! This crate has no HTTP or database dependencies. Status derivation,
//! review scoring and snapshot building are pure functions over the types
//! defined here; storage backends implement the traits in [`store`].

pub mod audit;
pub mod decision;
pub mod error;
pub mod lifecycle;
pub mod review;
pub mod snapshot;
pub mod store;

pub use error::{Error, Result};
