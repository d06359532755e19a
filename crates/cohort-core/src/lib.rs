//! Core types, the roster parser, and the batch provisioning orchestrator
//! for the Cohort member directory.
//!
//! No HTTP, no database: everything storage-shaped is behind the traits in
//! [`store`], so the batch logic here is testable with in-memory fakes.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod category;
pub mod error;
pub mod identity;
pub mod profile;
pub mod provision;
pub mod report;
pub mod roster;
pub mod store;

pub use error::{BatchError, LineError};
