//! SQLite backend for the Cohort directory.
//!
//! Implements both [`cohort_core::store::IdentityStore`] and
//! [`cohort_core::store::ProfileStore`] over one database file, wrapping
//! [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
