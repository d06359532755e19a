//! Error types for `cohort-core`.

use thiserror::Error;

/// Why a single roster line was rejected by the parser.
///
/// A rejected line produces one failure entry in the batch report and is
/// never sent to the stores.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineError {
  #[error("malformed line: expected at least {expected} fields, got {got}")]
  TooFewFields { expected: usize, got: usize },

  #[error("empty {0} field")]
  EmptyField(&'static str),

  #[error("unknown category code: {0:?}")]
  UnknownCategory(String),
}

/// A failure that aborts a whole provisioning batch.
///
/// Per-line problems never surface here; they become report entries instead.
/// The only fatal path is failing to reach the identity store for the
/// initial account listing, before any line has been processed.
#[derive(Debug, Error)]
pub enum BatchError {
  #[error("identity store unavailable: {0}")]
  IdentityStore(#[source] Box<dyn std::error::Error + Send + Sync>),
}
