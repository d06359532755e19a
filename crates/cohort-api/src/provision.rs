//! Handler for `POST /admin/provision` — the bulk account import.

use std::sync::Arc;

use axum::{Json, extract::State};
use cohort_core::{
  category::Category,
  error::BatchError,
  provision::run_batch,
  store::{IdentityStore, ProfileStore},
};
use serde::{Deserialize, Serialize};

use crate::{auth::RequireAdmin, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct ProvisionBody {
  /// Newline-separated roster lines: `last;first;email[;code]`.
  pub lines:    String,
  /// Category applied to lines that do not embed their own code.
  #[serde(default)]
  pub category: Option<Category>,
}

#[derive(Debug, Serialize)]
pub struct ProvisionResponse {
  pub report: Vec<String>,
}

/// `POST /admin/provision` — admin only.
///
/// Always returns a report when the batch ran, even if every line failed;
/// only an unreachable identity store turns into an error response.
pub async fn run<S>(
  State(store): State<Arc<S>>,
  RequireAdmin(_admin): RequireAdmin,
  Json(body): Json<ProvisionBody>,
) -> Result<Json<ProvisionResponse>, ApiError>
where
  S: IdentityStore + ProfileStore,
{
  let report = run_batch(&*store, &*store, &body.lines, body.category)
    .await
    .map_err(|e| match e {
      BatchError::IdentityStore(source) => ApiError::Upstream(source),
    })?;

  Ok(Json(ProvisionResponse { report }))
}
