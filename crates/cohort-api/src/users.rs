//! Handler for `GET /users` — the merged account/profile listing.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use cohort_core::{
  category::Category,
  store::{IdentityStore, ProfileStore},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{auth::RequireAdmin, error::ApiError};

/// One identity account with its directory membership resolved.
///
/// `category` is `None` for an account with no profile row — typically a
/// mid-invite account, or an orphan left by a failed profile insert. They
/// surface here on purpose so administrators can reconcile them.
#[derive(Debug, Serialize)]
pub struct UserEntry {
  pub account_id:      Uuid,
  pub email:           String,
  pub created_at:      DateTime<Utc>,
  pub last_sign_in_at: Option<DateTime<Utc>>,
  pub category:        Option<Category>,
}

/// `GET /users` — admin only.
pub async fn list<S>(
  State(store): State<Arc<S>>,
  RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<UserEntry>>, ApiError>
where
  S: IdentityStore + ProfileStore,
{
  let accounts = store
    .list_accounts()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  // One pass over both profile tables instead of a lookup per account.
  let profiles = store
    .list_profiles(None)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;

  let category_by_account: HashMap<Uuid, Category> = profiles
    .into_iter()
    .filter_map(|p| p.account_id.map(|id| (id, p.category)))
    .collect();

  let entries = accounts
    .into_iter()
    .map(|account| UserEntry {
      category:        category_by_account.get(&account.account_id).copied(),
      account_id:      account.account_id,
      email:           account.email,
      created_at:      account.created_at,
      last_sign_in_at: account.last_sign_in_at,
    })
    .collect();

  Ok(Json(entries))
}
