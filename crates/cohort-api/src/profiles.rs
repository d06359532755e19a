//! Handlers for `/profiles` and `/me`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/me` | Caller's own profile; 404 while mid-invite |
//! | `GET`  | `/profiles/:category/:id` | 404 if not found |
//! | `PUT`  | `/profiles/:category/:id` | Owner or admin; free-form fields only |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use cohort_core::{
  category::Category,
  profile::{Profile, ProfileUpdate},
  store::ProfileStore,
};

use crate::{auth::CurrentUser, error::ApiError};

/// `GET /me` — the profile linked to the caller's identity account.
pub async fn me<S>(
  State(store): State<Arc<S>>,
  user: CurrentUser,
) -> Result<Json<Profile>, ApiError>
where
  S: ProfileStore,
{
  let profile = store
    .find_by_account(user.account_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("no profile for {}", user.email))
    })?;
  Ok(Json(profile))
}

/// `GET /profiles/:category/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  _user: CurrentUser,
  Path((category, id)): Path<(Category, i64)>,
) -> Result<Json<Profile>, ApiError>
where
  S: ProfileStore,
{
  let profile = store
    .get_profile(category, id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("profile {category}/{id} not found"))
    })?;
  Ok(Json(profile))
}

/// `PUT /profiles/:category/:id` — body: [`ProfileUpdate`].
///
/// Members may edit their own profile; administrators may edit any.
/// Identity fields (email, admin flag, account link) are not part of
/// [`ProfileUpdate`], so they cannot be changed here regardless of caller.
pub async fn update<S>(
  State(store): State<Arc<S>>,
  user: CurrentUser,
  Path((category, id)): Path<(Category, i64)>,
  Json(body): Json<ProfileUpdate>,
) -> Result<Json<Profile>, ApiError>
where
  S: ProfileStore,
{
  let existing = store
    .get_profile(category, id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("profile {category}/{id} not found"))
    })?;

  let owns = existing.account_id == Some(user.account_id);
  if !owns && !user.is_admin {
    return Err(ApiError::Forbidden);
  }

  let updated = store
    .update_profile(category, id, body)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::NotFound(format!("profile {category}/{id} not found"))
    })?;
  Ok(Json(updated))
}
