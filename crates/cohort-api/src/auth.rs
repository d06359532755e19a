//! The authenticated-caller extractors.
//!
//! The API crate never checks credentials itself: the serving layer's
//! session middleware verifies the bearer token and inserts a
//! [`CurrentUser`] extension into the request. The extractors here only
//! read that extension, so handlers stay testable with a hand-built
//! request.

use axum::{extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::error::ApiError;

/// The authenticated caller, as resolved at login time.
#[derive(Debug, Clone)]
pub struct CurrentUser {
  pub account_id: Uuid,
  pub email:      String,
  pub is_admin:   bool,
}

impl<S> FromRequestParts<S> for CurrentUser
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    parts
      .extensions
      .get::<CurrentUser>()
      .cloned()
      .ok_or(ApiError::Unauthorized)
  }
}

/// Extractor that additionally requires the admin flag.
pub struct RequireAdmin(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &S,
  ) -> Result<Self, Self::Rejection> {
    let user = CurrentUser::from_request_parts(parts, state).await?;
    if !user.is_admin {
      return Err(ApiError::Forbidden);
    }
    Ok(Self(user))
  }
}
