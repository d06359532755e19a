//! Handler for `GET /directory` — the searchable member directory.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Query, State},
};
use cohort_core::{
  category::Category,
  profile::Profile,
  store::{ProfileQuery, ProfileStore},
};
use serde::Deserialize;

use crate::{auth::CurrentUser, error::ApiError};

#[derive(Debug, Deserialize, Default)]
pub struct DirectoryParams {
  /// Free-text filter over names and contact email.
  pub q:          Option<String>,
  pub category:   Option<Category>,
  pub class_year: Option<String>,
  pub limit:      Option<usize>,
  pub offset:     Option<usize>,
}

/// `GET /directory[?q=...][&category=...][&class_year=...][&limit=...][&offset=...]`
pub async fn search<S>(
  State(store): State<Arc<S>>,
  _user: CurrentUser,
  Query(params): Query<DirectoryParams>,
) -> Result<Json<Vec<Profile>>, ApiError>
where
  S: ProfileStore,
{
  let query = ProfileQuery {
    text:       params.q,
    category:   params.category,
    class_year: params.class_year,
    limit:      params.limit,
    offset:     params.offset,
  };

  let profiles = store
    .search(&query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(profiles))
}
