//! JSON REST API for the Cohort directory.
//!
//! Exposes an axum [`Router`] backed by any store implementing
//! [`IdentityStore`] and [`ProfileStore`]. Session handling, TLS, and
//! transport concerns are the caller's responsibility; the caller's
//! middleware is expected to inject a [`CurrentUser`] extension into every
//! authenticated request.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", cohort_api::api_router(store.clone()))
//! ```

pub mod auth;
pub mod directory;
pub mod error;
pub mod profiles;
pub mod provision;
pub mod users;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use cohort_core::store::{IdentityStore, ProfileStore};

pub use auth::{CurrentUser, RequireAdmin};
pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: IdentityStore + ProfileStore + Clone + Send + Sync + 'static,
{
  Router::new()
    // Admin surface
    .route("/admin/provision", post(provision::run::<S>))
    .route("/users", get(users::list::<S>))
    // Member surface
    .route("/directory", get(directory::search::<S>))
    .route("/me", get(profiles::me::<S>))
    .route(
      "/profiles/{category}/{id}",
      get(profiles::get_one::<S>).put(profiles::update::<S>),
    )
    .with_state(store)
}
