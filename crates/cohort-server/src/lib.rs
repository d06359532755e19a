//! HTTP serving layer for the Cohort directory.
//!
//! Assembles the JSON API from `cohort-api` behind a bearer-token session
//! middleware, adds the login/invite endpoints, and exposes the composed
//! axum [`Router`] for the binary (and for tests).

pub mod auth;
pub mod session;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, middleware, routing::post};
use cohort_core::store::{IdentityStore, ProfileStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use session::SessionStore;

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` with a
/// `COHORT_*` environment overlay.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub sessions: Arc<SessionStore>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full application router: `/auth/*` endpoints plus the `/api`
/// subtree gated by the session middleware.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: IdentityStore + ProfileStore + Clone + Send + Sync + 'static,
{
  let api = cohort_api::api_router(state.store.clone()).layer(
    middleware::from_fn_with_state(state.clone(), auth::require_session::<S>),
  );

  let auth_routes = Router::new()
    .route("/auth/login", post(auth::login::<S>))
    .route("/auth/set-password", post(auth::set_password::<S>))
    .route("/auth/logout", post(auth::logout::<S>))
    .with_state(state);

  Router::new()
    .nest("/api", api)
    .merge(auth_routes)
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ───────────────────────────────────────────────────────
