//! Login, logout, invite-token credential setup, and the session middleware.
//!
//! Credential verification is delegated to the identity store (argon2 PHC
//! hashes live there); this module only turns a successful verification
//! into a bearer-token session and injects [`CurrentUser`] into requests.

use axum::{
  Json,
  extract::{Request, State},
  http::{HeaderMap, StatusCode, header},
  middleware::Next,
  response::{IntoResponse, Response},
};
use chrono::Utc;
use cohort_api::{ApiError, CurrentUser};
use cohort_core::store::{IdentityStore, ProfileStore};
use serde::{Deserialize, Serialize};

use crate::{AppState, session::Session};

/// Minimum password length accepted by the set-password flow.
const MIN_PASSWORD_LEN: usize = 8;

/// Extract the token from an `Authorization: Bearer <token>` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
}

/// Session middleware for the `/api` subtree: resolve the bearer token and
/// inject [`CurrentUser`], or reject with 401 before any handler runs.
pub async fn require_session<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Response
where
  S: IdentityStore + ProfileStore + Clone + Send + Sync + 'static,
{
  let session = bearer_token(req.headers())
    .and_then(|token| state.sessions.get(token));

  let Some(session) = session else {
    return ApiError::Unauthorized.into_response();
  };

  req.extensions_mut().insert(CurrentUser {
    account_id: session.account_id,
    email:      session.email,
    is_admin:   session.is_admin,
  });
  next.run(req).await
}

// ─── Login ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
  pub token: String,
}

/// `POST /auth/login`
///
/// Wrong email, unset password, and wrong password all come back as the
/// same 401; nothing about account existence leaks.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError>
where
  S: IdentityStore + ProfileStore + Clone + Send + Sync + 'static,
{
  let account = state
    .store
    .verify_credentials(&body.email, &body.password)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or(ApiError::Unauthorized)?;

  // The admin flag lives on the profile, not the account.
  let is_admin = state
    .store
    .find_by_account(account.account_id)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .is_some_and(|profile| profile.is_admin);

  tracing::info!(email = %account.email, "member signed in");

  let token = state.sessions.issue(Session {
    account_id: account.account_id,
    email: account.email,
    is_admin,
    created_at: Utc::now(),
  });

  Ok(Json(LoginResponse { token }))
}

// ─── Invite-token credential setup ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SetPasswordBody {
  pub token:    String,
  pub password: String,
}

/// `POST /auth/set-password`
///
/// Completes the deferred-credential invite flow: consumes the single-use
/// invite token issued at provisioning time and stores the password.
pub async fn set_password<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<SetPasswordBody>,
) -> Result<StatusCode, ApiError>
where
  S: IdentityStore + ProfileStore + Clone + Send + Sync + 'static,
{
  if body.password.len() < MIN_PASSWORD_LEN {
    return Err(ApiError::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }

  let account = state
    .store
    .set_password_with_token(&body.token, &body.password)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| {
      ApiError::BadRequest("invalid or expired invite token".to_owned())
    })?;

  tracing::info!(email = %account.email, "invite completed");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Logout ──────────────────────────────────────────────────────────────────

/// `POST /auth/logout` — revoke the presented session token.
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> StatusCode
where
  S: IdentityStore + ProfileStore + Clone + Send + Sync + 'static,
{
  if let Some(token) = bearer_token(&headers) {
    state.sessions.revoke(token);
  }
  StatusCode::NO_CONTENT
}
