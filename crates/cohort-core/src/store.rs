//! The `IdentityStore` and `ProfileStore` traits and supporting query types.
//!
//! The traits are implemented by storage backends (e.g.
//! `cohort-store-sqlite`). Higher layers (`cohort-api`, `cohort-server`)
//! depend on these abstractions, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  category::Category,
  identity::IdentityAccount,
  profile::{NewProfile, Profile, ProfileUpdate},
};

// ─── Query type ──────────────────────────────────────────────────────────────

/// Parameters for [`ProfileStore::search`].
#[derive(Debug, Clone, Default)]
pub struct ProfileQuery {
  /// Free-text filter over names and contact email.
  pub text:       Option<String>,
  /// Restrict to one category; both tables are searched when absent.
  pub category:   Option<Category>,
  /// Exact graduation-class filter (meaningful for students).
  pub class_year: Option<String>,
  pub limit:      Option<usize>,
  pub offset:     Option<usize>,
}

// ─── Identity store ──────────────────────────────────────────────────────────

/// Abstraction over the identity store — the system of record for login
/// credentials and account existence, independent of profile data.
///
/// Provisioning policy is deferred credentials: a freshly created account
/// has no password and carries a single-use invite token; the member sets
/// a password later through [`IdentityStore::set_password_with_token`].
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait IdentityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// List every account. The batch orchestrator fetches this once per
  /// batch so per-line resolution is an in-memory scan rather than a
  /// round trip per line.
  fn list_accounts(
    &self,
  ) -> impl Future<Output = Result<Vec<IdentityAccount>, Self::Error>> + Send + '_;

  /// Create an account with deferred credentials. Fails if the email is
  /// already taken; callers resolving against [`Self::list_accounts`]
  /// output should not hit that path.
  fn create_account<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<IdentityAccount, Self::Error>> + Send + 'a;

  /// The pending invite token for an account, or `None` once credentials
  /// have been set.
  fn invite_token(
    &self,
    account_id: Uuid,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  /// Consume an invite token and set the account password. Returns `None`
  /// when the token is unknown or already used.
  fn set_password_with_token<'a>(
    &'a self,
    token: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Option<IdentityAccount>, Self::Error>> + Send + 'a;

  /// Verify login credentials. On success the account's `last_sign_in_at`
  /// is updated and the refreshed account returned; `None` means unknown
  /// email, unset password, or a mismatch (indistinguishable on purpose).
  fn verify_credentials<'a>(
    &'a self,
    email: &'a str,
    password: &'a str,
  ) -> impl Future<Output = Result<Option<IdentityAccount>, Self::Error>> + Send + 'a;
}

// ─── Profile store ───────────────────────────────────────────────────────────

/// Abstraction over the per-category directory tables.
pub trait ProfileStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Reconciliation existence check: the profile for (category, email),
  /// if any.
  fn find_by_email<'a>(
    &'a self,
    category: Category,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;

  /// Insert a profile. The sequential per-category `id` is assigned by
  /// the store, atomically with the insert, so two concurrent batches can
  /// never hand out the same id. Inserting a duplicate (category, email)
  /// is an error.
  fn insert_profile(
    &self,
    profile: NewProfile,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + '_;

  /// Retrieve one profile by category and id. `None` if not found.
  fn get_profile(
    &self,
    category: Category,
    id: i64,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// The profile belonging to an identity account, checking categories in
  /// [`Category::ALL`] order (students first, then staff).
  fn find_by_account(
    &self,
    account_id: Uuid,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;

  /// List all profiles, optionally restricted to one category.
  fn list_profiles(
    &self,
    category: Option<Category>,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + '_;

  /// Search profiles matching `query`, using SQL LIKE for the text filter.
  fn search<'a>(
    &'a self,
    query: &'a ProfileQuery,
  ) -> impl Future<Output = Result<Vec<Profile>, Self::Error>> + Send + 'a;

  /// Apply a partial update to the free-form fields of one profile and
  /// return the updated row. `None` if the profile does not exist.
  fn update_profile(
    &self,
    category: Category,
    id: i64,
    update: ProfileUpdate,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + '_;
}
