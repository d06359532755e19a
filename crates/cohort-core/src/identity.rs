//! Identity accounts — login identity, owned by the identity store.
//!
//! An account holds credentials and sign-in metadata only. Everything a
//! member shows in the directory lives in their [`Profile`](crate::profile),
//! keyed back to the account through `account_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An account in the identity store.
///
/// Accounts are created on first provisioning of an email (or by a prior
/// invite) and are never deleted by the directory. Password material stays
/// inside the store; it is never exposed through this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityAccount {
  pub account_id:      Uuid,
  pub email:           String,
  pub created_at:      DateTime<Utc>,
  /// `None` until the member signs in for the first time.
  pub last_sign_in_at: Option<DateTime<Utc>>,
}
