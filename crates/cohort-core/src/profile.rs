//! Profile — one directory entry for a student/alumni or staff member.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::category::Category;

/// A directory row. Exactly one profile exists per (category, email).
///
/// `id` is a sequential integer unique within the category table, assigned
/// by the store at insert time. `email` is the work/contact address used as
/// the reconciliation key; `personal_email` and the other free-form fields
/// are filled in later by the profile owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
  pub id:             i64,
  pub category:       Category,
  pub email:          String,
  pub last_name:      String,
  pub first_name:     String,
  pub is_admin:       bool,
  /// Set during provisioning; references an existing identity account.
  pub account_id:     Option<Uuid>,
  pub created_at:     DateTime<Utc>,

  // Free-form fields, mutated only through the profile-editing surface.
  pub personal_email: Option<String>,
  pub phone:          Option<String>,
  /// Graduation class, e.g. "2019". Students only.
  pub class_year:     Option<String>,
  pub status:         Option<String>,
  pub avatar_url:     Option<String>,
  pub schools:        Vec<String>,
  pub professions:    Vec<String>,
  /// Subjects taught. Staff only.
  pub subjects:       Vec<String>,
}

/// Input to [`ProfileStore::insert_profile`](crate::store::ProfileStore).
/// `id` and `created_at` are always assigned by the store.
#[derive(Debug, Clone)]
pub struct NewProfile {
  pub category:       Category,
  pub email:          String,
  pub last_name:      String,
  pub first_name:     String,
  pub is_admin:       bool,
  pub account_id:     Option<Uuid>,
  pub personal_email: Option<String>,
  pub phone:          Option<String>,
  pub class_year:     Option<String>,
  pub status:         Option<String>,
  pub avatar_url:     Option<String>,
  pub schools:        Vec<String>,
  pub professions:    Vec<String>,
  pub subjects:       Vec<String>,
}

impl NewProfile {
  /// Convenience constructor with all free-form fields empty and
  /// `is_admin` off.
  pub fn new(
    category: Category,
    email: impl Into<String>,
    last_name: impl Into<String>,
    first_name: impl Into<String>,
  ) -> Self {
    Self {
      category,
      email: email.into(),
      last_name: last_name.into(),
      first_name: first_name.into(),
      is_admin: false,
      account_id: None,
      personal_email: None,
      phone: None,
      class_year: None,
      status: None,
      avatar_url: None,
      schools: Vec::new(),
      professions: Vec::new(),
      subjects: Vec::new(),
    }
  }
}

/// Partial update of a profile's free-form fields.
///
/// Identity fields (`id`, `category`, `email`, `is_admin`, `account_id`)
/// are deliberately absent: they are never editable through the profile
/// surface. A `None` field leaves the stored value untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
  pub last_name:      Option<String>,
  pub first_name:     Option<String>,
  pub personal_email: Option<String>,
  pub phone:          Option<String>,
  pub class_year:     Option<String>,
  pub status:         Option<String>,
  pub avatar_url:     Option<String>,
  pub schools:        Option<Vec<String>>,
  pub professions:    Option<Vec<String>>,
  pub subjects:       Option<Vec<String>>,
}
