//! Encoding and decoding helpers between Rust domain types and the
//! plain-text representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. String lists (schools,
//! professions, subjects) are stored as compact JSON arrays. UUIDs are
//! stored as hyphenated lowercase strings.

use chrono::{DateTime, Utc};
use cohort_core::{category::Category, identity::IdentityAccount, profile::Profile};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── String lists ────────────────────────────────────────────────────────────

pub fn encode_list(items: &[String]) -> Result<String> {
  Ok(serde_json::to_string(items)?)
}

pub fn decode_list(s: &str) -> Result<Vec<String>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `accounts` row.
pub struct RawAccount {
  pub account_id:      String,
  pub email:           String,
  pub created_at:      String,
  pub last_sign_in_at: Option<String>,
}

impl RawAccount {
  pub fn into_account(self) -> Result<IdentityAccount> {
    Ok(IdentityAccount {
      account_id:      decode_uuid(&self.account_id)?,
      email:           self.email,
      created_at:      decode_dt(&self.created_at)?,
      last_sign_in_at: self
        .last_sign_in_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
    })
  }
}

/// Raw strings read directly from a `students` or `staff` row. The category
/// is implied by the table and supplied by the caller on decode.
pub struct RawProfile {
  pub id:             i64,
  pub email:          String,
  pub last_name:      String,
  pub first_name:     String,
  pub is_admin:       bool,
  pub account_id:     Option<String>,
  pub created_at:     String,
  pub personal_email: Option<String>,
  pub phone:          Option<String>,
  pub class_year:     Option<String>,
  pub status:         Option<String>,
  pub avatar_url:     Option<String>,
  pub schools:        String,
  pub professions:    String,
  pub subjects:       String,
}

impl RawProfile {
  pub fn into_profile(self, category: Category) -> Result<Profile> {
    Ok(Profile {
      id: self.id,
      category,
      email:          self.email,
      last_name:      self.last_name,
      first_name:     self.first_name,
      is_admin:       self.is_admin,
      account_id:     self.account_id.as_deref().map(decode_uuid).transpose()?,
      created_at:     decode_dt(&self.created_at)?,
      personal_email: self.personal_email,
      phone:          self.phone,
      class_year:     self.class_year,
      status:         self.status,
      avatar_url:     self.avatar_url,
      schools:        decode_list(&self.schools)?,
      professions:    decode_list(&self.professions)?,
      subjects:       decode_list(&self.subjects)?,
    })
  }
}
