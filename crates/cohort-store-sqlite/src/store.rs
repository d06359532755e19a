//! [`SqliteStore`] — the SQLite implementation of the identity and profile
//! stores.

use std::path::Path;

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use chrono::Utc;
use cohort_core::{
  category::Category,
  identity::IdentityAccount,
  profile::{NewProfile, Profile, ProfileUpdate},
  store::{IdentityStore, ProfileQuery, ProfileStore},
};
use rand_core::{OsRng, RngCore as _};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{RawAccount, RawProfile, encode_dt, encode_list, encode_uuid},
  schema::SCHEMA,
};

/// The table backing a category. Dispatch lives here and nowhere else, so a
/// new category is a compile-checked change.
fn table(category: Category) -> &'static str {
  match category {
    Category::Student => "students",
    Category::Staff => "staff",
  }
}

const ACCOUNT_COLUMNS: &str =
  "account_id, email, created_at, last_sign_in_at";

const PROFILE_COLUMNS: &str = "id, email, last_name, first_name, is_admin, \
   account_id, created_at, personal_email, phone, class_year, status, \
   avatar_url, schools, professions, subjects";

fn raw_account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAccount> {
  Ok(RawAccount {
    account_id:      row.get(0)?,
    email:           row.get(1)?,
    created_at:      row.get(2)?,
    last_sign_in_at: row.get(3)?,
  })
}

fn raw_profile_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawProfile> {
  Ok(RawProfile {
    id:             row.get(0)?,
    email:          row.get(1)?,
    last_name:      row.get(2)?,
    first_name:     row.get(3)?,
    is_admin:       row.get(4)?,
    account_id:     row.get(5)?,
    created_at:     row.get(6)?,
    personal_email: row.get(7)?,
    phone:          row.get(8)?,
    class_year:     row.get(9)?,
    status:         row.get(10)?,
    avatar_url:     row.get(11)?,
    schools:        row.get(12)?,
    professions:    row.get(13)?,
    subjects:       row.get(14)?,
  })
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Cohort directory store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Flip `is_admin` on the profile matching `email`, whichever category
  /// table it lives in. Used by the server's out-of-band promotion helper;
  /// bulk provisioning never sets the flag.
  pub async fn promote_admin(&self, email: &str) -> Result<Option<Profile>> {
    for category in Category::ALL {
      let tbl = table(category);
      let email_owned = email.to_owned();
      let changed = self
        .conn
        .call(move |conn| {
          let n = conn.execute(
            &format!("UPDATE {tbl} SET is_admin = 1 WHERE email = ?1"),
            rusqlite::params![email_owned],
          )?;
          Ok(n)
        })
        .await?;

      if changed > 0 {
        return self.find_by_email(category, email).await;
      }
    }
    Ok(None)
  }

  async fn fetch_profile_where<P>(
    &self,
    category: Category,
    clause: &'static str,
    param: P,
  ) -> Result<Option<Profile>>
  where
    P: rusqlite::ToSql + Send + 'static,
  {
    let tbl = table(category);
    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PROFILE_COLUMNS} FROM {tbl} WHERE {clause}"),
              rusqlite::params![param],
              raw_profile_from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(|r| r.into_profile(category)).transpose()
  }

  async fn search_one(
    &self,
    category: Category,
    query: &ProfileQuery,
  ) -> Result<Vec<Profile>> {
    let tbl = table(category);
    let text_pattern = query.text.as_deref().map(|t| format!("%{t}%"));
    let class_year = query.class_year.clone();

    let raws: Vec<RawProfile> = self
      .conn
      .call(move |conn| {
        // NULL-guarded filters keep the statement shape fixed whatever
        // combination of filters the caller set.
        let sql = format!(
          "SELECT {PROFILE_COLUMNS} FROM {tbl}
           WHERE (?1 IS NULL
                  OR last_name LIKE ?1 OR first_name LIKE ?1 OR email LIKE ?1)
             AND (?2 IS NULL OR class_year = ?2)
           ORDER BY last_name, first_name"
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(
            rusqlite::params![text_pattern.as_deref(), class_year.as_deref()],
            raw_profile_from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|r| r.into_profile(category))
      .collect()
  }
}

// ─── IdentityStore impl ──────────────────────────────────────────────────────

impl IdentityStore for SqliteStore {
  type Error = Error;

  async fn list_accounts(&self) -> Result<Vec<IdentityAccount>> {
    let raws: Vec<RawAccount> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY created_at"
        ))?;
        let rows = stmt
          .query_map([], raw_account_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAccount::into_account).collect()
  }

  async fn create_account(&self, email: &str) -> Result<IdentityAccount> {
    let account = IdentityAccount {
      account_id:      Uuid::new_v4(),
      email:           email.to_owned(),
      created_at:      Utc::now(),
      last_sign_in_at: None,
    };

    // Single-use invite token; delivery to the member is out of band.
    let mut token_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut token_bytes);
    let invite_token = hex::encode(token_bytes);

    let id_str = encode_uuid(account.account_id);
    let email_owned = account.email.clone();
    let at_str = encode_dt(account.created_at);

    let inserted: bool = self
      .conn
      .call(move |conn| {
        let taken: bool = conn
          .query_row(
            "SELECT 1 FROM accounts WHERE email = ?1",
            rusqlite::params![email_owned],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);

        if taken {
          return Ok(false);
        }

        conn.execute(
          "INSERT INTO accounts (account_id, email, created_at, invite_token)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![id_str, email_owned, at_str, invite_token],
        )?;
        Ok(true)
      })
      .await?;

    if !inserted {
      return Err(Error::EmailTaken(email.to_owned()));
    }
    Ok(account)
  }

  async fn invite_token(&self, account_id: Uuid) -> Result<Option<String>> {
    let id_str = encode_uuid(account_id);
    let token: Option<String> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT invite_token FROM accounts WHERE account_id = ?1",
              rusqlite::params![id_str],
              |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten(),
        )
      })
      .await?;
    Ok(token)
  }

  async fn set_password_with_token(
    &self,
    token: &str,
    password: &str,
  ) -> Result<Option<IdentityAccount>> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| Error::PasswordHash(e.to_string()))?
      .to_string();

    let token_owned = token.to_owned();
    let raw: Option<RawAccount> = self
      .conn
      .call(move |conn| {
        let raw = conn
          .query_row(
            &format!(
              "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE invite_token = ?1"
            ),
            rusqlite::params![token_owned],
            raw_account_from_row,
          )
          .optional()?;

        if let Some(ref account) = raw {
          conn.execute(
            "UPDATE accounts
             SET password_hash = ?1, invite_token = NULL
             WHERE account_id = ?2",
            rusqlite::params![hash, account.account_id],
          )?;
        }
        Ok(raw)
      })
      .await?;

    raw.map(RawAccount::into_account).transpose()
  }

  async fn verify_credentials(
    &self,
    email: &str,
    password: &str,
  ) -> Result<Option<IdentityAccount>> {
    let email_owned = email.to_owned();
    let found: Option<(RawAccount, Option<String>)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {ACCOUNT_COLUMNS}, password_hash
                 FROM accounts WHERE email = ?1"
              ),
              rusqlite::params![email_owned],
              |row| Ok((raw_account_from_row(row)?, row.get(4)?)),
            )
            .optional()?,
        )
      })
      .await?;

    let Some((raw, Some(hash))) = found else {
      // Unknown email or credentials never set.
      return Ok(None);
    };

    let parsed = PasswordHash::new(&hash)
      .map_err(|e| Error::PasswordHash(e.to_string()))?;
    if Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_err()
    {
      return Ok(None);
    }

    let now = Utc::now();
    let id_str = raw.account_id.clone();
    let now_str = encode_dt(now);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE accounts SET last_sign_in_at = ?1 WHERE account_id = ?2",
          rusqlite::params![now_str, id_str],
        )?;
        Ok(())
      })
      .await?;

    let mut account = raw.into_account()?;
    account.last_sign_in_at = Some(now);
    Ok(Some(account))
  }
}

// ─── ProfileStore impl ───────────────────────────────────────────────────────

impl ProfileStore for SqliteStore {
  type Error = Error;

  async fn find_by_email(
    &self,
    category: Category,
    email: &str,
  ) -> Result<Option<Profile>> {
    self
      .fetch_profile_where(category, "email = ?1", email.to_owned())
      .await
  }

  async fn insert_profile(&self, profile: NewProfile) -> Result<Profile> {
    let category = profile.category;
    let tbl = table(category);
    let created_at = Utc::now();

    let email = profile.email.clone();
    let last_name = profile.last_name.clone();
    let first_name = profile.first_name.clone();
    let is_admin = profile.is_admin;
    let account_id_str = profile.account_id.map(encode_uuid);
    let at_str = encode_dt(created_at);
    let personal_email = profile.personal_email.clone();
    let phone = profile.phone.clone();
    let class_year = profile.class_year.clone();
    let status = profile.status.clone();
    let avatar_url = profile.avatar_url.clone();
    let schools_str = encode_list(&profile.schools)?;
    let professions_str = encode_list(&profile.professions)?;
    let subjects_str = encode_list(&profile.subjects)?;

    let email_for_check = email.clone();
    // The max-id read and the insert run in one transaction on the store's
    // single connection, so concurrent batches cannot observe the same max
    // and race on the next id.
    let assigned: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists: bool = tx
          .query_row(
            &format!("SELECT 1 FROM {tbl} WHERE email = ?1"),
            rusqlite::params![email_for_check],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if exists {
          return Ok(None);
        }

        let next_id: i64 = tx.query_row(
          &format!("SELECT COALESCE(MAX(id), 0) + 1 FROM {tbl}"),
          [],
          |row| row.get(0),
        )?;

        tx.execute(
          &format!(
            "INSERT INTO {tbl} (
               id, email, last_name, first_name, is_admin,
               account_id, created_at, personal_email, phone, class_year,
               status, avatar_url, schools, professions, subjects
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10,
                       ?11, ?12, ?13, ?14, ?15)"
          ),
          rusqlite::params![
            next_id,
            email,
            last_name,
            first_name,
            is_admin,
            account_id_str,
            at_str,
            personal_email,
            phone,
            class_year,
            status,
            avatar_url,
            schools_str,
            professions_str,
            subjects_str,
          ],
        )?;

        tx.commit()?;
        Ok(Some(next_id))
      })
      .await?;

    let Some(id) = assigned else {
      return Err(Error::DuplicateProfile {
        category,
        email: profile.email,
      });
    };

    Ok(Profile {
      id,
      category,
      email: profile.email,
      last_name: profile.last_name,
      first_name: profile.first_name,
      is_admin: profile.is_admin,
      account_id: profile.account_id,
      created_at,
      personal_email: profile.personal_email,
      phone: profile.phone,
      class_year: profile.class_year,
      status: profile.status,
      avatar_url: profile.avatar_url,
      schools: profile.schools,
      professions: profile.professions,
      subjects: profile.subjects,
    })
  }

  async fn get_profile(
    &self,
    category: Category,
    id: i64,
  ) -> Result<Option<Profile>> {
    self.fetch_profile_where(category, "id = ?1", id).await
  }

  async fn find_by_account(
    &self,
    account_id: Uuid,
  ) -> Result<Option<Profile>> {
    for category in Category::ALL {
      let found = self
        .fetch_profile_where(
          category,
          "account_id = ?1",
          encode_uuid(account_id),
        )
        .await?;
      if found.is_some() {
        return Ok(found);
      }
    }
    Ok(None)
  }

  async fn list_profiles(
    &self,
    category: Option<Category>,
  ) -> Result<Vec<Profile>> {
    let categories = match category {
      Some(c) => vec![c],
      None => Category::ALL.to_vec(),
    };

    let mut profiles = Vec::new();
    for category in categories {
      let tbl = table(category);
      let raws: Vec<RawProfile> = self
        .conn
        .call(move |conn| {
          let mut stmt = conn.prepare(&format!(
            "SELECT {PROFILE_COLUMNS} FROM {tbl} ORDER BY id"
          ))?;
          let rows = stmt
            .query_map([], raw_profile_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          Ok(rows)
        })
        .await?;

      for raw in raws {
        profiles.push(raw.into_profile(category)?);
      }
    }
    Ok(profiles)
  }

  async fn search(&self, query: &ProfileQuery) -> Result<Vec<Profile>> {
    let categories = match query.category {
      Some(c) => vec![c],
      None => Category::ALL.to_vec(),
    };

    let mut profiles = Vec::new();
    for category in categories {
      profiles.extend(self.search_one(category, query).await?);
    }

    // Limit and offset apply to the merged result set.
    let offset = query.offset.unwrap_or(0);
    let limit = query.limit.unwrap_or(100);
    Ok(profiles.into_iter().skip(offset).take(limit).collect())
  }

  async fn update_profile(
    &self,
    category: Category,
    id: i64,
    update: ProfileUpdate,
  ) -> Result<Option<Profile>> {
    let tbl = table(category);
    let last_name = update.last_name;
    let first_name = update.first_name;
    let personal_email = update.personal_email;
    let phone = update.phone;
    let class_year = update.class_year;
    let status = update.status;
    let avatar_url = update.avatar_url;
    let schools_str =
      update.schools.as_deref().map(encode_list).transpose()?;
    let professions_str =
      update.professions.as_deref().map(encode_list).transpose()?;
    let subjects_str =
      update.subjects.as_deref().map(encode_list).transpose()?;

    // Patch and re-read in one transaction so a concurrent update cannot
    // slip in between and get overwritten. NULL parameters leave the
    // stored value in place, matching the partial-update contract.
    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let changed = tx.execute(
          &format!(
            "UPDATE {tbl} SET
               last_name = COALESCE(?1, last_name),
               first_name = COALESCE(?2, first_name),
               personal_email = COALESCE(?3, personal_email),
               phone = COALESCE(?4, phone),
               class_year = COALESCE(?5, class_year),
               status = COALESCE(?6, status),
               avatar_url = COALESCE(?7, avatar_url),
               schools = COALESCE(?8, schools),
               professions = COALESCE(?9, professions),
               subjects = COALESCE(?10, subjects)
             WHERE id = ?11"
          ),
          rusqlite::params![
            last_name,
            first_name,
            personal_email,
            phone,
            class_year,
            status,
            avatar_url,
            schools_str,
            professions_str,
            subjects_str,
            id,
          ],
        )?;

        let raw = if changed == 0 {
          None
        } else {
          tx.query_row(
            &format!("SELECT {PROFILE_COLUMNS} FROM {tbl} WHERE id = ?1"),
            rusqlite::params![id],
            raw_profile_from_row,
          )
          .optional()?
        };

        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(|r| r.into_profile(category)).transpose()
  }
}
