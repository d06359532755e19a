//! Batch provisioning — reconcile pasted roster lines against the identity
//! store and the directory tables.
//!
//! One batch: parse all lines up front, fetch the identity account list
//! exactly once, then process lines sequentially in input order. Per-line
//! failures become report entries; only failing to list accounts at all
//! aborts the batch.

use uuid::Uuid;

use crate::{
  category::Category,
  error::BatchError,
  identity::IdentityAccount,
  profile::NewProfile,
  report::Report,
  roster::{self, ProvisioningRecord},
  store::{IdentityStore, ProfileStore},
};

/// Outcome of reconciling one record against its category table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
  /// A new row was written with the given store-assigned id.
  Created(i64),
  /// A row for (category, email) already existed; nothing was written.
  AlreadyPresent,
}

/// Run one provisioning batch over `input` and return the ordered report.
///
/// Lines are processed one at a time; there is no parallelism, no
/// cancellation, and no partial streaming — administrators read the report
/// top-to-bottom against their pasted input.
pub async fn run_batch<I, P>(
  identity: &I,
  profiles: &P,
  input: &str,
  default_category: Option<Category>,
) -> Result<Vec<String>, BatchError>
where
  I: IdentityStore,
  P: ProfileStore,
{
  let lines = roster::parse_roster(input, default_category);
  let mut report = Report::new();

  // One round trip for the whole batch. This is also the only fatal
  // failure point; nothing has been written yet when it fires.
  let mut accounts = identity
    .list_accounts()
    .await
    .map_err(|e| BatchError::IdentityStore(Box::new(e)))?;

  for line in lines {
    let record = match line.parsed {
      Ok(record) => record,
      Err(e) => {
        report.failure(format!("{e}: {raw:?}", raw = line.raw));
        continue;
      }
    };

    report.info(format!(
      "processing {} {} ({}) [{}]",
      record.last_name,
      record.first_name,
      record.email,
      record.category.code(),
    ));

    let account_id = match resolve_identity(
      identity,
      &mut accounts,
      &record.email,
      &mut report,
    )
    .await
    {
      Some(id) => id,
      // Creation failure was reported; no profile row for this line.
      None => continue,
    };

    match reconcile(profiles, &record, account_id).await {
      Ok(Reconciliation::AlreadyPresent) => {
        report.info(format!(
          "already present in {} directory, skipped",
          record.category
        ));
      }
      Ok(Reconciliation::Created(id)) => {
        report.success(format!(
          "added to {} directory (id {id})",
          record.category
        ));
      }
      Err(e) => {
        report.failure(format!(
          "insert into {} directory failed: {e}",
          record.category
        ));
      }
    }
  }

  Ok(report.into_lines())
}

/// Find `email` in the prefetched account list, creating an account when
/// absent. Newly created accounts are appended to the list so a later line
/// with the same email resolves to them instead of re-creating.
///
/// Returns `None` after reporting a creation failure.
async fn resolve_identity<I: IdentityStore>(
  identity: &I,
  accounts: &mut Vec<IdentityAccount>,
  email: &str,
  report: &mut Report,
) -> Option<Uuid> {
  if let Some(existing) = accounts.iter().find(|a| a.email == email) {
    return Some(existing.account_id);
  }

  report.info(format!("creating account for {email}"));
  match identity.create_account(email).await {
    Ok(account) => {
      report.info(format!("invitation issued for {email}"));
      let account_id = account.account_id;
      accounts.push(account);
      Some(account_id)
    }
    Err(e) => {
      report.failure(format!("account creation failed for {email}: {e}"));
      None
    }
  }
}

/// Ensure exactly one profile row exists for (category, email).
///
/// Rows created here always have `is_admin = false`; administrators are
/// promoted out of band, never through bulk import.
pub async fn reconcile<P: ProfileStore>(
  profiles: &P,
  record: &ProvisioningRecord,
  account_id: Uuid,
) -> Result<Reconciliation, P::Error> {
  if profiles
    .find_by_email(record.category, &record.email)
    .await?
    .is_some()
  {
    return Ok(Reconciliation::AlreadyPresent);
  }

  let mut new_profile = NewProfile::new(
    record.category,
    record.email.clone(),
    record.last_name.clone(),
    record.first_name.clone(),
  );
  new_profile.account_id = Some(account_id);

  let profile = profiles.insert_profile(new_profile).await?;
  Ok(Reconciliation::Created(profile.id))
}

#[cfg(test)]
mod tests {
  use std::sync::Mutex;

  use chrono::Utc;
  use thiserror::Error;
  use uuid::Uuid;

  use super::*;
  use crate::{
    profile::{Profile, ProfileUpdate},
    report::{FAILURE_PREFIX, INFO_PREFIX, SUCCESS_PREFIX},
    store::ProfileQuery,
  };

  #[derive(Debug, Error)]
  #[error("{0}")]
  struct MemError(String);

  // ── In-memory identity store ──────────────────────────────────────────

  #[derive(Default)]
  struct MemIdentity {
    accounts:    Mutex<Vec<IdentityAccount>>,
    fail_list:   bool,
    fail_create: bool,
    creates:     Mutex<usize>,
  }

  impl MemIdentity {
    fn with_account(email: &str) -> Self {
      let store = Self::default();
      store.accounts.lock().unwrap().push(IdentityAccount {
        account_id:      Uuid::new_v4(),
        email:           email.to_owned(),
        created_at:      Utc::now(),
        last_sign_in_at: None,
      });
      store
    }
  }

  impl IdentityStore for MemIdentity {
    type Error = MemError;

    async fn list_accounts(&self) -> Result<Vec<IdentityAccount>, MemError> {
      if self.fail_list {
        return Err(MemError("identity store offline".into()));
      }
      Ok(self.accounts.lock().unwrap().clone())
    }

    async fn create_account(
      &self,
      email: &str,
    ) -> Result<IdentityAccount, MemError> {
      *self.creates.lock().unwrap() += 1;
      if self.fail_create {
        return Err(MemError("creation rejected".into()));
      }
      let account = IdentityAccount {
        account_id:      Uuid::new_v4(),
        email:           email.to_owned(),
        created_at:      Utc::now(),
        last_sign_in_at: None,
      };
      self.accounts.lock().unwrap().push(account.clone());
      Ok(account)
    }

    async fn invite_token(
      &self,
      _account_id: Uuid,
    ) -> Result<Option<String>, MemError> {
      Ok(None)
    }

    async fn set_password_with_token(
      &self,
      _token: &str,
      _password: &str,
    ) -> Result<Option<IdentityAccount>, MemError> {
      Ok(None)
    }

    async fn verify_credentials(
      &self,
      _email: &str,
      _password: &str,
    ) -> Result<Option<IdentityAccount>, MemError> {
      Ok(None)
    }
  }

  // ── In-memory profile store ───────────────────────────────────────────

  #[derive(Default)]
  struct MemProfiles {
    rows:        Mutex<Vec<Profile>>,
    fail_insert: bool,
  }

  impl MemProfiles {
    fn rows(&self) -> Vec<Profile> {
      self.rows.lock().unwrap().clone()
    }
  }

  impl ProfileStore for MemProfiles {
    type Error = MemError;

    async fn find_by_email(
      &self,
      category: Category,
      email: &str,
    ) -> Result<Option<Profile>, MemError> {
      Ok(
        self
          .rows
          .lock()
          .unwrap()
          .iter()
          .find(|p| p.category == category && p.email == email)
          .cloned(),
      )
    }

    async fn insert_profile(
      &self,
      profile: NewProfile,
    ) -> Result<Profile, MemError> {
      if self.fail_insert {
        return Err(MemError("constraint violation".into()));
      }
      let mut rows = self.rows.lock().unwrap();
      let next_id = rows
        .iter()
        .filter(|p| p.category == profile.category)
        .map(|p| p.id)
        .max()
        .unwrap_or(0)
        + 1;
      let row = Profile {
        id:             next_id,
        category:       profile.category,
        email:          profile.email,
        last_name:      profile.last_name,
        first_name:     profile.first_name,
        is_admin:       profile.is_admin,
        account_id:     profile.account_id,
        created_at:     Utc::now(),
        personal_email: profile.personal_email,
        phone:          profile.phone,
        class_year:     profile.class_year,
        status:         profile.status,
        avatar_url:     profile.avatar_url,
        schools:        profile.schools,
        professions:    profile.professions,
        subjects:       profile.subjects,
      };
      rows.push(row.clone());
      Ok(row)
    }

    async fn get_profile(
      &self,
      category: Category,
      id: i64,
    ) -> Result<Option<Profile>, MemError> {
      Ok(
        self
          .rows
          .lock()
          .unwrap()
          .iter()
          .find(|p| p.category == category && p.id == id)
          .cloned(),
      )
    }

    async fn find_by_account(
      &self,
      account_id: Uuid,
    ) -> Result<Option<Profile>, MemError> {
      let rows = self.rows.lock().unwrap();
      for category in Category::ALL {
        if let Some(row) = rows
          .iter()
          .find(|p| p.category == category && p.account_id == Some(account_id))
        {
          return Ok(Some(row.clone()));
        }
      }
      Ok(None)
    }

    async fn list_profiles(
      &self,
      category: Option<Category>,
    ) -> Result<Vec<Profile>, MemError> {
      Ok(
        self
          .rows
          .lock()
          .unwrap()
          .iter()
          .filter(|p| category.is_none_or(|c| p.category == c))
          .cloned()
          .collect(),
      )
    }

    async fn search(
      &self,
      _query: &ProfileQuery,
    ) -> Result<Vec<Profile>, MemError> {
      Ok(self.rows())
    }

    async fn update_profile(
      &self,
      _category: Category,
      _id: i64,
      _update: ProfileUpdate,
    ) -> Result<Option<Profile>, MemError> {
      Ok(None)
    }
  }

  // ── Tests ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn single_line_creates_account_and_profile() {
    let identity = MemIdentity::default();
    let profiles = MemProfiles::default();

    let report = run_batch(
      &identity,
      &profiles,
      "Doe;Jane;jane.doe@example.org;E",
      None,
    )
    .await
    .unwrap();

    // processing + creating account + invitation + success
    assert_eq!(report.len(), 4);
    assert!(report[0].starts_with(INFO_PREFIX));
    assert!(report[1].contains("creating account"));
    assert!(report[2].contains("invitation issued"));
    assert!(report[3].starts_with(SUCCESS_PREFIX));

    let rows = profiles.rows();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, 1);
    assert_eq!(rows[0].category, Category::Student);
    assert_eq!(rows[0].email, "jane.doe@example.org");
    assert!(!rows[0].is_admin);
    assert!(rows[0].account_id.is_some());
  }

  #[tokio::test]
  async fn resubmission_is_idempotent() {
    let identity = MemIdentity::default();
    let profiles = MemProfiles::default();
    let input = "Doe;Jane;jane.doe@example.org;E";

    run_batch(&identity, &profiles, input, None).await.unwrap();
    let report = run_batch(&identity, &profiles, input, None).await.unwrap();

    assert_eq!(profiles.rows().len(), 1);
    let last = report.last().unwrap();
    assert!(last.starts_with(INFO_PREFIX), "last line: {last}");
    assert!(last.contains("already present"), "last line: {last}");
  }

  #[tokio::test]
  async fn existing_account_is_reused() {
    let identity = MemIdentity::with_account("jane.doe@example.org");
    let profiles = MemProfiles::default();

    let report = run_batch(
      &identity,
      &profiles,
      "Doe;Jane;jane.doe@example.org;E",
      None,
    )
    .await
    .unwrap();

    assert_eq!(*identity.creates.lock().unwrap(), 0);
    // processing + success only; no account-creation lines.
    assert_eq!(report.len(), 2);
    assert_eq!(profiles.rows().len(), 1);
  }

  #[tokio::test]
  async fn duplicate_email_within_one_batch_creates_one_account() {
    let identity = MemIdentity::default();
    let profiles = MemProfiles::default();

    // Same email provisioned into both categories in one batch.
    let input = "Doe;Jane;jane@example.org;E\nDoe;Jane;jane@example.org;P";
    run_batch(&identity, &profiles, input, None).await.unwrap();

    assert_eq!(*identity.creates.lock().unwrap(), 1);
    assert_eq!(profiles.rows().len(), 2);
  }

  #[tokio::test]
  async fn malformed_line_reports_failure_without_mutation() {
    let identity = MemIdentity::default();
    let profiles = MemProfiles::default();

    let report =
      run_batch(&identity, &profiles, "Doe;Jane", None).await.unwrap();

    assert_eq!(report.len(), 1);
    assert!(report[0].starts_with(FAILURE_PREFIX));
    assert!(profiles.rows().is_empty());
    assert_eq!(*identity.creates.lock().unwrap(), 0);
  }

  #[tokio::test]
  async fn bad_line_does_not_abort_the_batch() {
    let identity = MemIdentity::default();
    let profiles = MemProfiles::default();

    let input = "garbage\nDoe;Jane;jane@example.org;E";
    let report = run_batch(&identity, &profiles, input, None).await.unwrap();

    assert!(report[0].starts_with(FAILURE_PREFIX));
    assert!(report.last().unwrap().starts_with(SUCCESS_PREFIX));
    assert_eq!(profiles.rows().len(), 1);
  }

  #[tokio::test]
  async fn account_creation_failure_skips_profile_write() {
    let identity = MemIdentity {
      fail_create: true,
      ..MemIdentity::default()
    };
    let profiles = MemProfiles::default();

    let report = run_batch(
      &identity,
      &profiles,
      "Doe;Jane;jane@example.org;E",
      None,
    )
    .await
    .unwrap();

    assert!(report.last().unwrap().starts_with(FAILURE_PREFIX));
    assert!(profiles.rows().is_empty());
  }

  #[tokio::test]
  async fn insert_failure_is_reported_per_line() {
    let identity = MemIdentity::default();
    let profiles = MemProfiles {
      fail_insert: true,
      ..MemProfiles::default()
    };

    let input = "Doe;Jane;jane@example.org;E\nRoe;Rick;rick@example.org;P";
    let report = run_batch(&identity, &profiles, input, None).await.unwrap();

    let failures = report
      .iter()
      .filter(|l| l.starts_with(FAILURE_PREFIX))
      .count();
    assert_eq!(failures, 2);
    assert!(profiles.rows().is_empty());
  }

  #[tokio::test]
  async fn list_failure_aborts_whole_batch() {
    let identity = MemIdentity {
      fail_list: true,
      ..MemIdentity::default()
    };
    let profiles = MemProfiles::default();

    let result = run_batch(
      &identity,
      &profiles,
      "Doe;Jane;jane@example.org;E",
      None,
    )
    .await;

    assert!(matches!(result, Err(BatchError::IdentityStore(_))));
    assert!(profiles.rows().is_empty());
    assert_eq!(*identity.creates.lock().unwrap(), 0);
  }

  #[tokio::test]
  async fn ids_are_sequential_per_category() {
    let identity = MemIdentity::default();
    let profiles = MemProfiles::default();

    let input = "\
      A;One;one@example.org;E\n\
      B;Two;two@example.org;E\n\
      C;Three;three@example.org;P";
    run_batch(&identity, &profiles, input, None).await.unwrap();

    let rows = profiles.rows();
    let mut students: Vec<i64> = rows
      .iter()
      .filter(|p| p.category == Category::Student)
      .map(|p| p.id)
      .collect();
    students.sort_unstable();
    assert_eq!(students, vec![1, 2]);

    let staff: Vec<i64> = rows
      .iter()
      .filter(|p| p.category == Category::Staff)
      .map(|p| p.id)
      .collect();
    assert_eq!(staff, vec![1]);
  }

  #[tokio::test]
  async fn report_has_at_least_one_line_per_non_blank_input_line() {
    let identity = MemIdentity::default();
    let profiles = MemProfiles::default();

    let input = "Doe;Jane;jane@example.org;E\n\nbad line\n\nRoe;Rick;rick@example.org;P\n";
    let report = run_batch(&identity, &profiles, input, None).await.unwrap();

    let non_blank = input.lines().filter(|l| !l.trim().is_empty()).count();
    assert!(report.len() >= non_blank);
  }

  #[tokio::test]
  async fn batch_rows_are_never_admin() {
    let identity = MemIdentity::default();
    let profiles = MemProfiles::default();

    let input = "A;One;one@example.org;E\nB;Two;two@example.org;P";
    run_batch(&identity, &profiles, input, None).await.unwrap();

    assert!(profiles.rows().iter().all(|p| !p.is_admin));
  }
}
