//! In-process bearer-token sessions.
//!
//! Tokens are 32 random bytes, hex-encoded, handed to the client once at
//! login. Server-side only a SHA-256 digest of the token is kept, so a leaked
//! session map never yields usable tokens. Sessions live for the process
//! lifetime; a restart logs everyone out.

use std::{
  collections::HashMap,
  sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest as _, Sha256};
use uuid::Uuid;

/// What a valid token resolves to. The admin flag is captured at login time
/// from the caller's profile.
#[derive(Debug, Clone)]
pub struct Session {
  pub account_id: Uuid,
  pub email:      String,
  pub is_admin:   bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct SessionStore {
  sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a session and return the bearer token to hand to the client.
  pub fn issue(&self, session: Session) -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let token = hex::encode(bytes);
    self.lock().insert(digest(&token), session);
    token
  }

  /// Resolve a bearer token to its session, if any.
  pub fn get(&self, token: &str) -> Option<Session> {
    self.lock().get(&digest(token)).cloned()
  }

  /// Drop the session for `token`. Returns whether one existed.
  pub fn revoke(&self, token: &str) -> bool {
    self.lock().remove(&digest(token)).is_some()
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
    self.sessions.lock().unwrap_or_else(|e| e.into_inner())
  }
}

fn digest(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}
