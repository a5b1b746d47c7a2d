//! Credential and bearer-token types.
//!
//! Token minting and password hashing live with the HTTP layer; the store only
//! ever sees password hashes and token digests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::profile::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum TokenKind {
  Access,
  Refresh,
}

/// Login body for `POST /auth/jwt/create`.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
  pub email:    String,
  pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
  pub access:  String,
  pub refresh: String,
}

/// A token as persisted: only the digest of the bearer secret is kept.
#[derive(Debug, Clone)]
pub struct StoredToken {
  pub digest:     String,
  pub user_id:    UserId,
  pub kind:       TokenKind,
  pub issued_at:  DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
}

/// A user's login record as returned by
/// [`crate::store::CredentialStore::credentials_for`].
#[derive(Debug, Clone)]
pub struct LoginRecord {
  pub user_id:       UserId,
  /// PHC string, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
}
