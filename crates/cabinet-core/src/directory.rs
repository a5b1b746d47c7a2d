//! The Profile Provider: reads and updates identity records.

use std::sync::Arc;

use crate::{
  Error, Result,
  profile::{NewProfile, ProfileChanges, UserId, UserProfile},
  store::{CredentialStore, ProfileStore},
};

/// Owns profile lookups and mutations on top of a [`ProfileStore`].
pub struct Profiles<S> {
  store: Arc<S>,
}

impl<S> Clone for Profiles<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: ProfileStore> Profiles<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  pub async fn get_profile(&self, id: &UserId) -> Result<UserProfile> {
    self
      .store
      .get_profile(id.clone())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::ProfileNotFound(id.clone()))
  }

  /// Apply only the supplied fields. Unknown ids are reported before any
  /// field is validated.
  pub async fn update_profile(
    &self,
    id: &UserId,
    changes: ProfileChanges,
  ) -> Result<UserProfile> {
    let current = self.get_profile(id).await?;
    let patch = changes.validate()?;
    if patch.is_empty() {
      return Ok(current);
    }

    self
      .store
      .update_profile(id.clone(), patch)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::ProfileNotFound(id.clone()))
  }
}

impl<S: ProfileStore + CredentialStore> Profiles<S> {
  /// Create a profile for a new account together with its password hash.
  /// A taken email is a conflict even when two registrations race.
  pub async fn register(
    &self,
    input: NewProfile,
    password_hash: String,
  ) -> Result<UserProfile> {
    let input = input.validated()?;
    let profile = self
      .store
      .create_account(input, password_hash)
      .await
      .map_err(Error::store)??;
    Ok(profile)
  }
}
