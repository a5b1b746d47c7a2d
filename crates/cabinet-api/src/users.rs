//! Handlers for `/users` endpoints.
//!
//! | Method  | Path | Notes |
//! |---------|------|-------|
//! | `GET`   | `/users/me` | The bearer's profile; the demo profile when anonymous |
//! | `GET`   | `/users/{id}` | 404 if not found |
//! | `PATCH` | `/users/{id}` | Body: any subset of [`ProfileEdit`]; 403 for another bearer |
//!
//! Subscription fields are written by billing, never by the client, so a
//! `PATCH` body naming them is rejected.

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
};
use cabinet_core::profile::{ProfileChanges, UserId, UserProfile};
use serde::{Deserialize, Serialize};

use crate::{ApiState, Backend, auth::Caller, error::ApiError};

/// A profile as sent over the wire, with its computed display name.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileBody {
  #[serde(flatten)]
  pub profile:      UserProfile,
  pub display_name: String,
}

impl From<UserProfile> for ProfileBody {
  fn from(profile: UserProfile) -> Self {
    Self { display_name: profile.display_name(), profile }
  }
}

// ─── Me ──────────────────────────────────────────────────────────────────────

/// `GET /users/me`
pub async fn me<S: Backend>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
) -> Result<Json<ProfileBody>, ApiError> {
  let id = caller.unwrap_or_else(|| state.config.demo_user_id.clone());
  let profile = state.profiles.get_profile(&id).await?;
  Ok(Json(profile.into()))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /users/{id}`
pub async fn get_one<S: Backend>(
  State(state): State<ApiState<S>>,
  Path(id): Path<String>,
) -> Result<Json<ProfileBody>, ApiError> {
  let profile = state.profiles.get_profile(&UserId::from(id)).await?;
  Ok(Json(profile.into()))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// The client-editable profile fields. An empty string clears an optional
/// field.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProfileEdit {
  pub first_name:   Option<String>,
  pub last_name:    Option<String>,
  pub phone:        Option<String>,
  pub company_name: Option<String>,
  pub inn:          Option<String>,
}

impl From<ProfileEdit> for ProfileChanges {
  fn from(edit: ProfileEdit) -> Self {
    Self {
      first_name: edit.first_name,
      last_name: edit.last_name,
      phone: edit.phone,
      company_name: edit.company_name,
      inn: edit.inn,
      ..Self::default()
    }
  }
}

/// `PATCH /users/{id}`
pub async fn update<S: Backend>(
  State(state): State<ApiState<S>>,
  Caller(caller): Caller,
  Path(id): Path<String>,
  payload: Result<Json<ProfileEdit>, JsonRejection>,
) -> Result<Json<ProfileBody>, ApiError> {
  let id = UserId::from(id);

  // Anonymous edits are the demo flow; a bearer may only edit itself.
  if caller.as_ref().is_some_and(|caller| *caller != id) {
    return Err(ApiError::Forbidden("a profile can only be edited by its owner"));
  }

  // An unknown id wins over a malformed body.
  let changes = match payload {
    Ok(Json(edit)) => ProfileChanges::from(edit),
    Err(rejection) => {
      state.profiles.get_profile(&id).await?;
      return Err(rejection.into());
    }
  };

  let profile = state.profiles.update_profile(&id, changes).await?;
  tracing::info!(user_id = %id, "updated profile");
  Ok(Json(profile.into()))
}
