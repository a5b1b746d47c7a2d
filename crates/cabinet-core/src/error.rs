//! Error types for `cabinet-core`.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::profile::{ProfileConflict, UserId};

#[derive(Debug, Error)]
pub enum Error {
  #[error("profile not found: {0}")]
  ProfileNotFound(UserId),

  #[error("case not found: {0}")]
  CaseNotFound(Uuid),

  #[error("lawyer not found: {0}")]
  LawyerNotFound(Uuid),

  #[error("invalid {field}: {message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  #[error("profile id already exists: {0}")]
  ProfileExists(UserId),

  #[error("email is already registered: {0}")]
  EmailTaken(String),

  #[error("progress of case {case_id} cannot move from {current} to {requested}")]
  ProgressRegression {
    case_id:   Uuid,
    current:   u8,
    requested: u8,
  },

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// The coarse category of an [`Error`], used for the wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  NotFound,
  Validation,
  Conflict,
  Internal,
}

impl Error {
  pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation { field, message: message.into() }
  }

  /// Box a backend error.
  pub fn store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(err))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Self::ProfileNotFound(_)
      | Self::CaseNotFound(_)
      | Self::LawyerNotFound(_) => ErrorKind::NotFound,
      Self::Validation { .. } => ErrorKind::Validation,
      Self::ProfileExists(_)
      | Self::EmailTaken(_)
      | Self::ProgressRegression { .. } => ErrorKind::Conflict,
      Self::Store(_) => ErrorKind::Internal,
    }
  }
}

impl From<ProfileConflict> for Error {
  fn from(conflict: ProfileConflict) -> Self {
    match conflict {
      ProfileConflict::IdTaken(id) => Self::ProfileExists(id),
      ProfileConflict::EmailTaken(email) => Self::EmailTaken(email),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
