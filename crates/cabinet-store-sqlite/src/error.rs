//! Error type for `cabinet-store-sqlite`.

use cabinet_core::profile::UserId;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] cabinet_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value outside its enumeration.
  #[error("cannot decode {column}: {value:?}")]
  Decode {
    column: &'static str,
    value:  String,
  },

  #[error("profile not found: {0}")]
  ProfileNotFound(UserId),

  #[error("case not found: {0}")]
  CaseNotFound(Uuid),

  #[error("lawyer not found: {0}")]
  LawyerNotFound(Uuid),

  #[error("progress of case {case_id} cannot move from {current} to {requested}")]
  ProgressRegression {
    case_id:   Uuid,
    current:   u8,
    requested: u8,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
