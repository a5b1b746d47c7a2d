//! Legal cases handled for a client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result, profile::UserId};

/// Workflow status of a case. Every case is in exactly one status, so counts
/// per status partition a user's case set.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
  #[default]
  New,
  InProgress,
  OnHold,
  Completed,
}

impl CaseStatus {
  /// Whether the case still shows up among a client's active cases.
  pub fn is_active(self) -> bool { self != Self::Completed }
}

/// Completion percentage, always within `0..=100`.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct Progress(u8);

impl Progress {
  pub const DONE: Self = Self(100);

  pub fn new(percent: u8) -> Result<Self> {
    if percent > 100 {
      return Err(Error::validation("progress", format!("{percent} exceeds 100")));
    }
    Ok(Self(percent))
  }

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<u8> for Progress {
  type Error = Error;

  fn try_from(value: u8) -> Result<Self> { Self::new(value) }
}

impl From<Progress> for u8 {
  fn from(p: Progress) -> Self { p.0 }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSummary {
  pub id:         Uuid,
  #[serde(skip)]
  pub owner_id:   Option<UserId>,
  pub title:      String,
  pub progress:   Progress,
  pub category:   String,
  pub status:     CaseStatus,
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::RecordStore::record_case`].
#[derive(Debug, Clone)]
pub struct NewCase {
  pub owner_id: UserId,
  pub title:    String,
  pub category: String,
  pub status:   CaseStatus,
  pub progress: Progress,
}

impl NewCase {
  pub fn new(
    owner_id: UserId,
    title: impl Into<String>,
    category: impl Into<String>,
  ) -> Self {
    Self {
      owner_id,
      title: title.into(),
      category: category.into(),
      status: CaseStatus::default(),
      progress: Progress::default(),
    }
  }
}

/// A progress report for an existing case. Progress may only move forward;
/// `status` is left unchanged when `None`.
#[derive(Debug, Clone, Copy)]
pub struct CaseUpdate {
  pub progress: Progress,
  pub status:   Option<CaseStatus>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn progress_bounds() {
    assert!(Progress::new(0).is_ok());
    assert_eq!(Progress::new(100).unwrap(), Progress::DONE);
    assert!(matches!(Progress::new(101), Err(Error::Validation { .. })));
  }

  #[test]
  fn progress_deserialisation_is_checked() {
    assert!(serde_json::from_str::<Progress>("65").is_ok());
    assert!(serde_json::from_str::<Progress>("150").is_err());
  }

  #[test]
  fn status_string_forms_agree() {
    assert_eq!(CaseStatus::InProgress.as_ref(), "IN_PROGRESS");
    assert_eq!(
      serde_json::to_value(CaseStatus::OnHold).unwrap(),
      serde_json::json!("ON_HOLD")
    );
    assert_eq!("COMPLETED".parse::<CaseStatus>().unwrap(), CaseStatus::Completed);
  }
}
