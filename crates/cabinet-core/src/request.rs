//! Service requests ("tickets") a client opens with the firm: a registration,
//! a contract review, a consultation. Each carries a service type and, once
//! quoted, a price.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::profile::UserId;

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RequestStatus {
  #[default]
  Pending,
  InProgress,
  /// Waiting on the client.
  WaitingUser,
  Done,
  Canceled,
}

impl RequestStatus {
  /// The label shown to clients.
  pub fn label(self) -> &'static str {
    match self {
      Self::Pending => "На рассмотрении",
      Self::InProgress => "В работе",
      Self::WaitingUser => "Ждем ответа",
      Self::Done => "Готово",
      Self::Canceled => "Отменено",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
  pub id:           Uuid,
  #[serde(skip)]
  pub owner_id:     Option<UserId>,
  pub title:        String,
  pub service_type: String,
  pub status:       RequestStatus,
  /// Whole roubles; `None` until the request is quoted.
  pub price:        Option<u64>,
  pub created_at:   DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

/// Input to [`crate::store::RecordStore::record_request`].
#[derive(Debug, Clone)]
pub struct NewServiceRequest {
  pub owner_id:     UserId,
  pub title:        String,
  pub service_type: String,
  pub status:       RequestStatus,
  pub price:        Option<u64>,
}

#[cfg(test)]
mod tests {
  use strum::IntoEnumIterator;

  use super::*;

  #[test]
  fn status_forms_agree() {
    assert_eq!(RequestStatus::WaitingUser.as_ref(), "waiting_user");
    assert_eq!(
      serde_json::to_value(RequestStatus::InProgress).unwrap(),
      serde_json::json!("in_progress")
    );
    assert_eq!("DONE".parse::<RequestStatus>().unwrap(), RequestStatus::Done);
    assert!("all".parse::<RequestStatus>().is_err());
  }

  #[test]
  fn every_status_has_a_label() {
    assert!(RequestStatus::iter().all(|s| !s.label().is_empty()));
  }
}
