//! Lawyers and the per-client assignment shown on the dashboard.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lawyer {
  pub lawyer_id: Uuid,
  pub name:      String,
  pub avatar:    Option<String>,
  pub is_online: bool,
}

/// Input to [`crate::store::RecordStore::add_lawyer`].
#[derive(Debug, Clone)]
pub struct NewLawyer {
  pub name:      String,
  pub avatar:    Option<String>,
  pub is_online: bool,
}

/// The lawyer card embedded in a dashboard summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedLawyer {
  pub name:      String,
  pub avatar:    Option<String>,
  pub is_online: bool,
}

impl From<Lawyer> for AssignedLawyer {
  fn from(l: Lawyer) -> Self {
    Self { name: l.name, avatar: l.avatar, is_online: l.is_online }
  }
}
