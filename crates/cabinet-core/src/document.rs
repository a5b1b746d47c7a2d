//! Client documents, as seen by the dashboard. Documents are managed by a
//! separate document workflow; here they are read-only summaries.

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
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
  Pdf,
  Doc,
  Contract,
  Claim,
  Statute,
  Other,
}

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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
  #[default]
  Draft,
  Review,
  Signed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
  pub id:         Uuid,
  #[serde(skip)]
  pub owner_id:   Option<UserId>,
  /// File name as uploaded.
  pub name:       String,
  #[serde(rename = "type")]
  pub doc_type:   DocumentType,
  pub status:     DocumentStatus,
  pub category:   String,
  pub created_at: DateTime<Utc>,
}

/// Input to [`crate::store::RecordStore::record_document`].
#[derive(Debug, Clone)]
pub struct NewDocument {
  pub owner_id: UserId,
  pub name:     String,
  pub doc_type: DocumentType,
  pub status:   DocumentStatus,
  pub category: String,
}
