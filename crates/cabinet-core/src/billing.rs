//! Invoices issued to a client. Outstanding invoices drive the
//! `pendingPayments` dashboard statistic.

use chrono::{DateTime, NaiveDate, Utc};
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
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
  #[default]
  Unpaid,
  Pending,
  Paid,
}

impl InvoiceStatus {
  /// Unpaid and in-flight invoices both count as awaiting payment.
  pub fn is_outstanding(self) -> bool { self != Self::Paid }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
  pub id:          Uuid,
  #[serde(skip)]
  pub owner_id:    Option<UserId>,
  pub number:      String,
  pub description: String,
  /// Whole roubles.
  pub amount:      u64,
  pub status:      InvoiceStatus,
  pub issued_on:   NaiveDate,
  pub created_at:  DateTime<Utc>,
}

/// Input to [`crate::store::RecordStore::record_invoice`].
#[derive(Debug, Clone)]
pub struct NewInvoice {
  pub owner_id:    UserId,
  pub number:      String,
  pub description: String,
  pub amount:      u64,
  pub status:      InvoiceStatus,
  pub issued_on:   NaiveDate,
}
