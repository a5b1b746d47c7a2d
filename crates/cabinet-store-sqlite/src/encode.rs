//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 UTC strings (microsecond
//! precision, `Z` suffix) so that lexical order in SQL equals time order.
//! Enumerations are stored as their `SCREAMING_SNAKE_CASE` names. UUIDs are
//! stored as hyphenated lowercase strings.

use std::str::FromStr;

use cabinet_core::{
  billing::Invoice,
  case::{CaseSummary, Progress},
  document::DocumentSummary,
  lawyer::AssignedLawyer,
  profile::{UserId, UserProfile},
  request::ServiceRequest,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(d: NaiveDate) -> String { d.format("%Y-%m-%d").to_string() }

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| Error::DateParse(e.to_string()))
}

/// Parse a column written with the enum's `AsRef<str>` form.
pub fn decode_enum<T: FromStr>(column: &'static str, s: &str) -> Result<T> {
  s.parse().map_err(|_| Error::Decode { column, value: s.to_owned() })
}

pub fn decode_progress(p: i64) -> Result<Progress> {
  let percent = u8::try_from(p).map_err(|_| Error::Decode {
    column: "progress",
    value:  p.to_string(),
  })?;
  Ok(Progress::new(percent)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

pub const PROFILE_COLUMNS: &str = "user_id, email, first_name, last_name, phone, \
  company_name, inn, subscription_status, subscription_expires_at, created_at";

/// Raw strings read directly from a `profiles` row.
pub struct RawProfile {
  pub user_id:                 String,
  pub email:                   String,
  pub first_name:              String,
  pub last_name:               String,
  pub phone:                   Option<String>,
  pub company_name:            Option<String>,
  pub inn:                     Option<String>,
  pub subscription_status:     String,
  pub subscription_expires_at: Option<String>,
  pub created_at:              String,
}

impl RawProfile {
  /// Reads the columns listed in [`PROFILE_COLUMNS`], in order.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:                 row.get(0)?,
      email:                   row.get(1)?,
      first_name:              row.get(2)?,
      last_name:               row.get(3)?,
      phone:                   row.get(4)?,
      company_name:            row.get(5)?,
      inn:                     row.get(6)?,
      subscription_status:     row.get(7)?,
      subscription_expires_at: row.get(8)?,
      created_at:              row.get(9)?,
    })
  }

  pub fn into_profile(self) -> Result<UserProfile> {
    Ok(UserProfile {
      user_id:                 UserId::from(self.user_id),
      email:                   self.email,
      first_name:              self.first_name,
      last_name:               self.last_name,
      phone:                   self.phone,
      company_name:            self.company_name,
      inn:                     self.inn,
      subscription_status:     decode_enum(
        "subscription_status",
        &self.subscription_status,
      )?,
      subscription_expires_at: self
        .subscription_expires_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      created_at:              decode_dt(&self.created_at)?,
    })
  }
}

pub const CASE_COLUMNS: &str =
  "case_id, owner_id, title, category, status, progress, updated_at";

pub struct RawCase {
  pub case_id:    String,
  pub owner_id:   String,
  pub title:      String,
  pub category:   String,
  pub status:     String,
  pub progress:   i64,
  pub updated_at: String,
}

impl RawCase {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      case_id:    row.get(0)?,
      owner_id:   row.get(1)?,
      title:      row.get(2)?,
      category:   row.get(3)?,
      status:     row.get(4)?,
      progress:   row.get(5)?,
      updated_at: row.get(6)?,
    })
  }

  pub fn into_case(self) -> Result<CaseSummary> {
    Ok(CaseSummary {
      id:         decode_uuid(&self.case_id)?,
      owner_id:   Some(UserId::from(self.owner_id)),
      title:      self.title,
      progress:   decode_progress(self.progress)?,
      category:   self.category,
      status:     decode_enum("cases.status", &self.status)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub const DOCUMENT_COLUMNS: &str =
  "document_id, owner_id, name, doc_type, status, category, created_at";

pub struct RawDocument {
  pub document_id: String,
  pub owner_id:    String,
  pub name:        String,
  pub doc_type:    String,
  pub status:      String,
  pub category:    String,
  pub created_at:  String,
}

impl RawDocument {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      document_id: row.get(0)?,
      owner_id:    row.get(1)?,
      name:        row.get(2)?,
      doc_type:    row.get(3)?,
      status:      row.get(4)?,
      category:    row.get(5)?,
      created_at:  row.get(6)?,
    })
  }

  pub fn into_document(self) -> Result<DocumentSummary> {
    Ok(DocumentSummary {
      id:         decode_uuid(&self.document_id)?,
      owner_id:   Some(UserId::from(self.owner_id)),
      name:       self.name,
      doc_type:   decode_enum("documents.doc_type", &self.doc_type)?,
      status:     decode_enum("documents.status", &self.status)?,
      category:   self.category,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

pub const INVOICE_COLUMNS: &str =
  "invoice_id, owner_id, number, description, amount, status, issued_on, created_at";

pub struct RawInvoice {
  pub invoice_id:  String,
  pub owner_id:    String,
  pub number:      String,
  pub description: String,
  pub amount:      i64,
  pub status:      String,
  pub issued_on:   String,
  pub created_at:  String,
}

impl RawInvoice {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      invoice_id:  row.get(0)?,
      owner_id:    row.get(1)?,
      number:      row.get(2)?,
      description: row.get(3)?,
      amount:      row.get(4)?,
      status:      row.get(5)?,
      issued_on:   row.get(6)?,
      created_at:  row.get(7)?,
    })
  }

  pub fn into_invoice(self) -> Result<Invoice> {
    Ok(Invoice {
      id:          decode_uuid(&self.invoice_id)?,
      owner_id:    Some(UserId::from(self.owner_id)),
      number:      self.number,
      description: self.description,
      amount:      u64::try_from(self.amount).map_err(|_| Error::Decode {
        column: "invoices.amount",
        value:  self.amount.to_string(),
      })?,
      status:      decode_enum("invoices.status", &self.status)?,
      issued_on:   decode_date(&self.issued_on)?,
      created_at:  decode_dt(&self.created_at)?,
    })
  }
}

pub const REQUEST_COLUMNS: &str =
  "request_id, owner_id, title, service_type, status, price, created_at, updated_at";

pub struct RawRequest {
  pub request_id:   String,
  pub owner_id:     String,
  pub title:        String,
  pub service_type: String,
  pub status:       String,
  pub price:        Option<i64>,
  pub created_at:   String,
  pub updated_at:   String,
}

impl RawRequest {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      request_id:   row.get(0)?,
      owner_id:     row.get(1)?,
      title:        row.get(2)?,
      service_type: row.get(3)?,
      status:       row.get(4)?,
      price:        row.get(5)?,
      created_at:   row.get(6)?,
      updated_at:   row.get(7)?,
    })
  }

  pub fn into_request(self) -> Result<ServiceRequest> {
    let price = self
      .price
      .map(|p| {
        u64::try_from(p).map_err(|_| Error::Decode {
          column: "service_requests.price",
          value:  p.to_string(),
        })
      })
      .transpose()?;

    Ok(ServiceRequest {
      id:           decode_uuid(&self.request_id)?,
      owner_id:     Some(UserId::from(self.owner_id)),
      title:        self.title,
      service_type: self.service_type,
      status:       decode_enum("service_requests.status", &self.status)?,
      price,
      created_at:   decode_dt(&self.created_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}

/// The assigned-lawyer columns `name, avatar, is_online`.
pub struct RawLawyer {
  pub name:      String,
  pub avatar:    Option<String>,
  pub is_online: bool,
}

impl RawLawyer {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      name:      row.get(0)?,
      avatar:    row.get(1)?,
      is_online: row.get(2)?,
    })
  }

  pub fn into_assigned(self) -> AssignedLawyer {
    AssignedLawyer { name: self.name, avatar: self.avatar, is_online: self.is_online }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_lexically() {
    let early = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
    let late = early + chrono::Duration::milliseconds(1500);
    let (a, b) = (encode_dt(early), encode_dt(late));
    assert_eq!(a.len(), b.len());
    assert!(a < b);
    assert_eq!(decode_dt(&b).unwrap(), late);
  }

  #[test]
  fn progress_out_of_range_is_rejected() {
    assert!(decode_progress(100).is_ok());
    assert!(decode_progress(101).is_err());
    assert!(decode_progress(-1).is_err());
  }
}
