//! The Dashboard Aggregator.
//!
//! A [`DashboardSummary`] is a read-only projection over one user's cases,
//! documents, invoices and assigned lawyer. The store hands over a consistent
//! [`DashboardSnapshot`]; [`Dashboard`] turns it into the wire payload and
//! derives the statistics, so the counts and the listed records always come
//! from the same point in time and the same owner.

use std::{collections::BTreeMap, sync::Arc};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::{
  Error, Result,
  billing::Invoice,
  case::{CaseStatus, CaseSummary, Progress},
  document::{DocumentStatus, DocumentSummary, DocumentType},
  lawyer::AssignedLawyer,
  profile::UserId,
  request::{RequestStatus, ServiceRequest},
  store::{DashboardStore, Page},
};

// ─── Statistics ──────────────────────────────────────────────────────────────

/// Case counts keyed by status. Always carries every status, zeros included,
/// so the values sum to the total number of cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseStats(BTreeMap<CaseStatus, u64>);

impl CaseStats {
  /// Build from `(status, count)` pairs; missing statuses count zero and
  /// repeated statuses accumulate.
  pub fn from_counts(counts: impl IntoIterator<Item = (CaseStatus, u64)>) -> Self {
    let mut map: BTreeMap<_, _> = CaseStatus::iter().map(|s| (s, 0)).collect();
    for (status, n) in counts {
      *map.entry(status).or_default() += n;
    }
    Self(map)
  }

  pub fn get(&self, status: CaseStatus) -> u64 {
    self.0.get(&status).copied().unwrap_or(0)
  }

  pub fn total(&self) -> u64 { self.0.values().sum() }

  pub fn iter(&self) -> impl Iterator<Item = (CaseStatus, u64)> + '_ {
    self.0.iter().map(|(s, n)| (*s, *n))
  }
}

impl Default for CaseStats {
  fn default() -> Self { Self::from_counts([]) }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
  pub total_cases:      u64,
  pub completed_cases:  u64,
  pub total_documents:  u64,
  pub pending_payments: u64,
}

impl DashboardStats {
  /// Derive the statistics from a status partition; `completed_cases` can
  /// never exceed `total_cases`.
  pub fn derive(cases: &CaseStats, documents: u64, pending_payments: u64) -> Self {
    Self {
      total_cases: cases.total(),
      completed_cases: cases.get(CaseStatus::Completed),
      total_documents: documents,
      pending_payments,
    }
  }
}

// ─── Payloads ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
  pub active_cases:     Vec<CaseSummary>,
  pub recent_documents: Vec<DocumentSummary>,
  pub stats:            DashboardStats,
  /// `null` until a lawyer has been assigned.
  pub lawyer:           Option<AssignedLawyer>,
}

/// The raw per-owner read a [`DashboardStore`] returns for a summary.
#[derive(Debug, Clone, Default)]
pub struct DashboardSnapshot {
  /// Active cases, newest update first, at most `window.cases` of them.
  pub active_cases:         Vec<CaseSummary>,
  /// Newest documents first, at most `window.documents` of them.
  pub recent_documents:     Vec<DocumentSummary>,
  /// Counts over the owner's full case set.
  pub case_counts:          CaseStats,
  pub document_count:       u64,
  pub outstanding_invoices: u64,
  pub lawyer:               Option<AssignedLawyer>,
}

/// Caps on the lists embedded in a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryWindow {
  pub cases:     usize,
  pub documents: usize,
}

impl Default for SummaryWindow {
  fn default() -> Self { Self { cases: 10, documents: 10 } }
}

// ─── Aggregator ──────────────────────────────────────────────────────────────

/// Composes per-user records into dashboard payloads.
///
/// Cloning is cheap; the store is shared.
pub struct Dashboard<S> {
  store:  Arc<S>,
  window: SummaryWindow,
}

impl<S> Clone for Dashboard<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), window: self.window }
  }
}

impl<S: DashboardStore> Dashboard<S> {
  pub fn new(store: Arc<S>, window: SummaryWindow) -> Self {
    Self { store, window }
  }

  /// Summary for `owner`, or the fixed demo projection when no owner is
  /// given (unauthenticated preview).
  pub async fn summary(&self, owner: Option<&UserId>) -> Result<DashboardSummary> {
    let Some(owner) = owner else {
      return Ok(demo_summary());
    };

    let snapshot = self
      .store
      .snapshot(owner.clone(), self.window)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::ProfileNotFound(owner.clone()))?;

    Ok(project(snapshot, self.window))
  }

  /// Case counts by status for `owner`, or the demo counts when no owner is
  /// given.
  pub async fn case_stats(&self, owner: Option<&UserId>) -> Result<CaseStats> {
    let Some(owner) = owner else {
      return Ok(demo_case_stats());
    };

    self
      .store
      .case_counts(owner.clone())
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::ProfileNotFound(owner.clone()))
  }

  pub async fn cases(
    &self,
    owner: &UserId,
    active_only: bool,
    page: Page,
  ) -> Result<Vec<CaseSummary>> {
    self
      .store
      .list_cases(owner.clone(), active_only, page)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::ProfileNotFound(owner.clone()))
  }

  pub async fn documents(
    &self,
    owner: &UserId,
    page: Page,
  ) -> Result<Vec<DocumentSummary>> {
    self
      .store
      .list_documents(owner.clone(), page)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::ProfileNotFound(owner.clone()))
  }

  pub async fn invoices(&self, owner: &UserId, page: Page) -> Result<Vec<Invoice>> {
    self
      .store
      .list_invoices(owner.clone(), page)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::ProfileNotFound(owner.clone()))
  }

  /// Service requests, newest update first; `None` lists every status.
  pub async fn requests(
    &self,
    owner: &UserId,
    status: Option<RequestStatus>,
    page: Page,
  ) -> Result<Vec<ServiceRequest>> {
    self
      .store
      .list_requests(owner.clone(), status, page)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::ProfileNotFound(owner.clone()))
  }
}

/// Turn a snapshot into a summary. Ordering and caps are re-applied here so
/// that every backend yields the same shape.
fn project(snapshot: DashboardSnapshot, window: SummaryWindow) -> DashboardSummary {
  let DashboardSnapshot {
    mut active_cases,
    mut recent_documents,
    case_counts,
    document_count,
    outstanding_invoices,
    lawyer,
  } = snapshot;

  active_cases.retain(|c| c.status.is_active());
  active_cases.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
  active_cases.truncate(window.cases);

  recent_documents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
  recent_documents.truncate(window.documents);

  DashboardSummary {
    active_cases,
    recent_documents,
    stats: DashboardStats::derive(&case_counts, document_count, outstanding_invoices),
    lawyer,
  }
}

// ─── Demo projection ─────────────────────────────────────────────────────────

fn at(secs: i64) -> DateTime<Utc> {
  Utc.timestamp_opt(secs, 0).single().unwrap_or_default()
}

/// 2025-01-20T09:00:00Z; demo timestamps count back from here.
const DEMO_EPOCH: i64 = 1_737_363_600;
const DAY: i64 = 86_400;

/// The fixed payload served to unauthenticated previews. Deterministic.
pub fn demo_summary() -> DashboardSummary {
  let case = |n: u128, title: &str, progress: u8, category: &str, days_ago: i64| {
    CaseSummary {
      id: Uuid::from_u128(n),
      owner_id: None,
      title: title.to_owned(),
      progress: Progress::new(progress).unwrap_or_default(),
      category: category.to_owned(),
      status: CaseStatus::InProgress,
      updated_at: at(DEMO_EPOCH - days_ago * DAY),
    }
  };
  let document = |n: u128,
                  name: &str,
                  doc_type: DocumentType,
                  status: DocumentStatus,
                  category: &str,
                  days_ago: i64| DocumentSummary {
    id: Uuid::from_u128(0x100 + n),
    owner_id: None,
    name: name.to_owned(),
    doc_type,
    status,
    category: category.to_owned(),
    created_at: at(DEMO_EPOCH - days_ago * DAY),
  };

  DashboardSummary {
    active_cases:     vec![
      case(1, "Регистрация ООО «Инновации»", 65, "Регистрация", 0),
      case(2, "Договор аренды офиса", 90, "Договоры", 1),
      case(3, "Защита товарного знака", 30, "Интеллектуальная собственность", 2),
    ],
    recent_documents: vec![
      document(
        1,
        "Устав_ООО_Инновации.pdf",
        DocumentType::Pdf,
        DocumentStatus::Signed,
        "Договоры",
        0,
      ),
      document(
        2,
        "Договор_аренды.pdf",
        DocumentType::Pdf,
        DocumentStatus::Review,
        "Договоры",
        1,
      ),
      document(
        3,
        "Заявление_ТЗ.doc",
        DocumentType::Doc,
        DocumentStatus::Draft,
        "Судебные",
        2,
      ),
    ],
    stats:            DashboardStats::derive(&demo_case_stats(), 47, 1),
    lawyer:           Some(AssignedLawyer {
      name:      "Анна Смирнова".to_owned(),
      avatar:    None,
      is_online: true,
    }),
  }
}

/// Demo case counts: twelve cases, eight completed.
pub fn demo_case_stats() -> CaseStats {
  CaseStats::from_counts([
    (CaseStatus::InProgress, 3),
    (CaseStatus::OnHold, 1),
    (CaseStatus::Completed, 8),
  ])
}
