//! Store capability traits and supporting query types.
//!
//! Capabilities are split so that each service asks only for what it reads:
//! the [`Dashboard`](crate::dashboard::Dashboard) needs a [`DashboardStore`],
//! the [`Profiles`](crate::directory::Profiles) provider a [`ProfileStore`].
//! Storage backends (e.g. `cabinet-store-sqlite`) implement all of them; tests
//! substitute small in-memory fakes.
//!
//! All methods return `Send` futures so the traits can be used behind `axum`.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  auth::{LoginRecord, StoredToken, TokenKind},
  billing::{Invoice, NewInvoice},
  case::{CaseSummary, CaseUpdate, NewCase},
  dashboard::{CaseStats, DashboardSnapshot, SummaryWindow},
  document::{DocumentSummary, NewDocument},
  lawyer::{Lawyer, NewLawyer},
  profile::{NewProfile, ProfileConflict, ProfilePatch, UserId, UserProfile},
  request::{NewServiceRequest, RequestStatus, ServiceRequest},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Limit/offset pagination for per-owner listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
  pub limit:  usize,
  pub offset: usize,
}

impl Page {
  pub const DEFAULT_LIMIT: usize = 20;
  pub const MAX_LIMIT: usize = 100;

  /// Build a page from optional client input, clamping the limit to
  /// `1..=MAX_LIMIT`.
  pub fn new(limit: Option<usize>, offset: Option<usize>) -> Self {
    Self {
      limit:  limit
        .unwrap_or(Self::DEFAULT_LIMIT)
        .clamp(1, Self::MAX_LIMIT),
      offset: offset.unwrap_or(0),
    }
  }
}

impl Default for Page {
  fn default() -> Self { Self::new(None, None) }
}

/// A profile together with its initial records, written in one transaction
/// by [`RecordStore::import_account`]. Either all of it lands or none does.
#[derive(Debug, Clone)]
pub struct AccountSeed {
  pub profile:   NewProfile,
  pub cases:     Vec<NewCase>,
  pub documents: Vec<NewDocument>,
  pub invoices:  Vec<NewInvoice>,
  pub requests:  Vec<NewServiceRequest>,
  /// Created and assigned to the profile.
  pub lawyer:    Option<NewLawyer>,
}

impl AccountSeed {
  /// A seed with no records yet.
  pub fn new(profile: NewProfile) -> Self {
    Self {
      profile,
      cases: Vec::new(),
      documents: Vec::new(),
      invoices: Vec::new(),
      requests: Vec::new(),
      lawyer: None,
    }
  }
}

// ─── Profiles ────────────────────────────────────────────────────────────────

pub trait ProfileStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist a new profile. The store assigns `created_at`, and an identifier
  /// when the input carries none. A taken id or email is reported as a
  /// [`ProfileConflict`], checked and inserted atomically.
  fn create_profile(
    &self,
    input: NewProfile,
  ) -> impl Future<Output = Result<Result<UserProfile, ProfileConflict>, Self::Error>> + Send + '_;

  /// Returns `None` if no profile has this id.
  fn get_profile(
    &self,
    id: UserId,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;

  /// Apply `patch` and return the updated profile, or `None` if no profile
  /// has this id.
  fn update_profile(
    &self,
    id: UserId,
    patch: ProfilePatch,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;
}

// ─── Per-owner records — writes ──────────────────────────────────────────────

pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  fn record_case(
    &self,
    input: NewCase,
  ) -> impl Future<Output = Result<CaseSummary, Self::Error>> + Send + '_;

  /// Move a case forward. Returns an error if the case does not exist or if
  /// `update.progress` is lower than the stored progress.
  fn advance_case(
    &self,
    case_id: Uuid,
    update: CaseUpdate,
  ) -> impl Future<Output = Result<CaseSummary, Self::Error>> + Send + '_;

  fn record_document(
    &self,
    input: NewDocument,
  ) -> impl Future<Output = Result<DocumentSummary, Self::Error>> + Send + '_;

  fn record_invoice(
    &self,
    input: NewInvoice,
  ) -> impl Future<Output = Result<Invoice, Self::Error>> + Send + '_;

  fn add_lawyer(
    &self,
    input: NewLawyer,
  ) -> impl Future<Output = Result<Lawyer, Self::Error>> + Send + '_;

  /// Make `lawyer_id` the assigned lawyer of `user_id`, replacing any
  /// previous assignment.
  fn assign_lawyer(
    &self,
    user_id: UserId,
    lawyer_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn record_request(
    &self,
    input: NewServiceRequest,
  ) -> impl Future<Output = Result<ServiceRequest, Self::Error>> + Send + '_;

  /// Write a profile and all of its seed records atomically. A taken id or
  /// email leaves the store untouched.
  fn import_account(
    &self,
    seed: AccountSeed,
  ) -> impl Future<Output = Result<Result<UserProfile, ProfileConflict>, Self::Error>> + Send + '_;
}

// ─── Per-owner records — reads ───────────────────────────────────────────────

pub trait DashboardStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read everything a dashboard summary needs for `owner` as one consistent
  /// point-in-time view. Returns `None` if the owner has no profile.
  fn snapshot(
    &self,
    owner: UserId,
    window: SummaryWindow,
  ) -> impl Future<Output = Result<Option<DashboardSnapshot>, Self::Error>> + Send + '_;

  /// Count every case of `owner` by status. Returns `None` if the owner has
  /// no profile.
  fn case_counts(
    &self,
    owner: UserId,
  ) -> impl Future<Output = Result<Option<CaseStats>, Self::Error>> + Send + '_;

  /// Cases ordered by `updated_at` descending.
  fn list_cases(
    &self,
    owner: UserId,
    active_only: bool,
    page: Page,
  ) -> impl Future<Output = Result<Option<Vec<CaseSummary>>, Self::Error>> + Send + '_;

  /// Documents ordered by `created_at` descending.
  fn list_documents(
    &self,
    owner: UserId,
    page: Page,
  ) -> impl Future<Output = Result<Option<Vec<DocumentSummary>>, Self::Error>> + Send + '_;

  /// Invoices ordered by `issued_on` descending.
  fn list_invoices(
    &self,
    owner: UserId,
    page: Page,
  ) -> impl Future<Output = Result<Option<Vec<Invoice>>, Self::Error>> + Send + '_;

  /// Service requests ordered by `updated_at` descending, optionally only
  /// those in `status`.
  fn list_requests(
    &self,
    owner: UserId,
    status: Option<RequestStatus>,
    page: Page,
  ) -> impl Future<Output = Result<Option<Vec<ServiceRequest>>, Self::Error>> + Send + '_;
}

// ─── Credentials and tokens ──────────────────────────────────────────────────

/// The "verify credentials, issue/validate token" capability. Secrets never
/// reach the store: passwords arrive hashed and tokens as digests.
pub trait CredentialStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create a profile and its password hash in one transaction, so an
  /// account never exists without a way to log in.
  fn create_account(
    &self,
    input: NewProfile,
    password_hash: String,
  ) -> impl Future<Output = Result<Result<UserProfile, ProfileConflict>, Self::Error>> + Send + '_;

  /// Set or replace the password hash of `user_id`. Returns `false` if the
  /// user has no profile.
  fn set_password_hash(
    &self,
    user_id: UserId,
    password_hash: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Case-insensitive lookup by email of a user that has a password.
  fn credentials_for(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<LoginRecord>, Self::Error>> + Send + '_;

  /// Persist a token digest. Expired tokens are purged along the way.
  fn store_token(
    &self,
    token: StoredToken,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The owner of a live token of `kind` that expires after `now`.
  fn resolve_token(
    &self,
    digest: String,
    kind: TokenKind,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<UserId>, Self::Error>> + Send + '_;

  /// Delete a token. Returns `true` if it existed, so only one of several
  /// concurrent revocations wins.
  fn revoke_token(
    &self,
    digest: String,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn page_clamps_limit() {
    assert_eq!(Page::new(None, None), Page { limit: 20, offset: 0 });
    assert_eq!(Page::new(Some(0), Some(5)).limit, 1);
    assert_eq!(Page::new(Some(10_000), None).limit, Page::MAX_LIMIT);
  }
}
