//! Handlers for `/dashboard` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/dashboard/summary` | Optional `?userId`; demo payload when anonymous |
//! | `GET`  | `/dashboard/stats` | Optional `?userId`; case counts by status |
//! | `GET`  | `/dashboard/cases` | `?userId`, `activeOnly`, `limit`, `offset` |
//! | `GET`  | `/dashboard/documents` | `?userId`, `limit`, `offset` |
//!
//! Without `userId` the endpoints fall back to the bearer's own records.

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};
use cabinet_core::{
  case::CaseSummary,
  dashboard::{CaseStats, DashboardSummary},
  document::DocumentSummary,
  profile::UserId,
  store::Page,
};
use serde::Deserialize;

use crate::{ApiState, Backend, auth::Caller, error::ApiError};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerParams {
  pub user_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
  pub user_id:     Option<String>,
  #[serde(default)]
  pub active_only: bool,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

/// The explicit `userId`, else the authenticated caller, else nobody.
pub(crate) fn owner(user_id: Option<String>, caller: Caller) -> Option<UserId> {
  user_id
    .filter(|id| !id.trim().is_empty())
    .map(UserId::from)
    .or(caller.0)
}

/// Listings have no anonymous preview; they need someone to list for.
pub(crate) fn required_owner(
  user_id: Option<String>,
  caller: Caller,
) -> Result<UserId, ApiError> {
  owner(user_id, caller).ok_or_else(|| {
    cabinet_core::Error::validation("userId", "required without a bearer token").into()
  })
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// `GET /dashboard/summary[?userId=<id>]`
pub async fn summary<S: Backend>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  query: Result<Query<OwnerParams>, QueryRejection>,
) -> Result<Json<DashboardSummary>, ApiError> {
  let Query(params) = query?;
  let owner = owner(params.user_id, caller);
  tracing::debug!(owner = ?owner, "dashboard summary");
  Ok(Json(state.dashboard.summary(owner.as_ref()).await?))
}

/// `GET /dashboard/stats[?userId=<id>]`
pub async fn stats<S: Backend>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  query: Result<Query<OwnerParams>, QueryRejection>,
) -> Result<Json<CaseStats>, ApiError> {
  let Query(params) = query?;
  let owner = owner(params.user_id, caller);
  Ok(Json(state.dashboard.case_stats(owner.as_ref()).await?))
}

// ─── Listings ────────────────────────────────────────────────────────────────

/// `GET /dashboard/cases?userId=<id>[&activeOnly=true][&limit=..][&offset=..]`
pub async fn cases<S: Backend>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<CaseSummary>>, ApiError> {
  let Query(params) = query?;
  let owner = required_owner(params.user_id, caller)?;
  let page = Page::new(params.limit, params.offset);
  Ok(Json(state.dashboard.cases(&owner, params.active_only, page).await?))
}

/// `GET /dashboard/documents?userId=<id>[&limit=..][&offset=..]`
pub async fn documents<S: Backend>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<DocumentSummary>>, ApiError> {
  let Query(params) = query?;
  let owner = required_owner(params.user_id, caller)?;
  let page = Page::new(params.limit, params.offset);
  Ok(Json(state.dashboard.documents(&owner, page).await?))
}
