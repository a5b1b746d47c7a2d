//! `GET /billing/invoices?userId=<id>[&limit=..][&offset=..]` — newest first.

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};
use cabinet_core::{billing::Invoice, store::Page};

use crate::{
  ApiState, Backend,
  auth::Caller,
  dashboard::{ListParams, required_owner},
  error::ApiError,
};

pub async fn invoices<S: Backend>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  query: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Invoice>>, ApiError> {
  let Query(params) = query?;
  let owner = required_owner(params.user_id, caller)?;
  let page = Page::new(params.limit, params.offset);
  Ok(Json(state.dashboard.invoices(&owner, page).await?))
}
