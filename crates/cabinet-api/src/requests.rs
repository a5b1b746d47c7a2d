//! `GET /cabinet/requests?userId=<id>[&status=..][&limit=..][&offset=..]`
//!
//! The owner's service requests, most recently updated first. `status` is one
//! of `pending`, `in_progress`, `waiting_user`, `done`, `canceled`, or `all`
//! (the same as leaving it out).

use axum::{
  Json,
  extract::{Query, State, rejection::QueryRejection},
};
use cabinet_core::{
  request::{RequestStatus, ServiceRequest},
  store::Page,
};
use serde::{Deserialize, Serialize};

use crate::{
  ApiState, Backend,
  auth::Caller,
  dashboard::required_owner,
  error::ApiError,
};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParams {
  pub user_id: Option<String>,
  pub status:  Option<String>,
  pub limit:   Option<usize>,
  pub offset:  Option<usize>,
}

/// A request as sent over the wire, with its status label.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestBody {
  #[serde(flatten)]
  pub request:        ServiceRequest,
  pub status_display: &'static str,
}

impl From<ServiceRequest> for RequestBody {
  fn from(request: ServiceRequest) -> Self {
    Self { status_display: request.status.label(), request }
  }
}

fn status_filter(raw: Option<&str>) -> Result<Option<RequestStatus>, ApiError> {
  match raw.map(str::trim) {
    None | Some("") => Ok(None),
    Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
    Some(s) => s.parse().map(Some).map_err(|_| {
      cabinet_core::Error::validation(
        "status",
        format!("{s:?} is not one of all, pending, in_progress, waiting_user, done, canceled"),
      )
      .into()
    }),
  }
}

pub async fn list<S: Backend>(
  State(state): State<ApiState<S>>,
  caller: Caller,
  query: Result<Query<RequestParams>, QueryRejection>,
) -> Result<Json<Vec<RequestBody>>, ApiError> {
  let Query(params) = query?;
  let status = status_filter(params.status.as_deref())?;
  let owner = required_owner(params.user_id, caller)?;
  let page = Page::new(params.limit, params.offset);

  let requests = state.dashboard.requests(&owner, status, page).await?;
  Ok(Json(requests.into_iter().map(RequestBody::from).collect()))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn status_filter_forms() {
    assert_eq!(status_filter(None).unwrap(), None);
    assert_eq!(status_filter(Some("all")).unwrap(), None);
    assert_eq!(status_filter(Some(" ALL ")).unwrap(), None);
    assert_eq!(status_filter(Some("in_progress")).unwrap(), Some(RequestStatus::InProgress));
    assert_eq!(status_filter(Some("Done")).unwrap(), Some(RequestStatus::Done));
    assert_eq!(status_filter(Some("closed")).unwrap_err().kind(), "validation");
  }
}
