//! Handlers for `/plans` endpoints. The catalogue is static, so these need no
//! store.

use axum::{Json, extract::Path};
use cabinet_core::plan::{self, Plan};

use crate::error::ApiError;

/// `GET /plans`
pub async fn list() -> Json<Vec<Plan>> { Json(plan::catalogue()) }

/// `GET /plans/{id}`
pub async fn get_one(Path(id): Path<String>) -> Result<Json<Plan>, ApiError> {
  plan::find(&id)
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("plan {id} not found")))
}
