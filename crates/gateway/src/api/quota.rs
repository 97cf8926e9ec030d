//! Quota introspection API endpoints.
//!
//! - `GET /v1/quotas`          — usage, ceiling and next reset per service
//! - `GET /v1/quotas/:service` — the same for one service

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Json};

use crate::api::error::ApiResult;
use crate::state::AppState;

/// `GET /v1/quotas`
pub async fn list_quotas(State(state): State<AppState>) -> impl IntoResponse {
    let quotas = state.quota.snapshot();
    Json(serde_json::json!({ "quotas": quotas }))
}

/// `GET /v1/quotas/:service`
pub async fn get_quota(
    State(state): State<AppState>,
    Path(service): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let info = state.quota.quota_info(&service)?;
    Ok(Json(info))
}
