//! Cache administration endpoints.
//!
//! - `GET    /v1/cache/stats` — entry count, age span, size and hit rate
//! - `DELETE /v1/cache`       — drop every entry
//! - `DELETE /v1/cache/:key`  — drop one entry

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

use crate::api::error::{api_error, ApiResult};
use crate::state::AppState;

/// `GET /v1/cache/stats`
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.cache.stats())
}

/// `DELETE /v1/cache`
pub async fn clear(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.cache.clear()?;
    Ok(Json(serde_json::json!({ "cleared": true })))
}

/// `DELETE /v1/cache/:key`
pub async fn remove(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Response> {
    if state.cache.remove(&key)? {
        Ok(Json(serde_json::json!({ "removed": key })).into_response())
    } else {
        Ok(api_error(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            format!("no cache entry for {key}"),
        ))
    }
}
