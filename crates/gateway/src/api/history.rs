//! Viewing history endpoints.
//!
//! - `GET    /v1/history`                        — entries, most recent first
//! - `POST   /v1/history`                        — record a view `{ videoId, title }`
//! - `DELETE /v1/history`                        — clear everything
//! - `GET    /v1/history/favorites`              — favorites only
//! - `GET    /v1/history/export`                 — the full record as a JSON download
//! - `PUT    /v1/history/:video_id/progress`     — `{ progress }`, clamped to 0..=100
//! - `POST   /v1/history/:video_id/favorite`     — toggle, returns the new state

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde::Deserialize;

use crate::api::error::{api_error, ApiResult};
use crate::runtime::video::parse_video_id;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEntryRequest {
    video_id: String,
    #[serde(default)]
    title: String,
}

#[derive(Deserialize)]
pub struct ProgressRequest {
    progress: i64,
}

/// `GET /v1/history`
pub async fn list(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "entries": state.history.entries() }))
}

/// `GET /v1/history/favorites`
pub async fn favorites(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "entries": state.history.favorites() }))
}

/// `POST /v1/history`
pub async fn add(
    State(state): State<AppState>,
    Json(req): Json<AddEntryRequest>,
) -> ApiResult<impl IntoResponse> {
    let video_id = parse_video_id(&req.video_id)?;
    let entry = state.history.add_entry(&video_id, req.title.trim())?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// `DELETE /v1/history`
pub async fn clear(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    state.history.clear_history()?;
    Ok(Json(serde_json::json!({ "cleared": true })))
}

/// `GET /v1/history/export`
pub async fn export(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let body = state.history.export_history()?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"sara-history.json\"",
            ),
        ],
        body,
    ))
}

/// `PUT /v1/history/:video_id/progress`
pub async fn update_progress(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    Json(req): Json<ProgressRequest>,
) -> ApiResult<Response> {
    match state.history.update_progress(&video_id, req.progress)? {
        Some(progress) => Ok(Json(serde_json::json!({
            "videoId": video_id,
            "readingProgress": progress,
        }))
        .into_response()),
        None => Ok(not_in_history(&video_id)),
    }
}

/// `POST /v1/history/:video_id/favorite`
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> ApiResult<Response> {
    let Some(favorite) = state.history.flip_favorite(&video_id)? else {
        return Ok(not_in_history(&video_id));
    };
    Ok(Json(serde_json::json!({ "videoId": video_id, "favorite": favorite })).into_response())
}

fn not_in_history(video_id: &str) -> Response {
    api_error(
        StatusCode::NOT_FOUND,
        "NOT_FOUND",
        format!("video {video_id} is not in the history"),
    )
}
