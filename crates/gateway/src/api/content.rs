//! Metered content endpoints.
//!
//! - `GET  /v1/transcript?videoId=` — caption segments
//! - `POST /v1/article`             — `{ videoId, title }` → sectioned article
//! - `POST /v1/summary`             — `{ videoId, title, article }` → five-bullet TLDR
//!
//! Responses are wrapped as `{ data, fromCache, quotaRemaining, degraded }`.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::runtime::{self, metered::Metered};
use crate::state::AppState;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T> {
    data: T,
    from_cache: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    quota_remaining: Option<u64>,
    degraded: bool,
}

impl<T> From<Metered<T>> for Envelope<T> {
    fn from(m: Metered<T>) -> Self {
        Self {
            data: m.value,
            from_cache: m.from_cache,
            quota_remaining: m.quota.map(|q| q.remaining),
            degraded: m.degraded,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptQuery {
    video_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleRequest {
    video_id: String,
    #[serde(default)]
    title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryRequest {
    video_id: String,
    #[serde(default)]
    title: String,
    article: String,
}

/// `GET /v1/transcript?videoId=`
pub async fn transcript(
    State(state): State<AppState>,
    Query(q): Query<TranscriptQuery>,
) -> ApiResult<impl IntoResponse> {
    let out = runtime::transcript(&state, &q.video_id).await?;
    Ok(Json(Envelope::from(out)))
}

/// `POST /v1/article`
pub async fn article(
    State(state): State<AppState>,
    Json(req): Json<ArticleRequest>,
) -> ApiResult<impl IntoResponse> {
    let out = runtime::article(&state, &req.video_id, &req.title).await?;
    Ok(Json(Envelope::from(out)))
}

/// `POST /v1/summary`
pub async fn summary(
    State(state): State<AppState>,
    Json(req): Json<SummaryRequest>,
) -> ApiResult<impl IntoResponse> {
    let out = runtime::summary(&state, &req.video_id, &req.title, &req.article).await?;
    Ok(Json(Envelope::from(out)))
}
