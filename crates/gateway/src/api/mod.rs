pub mod cache;
pub mod content;
pub mod error;
pub mod history;
pub mod quota;

use axum::extract::State;
use axum::response::{IntoResponse, Json};
use axum::routing::{delete, get, post, put};
use axum::Router;

use crate::state::AppState;

/// Build the full API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/health", get(health))
        // Quotas
        .route("/v1/quotas", get(quota::list_quotas))
        .route("/v1/quotas/:service", get(quota::get_quota))
        // Cache
        .route("/v1/cache/stats", get(cache::stats))
        .route("/v1/cache", delete(cache::clear))
        .route("/v1/cache/:key", delete(cache::remove))
        // History
        .route(
            "/v1/history",
            get(history::list).post(history::add).delete(history::clear),
        )
        .route("/v1/history/favorites", get(history::favorites))
        .route("/v1/history/export", get(history::export))
        .route("/v1/history/:video_id/progress", put(history::update_progress))
        .route("/v1/history/:video_id/favorite", post(history::toggle_favorite))
        // Metered content
        .route("/v1/transcript", get(content::transcript))
        .route("/v1/article", post(content::article))
        .route("/v1/summary", post(content::summary))
}

/// `GET /v1/health`
async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let services: Vec<&str> = state.quota.services().collect();
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "services": services,
        "cacheEntries": state.cache.stats().total_entries,
    }))
}
