use std::sync::Arc;

use sara_cache::ResultCache;
use sara_domain::config::Config;
use sara_history::HistoryStore;
use sara_providers::{Completer, TranscriptSource};
use sara_quota::QuotaTracker;

/// Shared application state passed to all API handlers.
///
/// Fields are grouped by concern:
/// - **Core** config
/// - **Stateful stores** quota ledger, result cache, viewing history
/// - **Collaborators** the remote services whose calls are metered
#[derive(Clone)]
pub struct AppState {
    // ── Core ──────────────────────────────────────────────────────────
    pub config: Arc<Config>,

    // ── Stateful stores ───────────────────────────────────────────────
    pub quota: Arc<QuotaTracker>,
    pub cache: Arc<ResultCache>,
    pub history: Arc<HistoryStore>,

    // ── Collaborators ─────────────────────────────────────────────────
    pub transcripts: Arc<dyn TranscriptSource>,
    pub llm: Arc<dyn Completer>,
}
