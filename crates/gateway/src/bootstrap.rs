//! AppState construction extracted from `main.rs`.
//!
//! The stores are built separately from the collaborators so one-shot CLI
//! commands (`quota`, `cache`, `history`) can open them without configuring
//! any remote client.

use std::sync::Arc;

use anyhow::Context;

use sara_cache::ResultCache;
use sara_domain::clock::{Clock, SystemClock};
use sara_domain::config::{Config, ConfigSeverity};
use sara_history::HistoryStore;
use sara_providers::{Completer, HttpTranscriptSource, OpenAiCompatCompleter, TranscriptSource};
use sara_quota::QuotaTracker;
use sara_storage::{FileStore, KvStore};

use crate::state::AppState;

/// The three stateful components, each owning one durable record.
pub struct Stores {
    pub quota: Arc<QuotaTracker>,
    pub cache: Arc<ResultCache>,
    pub history: Arc<HistoryStore>,
}

impl Stores {
    /// Build every store over a shared durable backend.
    pub fn over(config: &Config, store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        let keys = &config.storage;
        Self {
            quota: Arc::new(QuotaTracker::new(
                &config.quota,
                store.clone(),
                keys.quota_key.clone(),
                clock.clone(),
            )),
            cache: Arc::new(ResultCache::new(
                &config.cache,
                store.clone(),
                keys.cache_key.clone(),
                clock.clone(),
            )),
            history: Arc::new(HistoryStore::new(
                &config.history,
                store,
                keys.history_key.clone(),
                clock,
            )),
        }
    }
}

/// Log every config issue and fail when any of them is an error.
pub fn check_config(config: &Config) -> anyhow::Result<()> {
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let errors = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("config validation failed with {errors} error(s)");
    }
    Ok(())
}

/// Open the file-backed stores at `config.storage.path` on the system clock.
pub fn open_stores(config: &Config) -> anyhow::Result<Stores> {
    let store = FileStore::open(config.storage.path.clone()).with_context(|| {
        format!("opening storage at {}", config.storage.path.display())
    })?;
    Ok(Stores::over(config, Arc::new(store), Arc::new(SystemClock)))
}

/// Assemble an [`AppState`] from already-built parts.
pub fn assemble(
    config: Arc<Config>,
    stores: Stores,
    transcripts: Arc<dyn TranscriptSource>,
    llm: Arc<dyn Completer>,
) -> AppState {
    AppState {
        config,
        quota: stores.quota,
        cache: stores.cache,
        history: stores.history,
        transcripts,
        llm,
    }
}

/// Validate config, open the stores and build the remote clients.
pub fn build_app_state(config: Arc<Config>) -> anyhow::Result<AppState> {
    check_config(&config)?;

    // ── Stores ───────────────────────────────────────────────────────
    let stores = open_stores(&config)?;

    // ── Collaborators ────────────────────────────────────────────────
    let transcripts: Arc<dyn TranscriptSource> = Arc::new(
        HttpTranscriptSource::from_config(&config.transcript)
            .context("initializing transcript client")?,
    );
    tracing::info!(url = %config.transcript.base_url, "transcript client ready");

    let llm: Arc<dyn Completer> = Arc::new(
        OpenAiCompatCompleter::from_config(&config.llm).context("initializing LLM client")?,
    );
    tracing::info!(
        url = %config.llm.base_url,
        completer = llm.completer_id(),
        "LLM client ready"
    );

    Ok(assemble(config, stores, transcripts, llm))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unwritable_storage_key_fails_startup() {
        let mut config = Config::default();
        config.storage.cache_key = "sara/cache".into();
        let err = check_config(&config).unwrap_err();
        assert!(err.to_string().contains("1 error(s)"));
    }

    #[test]
    fn validated_keys_are_writable_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.storage.path = dir.path().to_path_buf();
        config.storage.cache_key = "sara-cache.v2".into();
        check_config(&config).unwrap();

        let stores = open_stores(&config).unwrap();
        stores.cache.set("k", serde_json::json!(1), None).unwrap();
        assert!(dir.path().join("sara-cache.v2.json").exists());
    }
}
