use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use sara_domain::clock::Clock;
use sara_domain::config::HistoryConfig;
use sara_domain::error::Result;
use sara_domain::trace::TraceEvent;
use sara_storage::{load_json, save_json, KvStore};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One viewed video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub video_id: String,
    pub title: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub viewed_at: DateTime<Utc>,
    /// Percentage in `0..=100`.
    pub reading_progress: u8,
    pub favorite: bool,
}

/// The durable history record. `entries` is most-recent-first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub entries: Vec<HistoryEntry>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_updated: DateTime<Utc>,
}

impl HistoryRecord {
    fn empty(now: DateTime<Utc>) -> Self {
        Self {
            entries: Vec::new(),
            last_updated: now,
        }
    }

    fn position(&self, video_id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.video_id == video_id)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// HistoryStore
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Deduplicated, recency-ordered history.
///
/// Mutations update memory first, then write the record. A failed write is
/// returned as `Error::Storage` while the in-memory change stays applied.
pub struct HistoryStore {
    store: Arc<dyn KvStore>,
    storage_key: String,
    clock: Arc<dyn Clock>,
    max_entries: usize,
    record: Mutex<HistoryRecord>,
}

impl HistoryStore {
    pub fn new(
        config: &HistoryConfig,
        store: Arc<dyn KvStore>,
        storage_key: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let storage_key = storage_key.into();
        let mut record: HistoryRecord = load_json(store.as_ref(), &storage_key)
            .unwrap_or_else(|| HistoryRecord::empty(clock.now()));
        record.entries.truncate(config.max_entries);

        tracing::info!(
            entries = record.entries.len(),
            key = %storage_key,
            "history loaded"
        );

        Self {
            store,
            storage_key,
            clock,
            max_entries: config.max_entries,
            record: Mutex::new(record),
        }
    }

    /// Record a view of `video_id`, moving it to the front.
    ///
    /// Any earlier entry for the same id is replaced, so progress and the
    /// favorite flag start over.
    pub fn add_entry(&self, video_id: &str, title: &str) -> Result<HistoryEntry> {
        let now = self.clock.now();
        let entry = HistoryEntry {
            video_id: video_id.to_owned(),
            title: title.to_owned(),
            viewed_at: now,
            reading_progress: 0,
            favorite: false,
        };

        let mut record = self.record.lock();
        record.entries.retain(|e| e.video_id != video_id);
        record.entries.insert(0, entry.clone());
        record.entries.truncate(self.max_entries);
        record.last_updated = now;
        self.updated(video_id, "viewed");
        self.persist(&record)?;
        Ok(entry)
    }

    /// Set reading progress, clamped to `0..=100`.
    ///
    /// Returns the stored value, or `None` when `video_id` is not in the
    /// history (nothing is written in that case).
    pub fn update_progress(&self, video_id: &str, progress: i64) -> Result<Option<u8>> {
        let now = self.clock.now();
        let clamped = progress.clamp(0, 100) as u8;

        let mut record = self.record.lock();
        let Some(idx) = record.position(video_id) else {
            return Ok(None);
        };
        record.entries[idx].reading_progress = clamped;
        record.last_updated = now;
        self.updated(video_id, "progress");
        self.persist(&record)?;
        Ok(Some(clamped))
    }

    /// Flip the favorite flag and return the new state. Returns `false`
    /// without writing when `video_id` is not in the history.
    pub fn toggle_favorite(&self, video_id: &str) -> Result<bool> {
        Ok(self.flip_favorite(video_id)?.unwrap_or(false))
    }

    /// Like [`toggle_favorite`](Self::toggle_favorite), but reports an
    /// absent `video_id` as `None`. Presence is decided under the same lock
    /// as the flip.
    pub fn flip_favorite(&self, video_id: &str) -> Result<Option<bool>> {
        let now = self.clock.now();
        let mut record = self.record.lock();
        let Some(idx) = record.position(video_id) else {
            return Ok(None);
        };
        let favorite = !record.entries[idx].favorite;
        record.entries[idx].favorite = favorite;
        record.last_updated = now;
        self.updated(video_id, if favorite { "favorited" } else { "unfavorited" });
        self.persist(&record)?;
        Ok(Some(favorite))
    }

    pub fn get(&self, video_id: &str) -> Option<HistoryEntry> {
        let record = self.record.lock();
        record.position(video_id).map(|idx| record.entries[idx].clone())
    }

    /// All entries, most recent first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.record.lock().entries.clone()
    }

    pub fn favorites(&self) -> Vec<HistoryEntry> {
        self.record
            .lock()
            .entries
            .iter()
            .filter(|e| e.favorite)
            .cloned()
            .collect()
    }

    pub fn clear_history(&self) -> Result<()> {
        let now = self.clock.now();
        let mut record = self.record.lock();
        *record = HistoryRecord::empty(now);
        tracing::info!(key = %self.storage_key, "history cleared");
        self.persist(&record)
    }

    /// Pretty-printed JSON snapshot of the full record.
    pub fn export_history(&self) -> Result<String> {
        let record = self.record.lock();
        Ok(serde_json::to_string_pretty(&*record)?)
    }

    // ── Private ──────────────────────────────────────────────────────

    fn updated(&self, video_id: &str, action: &'static str) {
        TraceEvent::HistoryUpdated {
            video_id: video_id.to_owned(),
            action,
        }
        .emit();
    }

    fn persist(&self, record: &HistoryRecord) -> Result<()> {
        save_json(self.store.as_ref(), &self.storage_key, record)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
