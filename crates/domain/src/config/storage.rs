use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Where durable state lives and which record key each component owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding one JSON file per record.
    #[serde(default = "d_path")]
    pub path: PathBuf,
    #[serde(default = "d_quota_key")]
    pub quota_key: String,
    #[serde(default = "d_cache_key")]
    pub cache_key: String,
    #[serde(default = "d_history_key")]
    pub history_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: d_path(),
            quota_key: d_quota_key(),
            cache_key: d_cache_key(),
            history_key: d_history_key(),
        }
    }
}

/// Describes the shape every durable record key must have.
pub const RECORD_KEY_RULE: &str = "record key must be [A-Za-z0-9_.-] and not start with '.'";

/// Whether `key` can name a durable record: non-empty, `[A-Za-z0-9_.-]`
/// only, and not starting with `.`.
pub fn is_valid_record_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn d_path() -> PathBuf {
    PathBuf::from("./data")
}
fn d_quota_key() -> String {
    "sara_rate_limits".into()
}
fn d_cache_key() -> String {
    "sara_cache".into()
}
fn d_history_key() -> String {
    "sara_reading_history".into()
}
