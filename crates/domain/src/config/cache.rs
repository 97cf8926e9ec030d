use serde::{Deserialize, Serialize};

/// Bounds for the result cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "d_50")]
    pub max_entries: usize,
    /// Time-to-live applied when `set` is called without one (7 days).
    #[serde(default = "d_week_secs")]
    pub default_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: d_50(),
            default_ttl_secs: d_week_secs(),
        }
    }
}

fn d_50() -> usize {
    50
}
fn d_week_secs() -> u64 {
    7 * 24 * 60 * 60
}
