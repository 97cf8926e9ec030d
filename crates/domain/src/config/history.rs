use serde::{Deserialize, Serialize};

/// Bounds for the viewing history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "d_50")]
    pub max_entries: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_entries: d_50(),
        }
    }
}

fn d_50() -> usize {
    50
}
