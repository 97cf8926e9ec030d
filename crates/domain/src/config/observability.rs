use serde::{Deserialize, Serialize};

/// Logging configuration.
///
/// `RUST_LOG` always wins over `log_filter` when it is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "d_log_filter")]
    pub log_filter: String,
    /// Emit JSON lines (`true`) or human-readable output.
    #[serde(default = "d_true")]
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: d_log_filter(),
            json: true,
        }
    }
}

fn d_log_filter() -> String {
    "info,sara_gateway=debug".into()
}
fn d_true() -> bool {
    true
}
