mod cache;
mod history;
mod llm;
mod observability;
mod quota;
mod server;
mod storage;

pub use cache::*;
pub use history::*;
pub use llm::*;
pub use observability::*;
pub use quota::*;
pub use server::*;
pub use storage::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub quota: QuotaConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub transcript: TranscriptConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let mut error = |field: String, message: &str| {
            errors.push(ConfigError {
                severity: ConfigSeverity::Error,
                field,
                message: message.into(),
            });
        };

        if self.server.port == 0 {
            error("server.port".into(), "port must be greater than 0");
        }
        if self.server.host.is_empty() {
            error("server.host".into(), "host must not be empty");
        }
        if self.server.max_concurrent_requests == 0 {
            error(
                "server.max_concurrent_requests".into(),
                "must be greater than 0",
            );
        }

        for (name, svc) in &self.quota.services {
            if svc.ceiling == 0 {
                error(
                    format!("quota.services.{name}.ceiling"),
                    "ceiling must be greater than 0",
                );
            }
            match svc.reset {
                ResetPolicy::Rolling { window_secs } if window_secs == 0 => {
                    error(
                        format!("quota.services.{name}.reset.window_secs"),
                        "rolling window must be greater than 0",
                    );
                }
                ResetPolicy::DailyUtc { hour, minute } if hour > 23 || minute > 59 => {
                    error(
                        format!("quota.services.{name}.reset"),
                        "daily reset must be a valid UTC time of day",
                    );
                }
                _ => {}
            }
        }

        if self.cache.max_entries == 0 {
            error("cache.max_entries".into(), "must be greater than 0");
        }
        if self.cache.default_ttl_secs == 0 {
            error("cache.default_ttl_secs".into(), "must be greater than 0");
        }
        if self.history.max_entries == 0 {
            error("history.max_entries".into(), "must be greater than 0");
        }

        let keys = [
            ("storage.quota_key", &self.storage.quota_key),
            ("storage.cache_key", &self.storage.cache_key),
            ("storage.history_key", &self.storage.history_key),
        ];
        for (field, key) in keys {
            if key.is_empty() {
                error(field.into(), "storage key must not be empty");
            } else if !is_valid_record_key(key) {
                error(field.into(), RECORD_KEY_RULE);
            }
        }
        if keys[0].1 == keys[1].1 || keys[0].1 == keys[2].1 || keys[1].1 == keys[2].1 {
            error(
                "storage".into(),
                "quota, cache and history must use distinct storage keys",
            );
        }

        if self.quota.services.is_empty() {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "quota.services".into(),
                message: "no quota services configured; metered endpoints will be rejected".into(),
            });
        }
        if self.server.cors.allowed_origins.iter().any(|o| o == "*") {
            errors.push(ConfigError {
                severity: ConfigSeverity::Warning,
                field: "server.cors.allowed_origins".into(),
                message: "wildcard \"*\" is not supported and is ignored; use host:* for any port"
                    .into(),
            });
        }

        errors
    }
}
