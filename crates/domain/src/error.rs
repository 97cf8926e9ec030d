use chrono::{DateTime, Utc};
use serde::Serialize;

/// Structured detail for a rejected quota check.
///
/// This is a user-facing, recoverable condition: the caller should render
/// it (service, reset time) rather than retry, since nothing changes until
/// the window resets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaExceeded {
    pub service: String,
    pub reset_at: DateTime<Utc>,
    pub used: u64,
    pub remaining: u64,
    pub ceiling: u64,
}

/// Shared error type used across all sara crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A durable read or write failed. In-memory state is still usable.
    #[error("storage {key}: {message}")]
    Storage { key: String, message: String },

    #[error("quota exceeded for {}: resets at {}", .0.service, .0.reset_at.to_rfc3339())]
    QuotaExceeded(QuotaExceeded),

    /// A wrapped remote call failed. Quota is never spent on this path.
    #[error("{service} call failed: {message}")]
    Collaborator {
        service: String,
        message: String,
        transient: bool,
    },

    #[error("no transcript available for video {0}")]
    TranscriptUnavailable(String),

    #[error("unknown quota service: {0}")]
    UnknownService(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn storage(key: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Storage {
            key: key.into(),
            message: message.to_string(),
        }
    }

    pub fn collaborator(
        service: impl Into<String>,
        message: impl Into<String>,
        transient: bool,
    ) -> Self {
        Self::Collaborator {
            service: service.into(),
            message: message.into(),
            transient,
        }
    }

    /// `true` for failures of the durable store.
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn quota_exceeded_message_names_service_and_reset() {
        let err = Error::QuotaExceeded(QuotaExceeded {
            service: "llm".into(),
            reset_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            used: 50,
            remaining: 0,
            ceiling: 50,
        });
        let msg = err.to_string();
        assert!(msg.contains("llm"));
        assert!(msg.contains("2024-05-01T00:00:00"));
    }

    #[test]
    fn storage_helper_sets_key() {
        let err = Error::storage("sara_cache", "disk full");
        assert!(err.is_storage());
        assert_eq!(err.to_string(), "storage sara_cache: disk full");
    }

    #[test]
    fn serde_errors_convert() {
        let err: Error = serde_json::from_str::<u64>("nope").unwrap_err().into();
        assert!(matches!(err, Error::Json(_)));
        assert!(!err.is_storage());
    }
}
