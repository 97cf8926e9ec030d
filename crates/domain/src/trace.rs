use serde::Serialize;

/// Structured trace events emitted across all sara crates.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event")]
pub enum TraceEvent {
    QuotaReset {
        service: String,
        previous_used: u64,
    },
    QuotaReserved {
        service: String,
        cost: u64,
        used: u64,
        pending: u64,
        ceiling: u64,
    },
    QuotaRejected {
        service: String,
        used: u64,
        ceiling: u64,
    },
    QuotaCommitted {
        service: String,
        cost: u64,
        used: u64,
    },
    QuotaReleased {
        service: String,
        cost: u64,
    },
    CacheSwept {
        expired: usize,
    },
    CacheEvicted {
        key: String,
        reason: &'static str,
    },
    HistoryUpdated {
        video_id: String,
        action: &'static str,
    },
    CollaboratorCall {
        service: String,
        ok: bool,
        duration_ms: u64,
    },
}

impl TraceEvent {
    pub fn emit(&self) {
        let json = serde_json::to_string(self).unwrap_or_default();
        tracing::info!(trace_event = %json, "sara_event");
    }
}
