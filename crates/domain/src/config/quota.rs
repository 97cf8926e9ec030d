use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Service name charged for transcript extraction.
pub const SERVICE_TRANSCRIPT: &str = "transcript";
/// Service name charged for LLM completions.
pub const SERVICE_LLM: &str = "llm";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Quota
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Per-service quota ceilings and reset policies.
///
/// Supplying any `[quota.services.*]` table replaces the built-in service
/// set entirely; list every service the gateway charges against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuotaConfig {
    #[serde(default = "d_services")]
    pub services: BTreeMap<String, ServiceQuota>,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            services: d_services(),
        }
    }
}

/// Static configuration for one quota-tracked service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceQuota {
    /// Units that may be spent per window. Must be > 0.
    pub ceiling: u64,
    pub reset: ResetPolicy,
}

/// When a service's window starts over.
///
/// The two policies are observably different and are kept distinct: a
/// rolling window restarts a fixed duration after it began, while the
/// daily policy is aligned to a wall-clock time of day in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResetPolicy {
    Rolling { window_secs: u64 },
    DailyUtc { hour: u32, minute: u32 },
}

fn d_services() -> BTreeMap<String, ServiceQuota> {
    let mut services = BTreeMap::new();
    services.insert(
        SERVICE_LLM.to_owned(),
        ServiceQuota {
            ceiling: 50,
            reset: ResetPolicy::Rolling {
                window_secs: 24 * 60 * 60,
            },
        },
    );
    services.insert(
        SERVICE_TRANSCRIPT.to_owned(),
        ServiceQuota {
            ceiling: 100,
            reset: ResetPolicy::DailyUtc { hour: 0, minute: 0 },
        },
    );
    services
}
