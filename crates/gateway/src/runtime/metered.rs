//! Cache-first, quota-guarded execution of one remote call.
//!
//! 1. A cache hit returns immediately and spends nothing.
//! 2. On a miss, quota is reserved atomically (or the call is refused with
//!    `Error::QuotaExceeded` before anything is sent).
//! 3. The collaborator runs. If it fails, or the future is dropped, the
//!    reservation is released and no quota is spent.
//! 4. On success the reservation is committed and the result cached.
//!
//! Storage failures in step 4 do not fail the request: the result is
//! returned with `degraded = true` and the failure is logged.

use std::future::Future;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;

use sara_cache::ResultCache;
use sara_domain::error::Result;
use sara_domain::trace::TraceEvent;
use sara_quota::{QuotaInfo, QuotaTracker};

/// The outcome of a metered call.
#[derive(Debug, Clone)]
pub struct Metered<T> {
    pub value: T,
    pub from_cache: bool,
    /// Quota state after the call (or at the time of the cache hit).
    pub quota: Option<QuotaInfo>,
    /// A durable write failed after the call succeeded.
    pub degraded: bool,
}

/// Where a metered call's cost goes and where its result is cached.
#[derive(Debug, Clone, Copy)]
pub struct Meter<'a> {
    pub service: &'a str,
    pub cost: u64,
    pub cache_key: &'a str,
}

pub async fn metered<T, F, Fut>(
    quota: &QuotaTracker,
    cache: &ResultCache,
    meter: Meter<'_>,
    call: F,
) -> Result<Metered<T>>
where
    T: Serialize + DeserializeOwned,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let Meter {
        service,
        cost,
        cache_key,
    } = meter;

    if let Some(value) = cache.get_as::<T>(cache_key) {
        tracing::debug!(service, key = cache_key, "served from cache");
        return Ok(Metered {
            value,
            from_cache: true,
            quota: quota.quota_info(service).ok(),
            degraded: false,
        });
    }

    let reservation = quota.reserve(service, cost)?;
    let call_id = uuid::Uuid::new_v4();
    let started = Instant::now();
    let outcome = call().await;
    let duration_ms = started.elapsed().as_millis() as u64;

    TraceEvent::CollaboratorCall {
        service: service.to_owned(),
        ok: outcome.is_ok(),
        duration_ms,
    }
    .emit();

    // Dropping the reservation on this path gives the units back.
    let value = match outcome {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(%call_id, service, error = %e, "collaborator call failed");
            return Err(e);
        }
    };

    let mut degraded = false;
    let info = match reservation.commit() {
        Ok(info) => Some(info),
        Err(e) => {
            tracing::error!(%call_id, service, error = %e, "quota spend not persisted");
            degraded = true;
            quota.quota_info(service).ok()
        }
    };

    if let Err(e) = cache.set_as(cache_key, &value, None) {
        tracing::error!(%call_id, key = cache_key, error = %e, "result not cached");
        degraded = true;
    }

    tracing::info!(%call_id, service, duration_ms, degraded, "metered call complete");

    Ok(Metered {
        value,
        from_cache: false,
        quota: info,
        degraded,
    })
}
