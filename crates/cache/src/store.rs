//! The result cache proper.
//!
//! Expiry is lazy: every `get` and `set` first purges logically expired
//! entries, so correctness never depends on a background timer. The size
//! bound evicts by insertion time (oldest `stored_at` first, ties in
//! insertion order), not by last access.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use sara_domain::clock::Clock;
use sara_domain::config::CacheConfig;
use sara_domain::error::{Error, Result};
use sara_domain::trace::TraceEvent;
use sara_storage::{load_json, save_json, KvStore};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One cached payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub value: Value,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub stored_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_accessed_at: DateTime<Utc>,
    /// Insertion order, used to break `stored_at` ties on eviction.
    #[serde(skip)]
    seq: u64,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Aggregate cache telemetry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub total_entries: usize,
    pub oldest_entry: Option<DateTime<Utc>>,
    pub newest_entry: Option<DateTime<Utc>>,
    /// Sum of the serialized payload lengths.
    pub total_size_bytes: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub miss_rate: f64,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    next_seq: u64,
    hits: u64,
    misses: u64,
}

impl CacheInner {
    /// Drop every logically expired entry. Returns how many went.
    fn sweep(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let expired = before - self.entries.len();
        if expired > 0 {
            TraceEvent::CacheSwept { expired }.emit();
        }
        expired
    }

    /// Evict oldest-inserted entries until at most `max` remain.
    fn enforce_bound(&mut self, max: usize) -> usize {
        let overflow = self.entries.len().saturating_sub(max);
        if overflow == 0 {
            return 0;
        }

        let mut by_age: Vec<(DateTime<Utc>, u64, String)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.stored_at, entry.seq, key.clone()))
            .collect();
        by_age.sort();

        for (_, _, key) in by_age.into_iter().take(overflow) {
            self.entries.remove(&key);
            TraceEvent::CacheEvicted {
                key,
                reason: "capacity",
            }
            .emit();
        }
        overflow
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// ResultCache
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Bounded, expiring, durably persisted key-value cache.
///
/// The check-sweep-mutate sequence of each operation runs under one lock.
pub struct ResultCache {
    store: Arc<dyn KvStore>,
    storage_key: String,
    clock: Arc<dyn Clock>,
    max_entries: usize,
    default_ttl: Duration,
    inner: Mutex<CacheInner>,
}

impl ResultCache {
    /// Load the cache record from `store`, dropping anything that expired
    /// or no longer fits while the process was down.
    pub fn new(
        config: &CacheConfig,
        store: Arc<dyn KvStore>,
        storage_key: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let storage_key = storage_key.into();
        let loaded: HashMap<String, CacheEntry> =
            load_json(store.as_ref(), &storage_key).unwrap_or_default();

        // Restore insertion order from stored_at; key order is the tiebreak.
        let mut ordered: Vec<(String, CacheEntry)> = loaded.into_iter().collect();
        ordered.sort_by(|a, b| (a.1.stored_at, &a.0).cmp(&(b.1.stored_at, &b.0)));
        let next_seq = ordered.len() as u64;
        let entries = ordered
            .into_iter()
            .enumerate()
            .map(|(seq, (key, mut entry))| {
                entry.seq = seq as u64;
                (key, entry)
            })
            .collect();

        let cache = Self {
            store,
            storage_key,
            clock,
            max_entries: config.max_entries,
            default_ttl: ttl_from_secs(config.default_ttl_secs),
            inner: Mutex::new(CacheInner {
                entries,
                next_seq,
                hits: 0,
                misses: 0,
            }),
        };

        {
            let mut inner = cache.inner.lock();
            let now = cache.clock.now();
            let dropped = inner.sweep(now) + inner.enforce_bound(cache.max_entries);
            if dropped > 0 {
                cache.persist_best_effort(&inner);
            }
            tracing::info!(
                entries = inner.entries.len(),
                dropped,
                key = %cache.storage_key,
                "result cache loaded"
            );
        }

        cache
    }

    /// The cached value for `key`, or `None` if it was never stored or has
    /// expired. A hit refreshes the entry's `last_accessed_at`.
    pub fn get(&self, key: &str) -> Option<Value> {
        let now = self.clock.now();
        let mut inner = self.inner.lock();
        let swept = inner.sweep(now);

        let value = match inner.entries.get_mut(key) {
            Some(entry) => {
                entry.last_accessed_at = now;
                Some(entry.value.clone())
            }
            None => None,
        };

        if value.is_some() {
            inner.hits += 1;
            tracing::debug!(key, "cache hit");
        } else {
            inner.misses += 1;
            tracing::debug!(key, "cache miss");
        }

        if value.is_some() || swept > 0 {
            self.persist_best_effort(&inner);
        }
        value
    }

    /// Typed [`get`](Self::get). A payload that no longer decodes as `T` is
    /// treated as a miss.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                tracing::warn!(key, error = %e, "cached payload has unexpected shape");
                None
            }
        }
    }

    /// Store `value` under `key`, replacing any previous entry.
    ///
    /// `ttl` defaults to the configured TTL and must be positive. After the
    /// insert the oldest entries are evicted until the size bound holds.
    pub fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let ttl = ttl.unwrap_or(self.default_ttl);
        if ttl <= Duration::zero() {
            return Err(Error::InvalidInput(format!(
                "cache ttl must be positive, got {}ms",
                ttl.num_milliseconds()
            )));
        }

        let now = self.clock.now();
        let expires_at = now
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut inner = self.inner.lock();
        inner.sweep(now);
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.entries.insert(
            key.to_owned(),
            CacheEntry {
                value,
                stored_at: now,
                expires_at,
                last_accessed_at: now,
                seq,
            },
        );
        inner.enforce_bound(self.max_entries);
        tracing::debug!(key, entries = inner.entries.len(), "cache set");

        self.persist(&inner)
    }

    /// Typed [`set`](Self::set).
    pub fn set_as<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.set(key, value, ttl)
    }

    /// Remove `key`. Returns whether an entry was physically present.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut inner = self.inner.lock();
        let removed = inner.entries.remove(key).is_some();
        if removed {
            TraceEvent::CacheEvicted {
                key: key.to_owned(),
                reason: "removed",
            }
            .emit();
        }
        self.persist(&inner)?;
        Ok(removed)
    }

    /// Drop every entry. Hit/miss counters are kept.
    pub fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        tracing::info!(key = %self.storage_key, "result cache cleared");
        self.persist(&inner)
    }

    /// Aggregate telemetry over the entries that are still live.
    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let inner = self.inner.lock();

        let live: Vec<&CacheEntry> = inner
            .entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .collect();
        let total_size_bytes = live
            .iter()
            .map(|entry| serde_json::to_vec(&entry.value).map(|b| b.len()).unwrap_or(0))
            .sum();

        let lookups = inner.hits + inner.misses;
        let (hit_rate, miss_rate) = if lookups == 0 {
            (0.0, 0.0)
        } else {
            (
                inner.hits as f64 / lookups as f64,
                inner.misses as f64 / lookups as f64,
            )
        };

        CacheStats {
            total_entries: live.len(),
            oldest_entry: live.iter().map(|entry| entry.stored_at).min(),
            newest_entry: live.iter().map(|entry| entry.stored_at).max(),
            total_size_bytes,
            hits: inner.hits,
            misses: inner.misses,
            hit_rate,
            miss_rate,
        }
    }

    // ── Private ──────────────────────────────────────────────────────

    fn persist(&self, inner: &CacheInner) -> Result<()> {
        save_json(self.store.as_ref(), &self.storage_key, &inner.entries)
    }

    fn persist_best_effort(&self, inner: &CacheInner) {
        if let Err(e) = self.persist(inner) {
            tracing::warn!(key = %self.storage_key, error = %e, "failed to persist cache");
        }
    }
}

fn ttl_from_secs(secs: u64) -> Duration {
    i64::try_from(secs)
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::MAX)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
