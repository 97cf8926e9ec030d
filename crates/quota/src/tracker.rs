//! Per-service quota ledger with durable persistence.
//!
//! Every operation first settles the service's window (applies a pending
//! reset), then reads or mutates it. All of that happens under one lock, so
//! a [`QuotaTracker::reserve`] is an atomic check-and-reserve: two callers
//! can never both take the last unit.
//!
//! Reserved units are held in memory only. They turn into durable `used`
//! units when the caller commits after its remote call succeeded; dropping
//! the [`Reservation`] instead (error, timeout, cancellation) gives them back.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use sara_domain::clock::Clock;
use sara_domain::config::{QuotaConfig, ServiceQuota};
use sara_domain::error::{Error, QuotaExceeded, Result};
use sara_domain::trace::TraceEvent;
use sara_storage::{load_json, save_json, KvStore};

use crate::policy;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Durable window state for one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaState {
    pub used: u64,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub window_start: DateTime<Utc>,
}

impl QuotaState {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            used: 0,
            window_start: now,
        }
    }
}

/// Read-only snapshot of one service's quota.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaInfo {
    pub service: String,
    pub used: u64,
    /// `ceiling - used`, floored at zero. In-flight reservations are not
    /// subtracted; see `pending`.
    pub remaining: u64,
    pub ceiling: u64,
    /// Units reserved by calls still in flight.
    pub pending: u64,
    pub reset_at: DateTime<Utc>,
}

#[derive(Default)]
struct Ledger {
    states: BTreeMap<String, QuotaState>,
    pending: HashMap<String, u64>,
}

impl Ledger {
    fn pending(&self, service: &str) -> u64 {
        self.pending.get(service).copied().unwrap_or(0)
    }

    /// Apply a due reset (or create the window on first use).
    /// Returns `true` when durable state changed.
    fn settle(&mut self, service: &str, quota: &ServiceQuota, now: DateTime<Utc>) -> bool {
        match self.states.get_mut(service) {
            None => {
                self.states.insert(service.to_owned(), QuotaState::fresh(now));
                true
            }
            Some(state) if policy::is_due(&quota.reset, state.window_start, now) => {
                TraceEvent::QuotaReset {
                    service: service.to_owned(),
                    previous_used: state.used,
                }
                .emit();
                *state = QuotaState::fresh(now);
                true
            }
            Some(_) => false,
        }
    }

    fn state(&self, service: &str, now: DateTime<Utc>) -> QuotaState {
        self.states
            .get(service)
            .copied()
            .unwrap_or_else(|| QuotaState::fresh(now))
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// QuotaTracker
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Gatekeeper for every quota-consuming remote call.
///
/// Thread-safe (uses `parking_lot::Mutex`). Constructed once at startup and
/// shared through `Arc`; the durable record under `storage_key` is written
/// only by this type.
pub struct QuotaTracker {
    services: BTreeMap<String, ServiceQuota>,
    store: Arc<dyn KvStore>,
    storage_key: String,
    clock: Arc<dyn Clock>,
    ledger: Mutex<Ledger>,
}

impl QuotaTracker {
    /// Load the ledger from `store` (starting empty if the record is missing
    /// or unreadable).
    pub fn new(
        config: &QuotaConfig,
        store: Arc<dyn KvStore>,
        storage_key: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let storage_key = storage_key.into();
        let states: BTreeMap<String, QuotaState> =
            load_json(store.as_ref(), &storage_key).unwrap_or_default();

        tracing::info!(
            services = config.services.len(),
            restored = states.len(),
            key = %storage_key,
            "quota tracker loaded"
        );

        Self {
            services: config.services.clone(),
            store,
            storage_key,
            clock,
            ledger: Mutex::new(Ledger {
                states,
                pending: HashMap::new(),
            }),
        }
    }

    /// Names of every configured service.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    /// Whether one more unit may be spent right now (`used + pending < ceiling`).
    ///
    /// Does not spend anything. Prefer [`reserve`](Self::reserve) when the
    /// answer will be acted on.
    pub fn check_limit(&self, service: &str) -> Result<bool> {
        let quota = self.quota(service)?;
        let now = self.clock.now();
        let mut ledger = self.ledger.lock();
        if ledger.settle(service, &quota, now) {
            self.persist_best_effort(&ledger);
        }
        let used = ledger.state(service, now).used;
        Ok(used.saturating_add(ledger.pending(service)) < quota.ceiling)
    }

    /// Like [`check_limit`](Self::check_limit), but a refusal comes back as
    /// `Error::QuotaExceeded` carrying the structured detail.
    pub fn ensure_within_limit(&self, service: &str) -> Result<()> {
        if self.check_limit(service)? {
            Ok(())
        } else {
            Err(Error::QuotaExceeded(self.exceeded(service)?))
        }
    }

    /// Record `cost` units spent after a successful remote call.
    ///
    /// Never clamps: incrementing past the ceiling is recorded as-is. The
    /// in-memory ledger is updated even when the durable write fails, in
    /// which case `Error::Storage` is returned.
    pub fn increment_counter(&self, service: &str, cost: u64) -> Result<QuotaInfo> {
        let quota = self.quota(service)?;
        let mut ledger = self.ledger.lock();
        self.spend_locked(&mut ledger, service, &quota, cost)
    }

    /// Atomically check that `cost` more units fit and set them aside.
    ///
    /// Fails with `Error::QuotaExceeded` when `used + pending + cost` would
    /// pass the ceiling. The returned guard must be
    /// [`commit`](Reservation::commit)ted once the remote call succeeds.
    pub fn reserve(&self, service: &str, cost: u64) -> Result<Reservation<'_>> {
        if cost == 0 {
            return Err(Error::InvalidInput("reservation cost must be at least 1".into()));
        }
        let quota = self.quota(service)?;
        let now = self.clock.now();
        let mut ledger = self.ledger.lock();
        if ledger.settle(service, &quota, now) {
            self.persist_best_effort(&ledger);
        }

        let used = ledger.state(service, now).used;
        let pending = ledger.pending(service);
        let committed = used.saturating_add(pending);
        if committed.saturating_add(cost) > quota.ceiling {
            TraceEvent::QuotaRejected {
                service: service.to_owned(),
                used: committed,
                ceiling: quota.ceiling,
            }
            .emit();
            let state = ledger.state(service, now);
            return Err(Error::QuotaExceeded(QuotaExceeded {
                service: service.to_owned(),
                reset_at: policy::next_reset(&quota.reset, state.window_start, now),
                used,
                remaining: quota.ceiling.saturating_sub(committed),
                ceiling: quota.ceiling,
            }));
        }

        *ledger.pending.entry(service.to_owned()).or_insert(0) += cost;
        TraceEvent::QuotaReserved {
            service: service.to_owned(),
            cost,
            used,
            pending: pending + cost,
            ceiling: quota.ceiling,
        }
        .emit();

        Ok(Reservation {
            tracker: self,
            service: service.to_owned(),
            cost,
            settled: false,
        })
    }

    /// `{used, remaining, ceiling}` after applying any pending reset.
    pub fn quota_info(&self, service: &str) -> Result<QuotaInfo> {
        let quota = self.quota(service)?;
        let now = self.clock.now();
        let mut ledger = self.ledger.lock();
        if ledger.settle(service, &quota, now) {
            self.persist_best_effort(&ledger);
        }
        Ok(self.info_locked(&ledger, service, &quota, now))
    }

    /// Next instant at which `service`'s window resets. Read-only.
    pub fn reset_time(&self, service: &str) -> Result<DateTime<Utc>> {
        let quota = self.quota(service)?;
        let now = self.clock.now();
        let ledger = self.ledger.lock();
        let state = ledger.state(service, now);
        Ok(policy::next_reset(&quota.reset, state.window_start, now))
    }

    /// Quota info for every configured service, sorted by name.
    pub fn snapshot(&self) -> Vec<QuotaInfo> {
        let now = self.clock.now();
        let mut ledger = self.ledger.lock();
        let mut changed = false;
        for (service, quota) in &self.services {
            changed |= ledger.settle(service, quota, now);
        }
        if changed {
            self.persist_best_effort(&ledger);
        }
        self.services
            .iter()
            .map(|(service, quota)| self.info_locked(&ledger, service, quota, now))
            .collect()
    }

    /// Forget every window, in memory and durably.
    ///
    /// Reservations already handed out stay outstanding until they are
    /// committed or dropped.
    pub fn clear(&self) -> Result<()> {
        let mut ledger = self.ledger.lock();
        ledger.states.clear();
        tracing::info!(key = %self.storage_key, "quota ledger cleared");
        self.persist(&ledger)
    }

    /// The structured rejection for `service` as it stands now.
    pub fn exceeded(&self, service: &str) -> Result<QuotaExceeded> {
        let info = self.quota_info(service)?;
        Ok(QuotaExceeded {
            service: info.service,
            reset_at: info.reset_at,
            used: info.used,
            remaining: info.ceiling.saturating_sub(info.used.saturating_add(info.pending)),
            ceiling: info.ceiling,
        })
    }

    // ── Private ──────────────────────────────────────────────────────

    fn quota(&self, service: &str) -> Result<ServiceQuota> {
        self.services
            .get(service)
            .copied()
            .ok_or_else(|| Error::UnknownService(service.to_owned()))
    }

    fn info_locked(
        &self,
        ledger: &Ledger,
        service: &str,
        quota: &ServiceQuota,
        now: DateTime<Utc>,
    ) -> QuotaInfo {
        let state = ledger.state(service, now);
        QuotaInfo {
            service: service.to_owned(),
            used: state.used,
            remaining: quota.ceiling.saturating_sub(state.used),
            ceiling: quota.ceiling,
            pending: ledger.pending(service),
            reset_at: policy::next_reset(&quota.reset, state.window_start, now),
        }
    }

    fn persist(&self, ledger: &Ledger) -> Result<()> {
        save_json(self.store.as_ref(), &self.storage_key, &ledger.states)
    }

    /// Read paths only write when a reset fired; a failure there must not
    /// turn a read into an error.
    fn persist_best_effort(&self, ledger: &Ledger) {
        if let Err(e) = self.persist(ledger) {
            tracing::warn!(key = %self.storage_key, error = %e, "failed to persist quota reset");
        }
    }

    fn spend_locked(
        &self,
        ledger: &mut Ledger,
        service: &str,
        quota: &ServiceQuota,
        cost: u64,
    ) -> Result<QuotaInfo> {
        let now = self.clock.now();
        ledger.settle(service, quota, now);
        let used = {
            let state = ledger
                .states
                .get_mut(service)
                .ok_or_else(|| Error::UnknownService(service.to_owned()))?;
            state.used = state.used.saturating_add(cost);
            state.used
        };

        TraceEvent::QuotaCommitted {
            service: service.to_owned(),
            cost,
            used,
        }
        .emit();

        self.persist(ledger)?;
        Ok(self.info_locked(ledger, service, quota, now))
    }

    /// Pending units become used units under a single lock, so no other
    /// reservation can slip in between.
    fn commit_reserved(&self, service: &str, cost: u64) -> Result<QuotaInfo> {
        let quota = self.quota(service)?;
        let mut ledger = self.ledger.lock();
        release_pending(&mut ledger, service, cost);
        self.spend_locked(&mut ledger, service, &quota, cost)
    }

    fn release(&self, service: &str, cost: u64) {
        let mut ledger = self.ledger.lock();
        release_pending(&mut ledger, service, cost);
        TraceEvent::QuotaReleased {
            service: service.to_owned(),
            cost,
        }
        .emit();
    }
}

fn release_pending(ledger: &mut Ledger, service: &str, cost: u64) {
    if let Some(pending) = ledger.pending.get_mut(service) {
        *pending = pending.saturating_sub(cost);
        if *pending == 0 {
            ledger.pending.remove(service);
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Reservation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Units set aside by [`QuotaTracker::reserve`].
///
/// Commit after the remote call succeeds; drop (explicitly or by unwinding
/// out of the call) to give the units back.
#[must_use = "dropping a reservation releases it without spending quota"]
pub struct Reservation<'a> {
    tracker: &'a QuotaTracker,
    service: String,
    cost: u64,
    settled: bool,
}

impl Reservation<'_> {
    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn cost(&self) -> u64 {
        self.cost
    }

    /// Spend the reserved units. Storage failures are reported the same way
    /// as [`QuotaTracker::increment_counter`]; the units count either way.
    pub fn commit(mut self) -> Result<QuotaInfo> {
        self.settled = true;
        self.tracker.commit_reserved(&self.service, self.cost)
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.tracker.release(&self.service, self.cost);
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
