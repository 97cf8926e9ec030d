//! Quota accounting for the remote services sara pays for.
//!
//! [`QuotaTracker`] keeps one window per configured service, applies the
//! service's [`ResetPolicy`](sara_domain::config::ResetPolicy) lazily on every
//! access and persists the ledger after each change.

pub mod policy;
pub mod tracker;

pub use tracker::{QuotaInfo, QuotaState, QuotaTracker, Reservation};
