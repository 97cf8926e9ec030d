//! Bounded, expiring cache for expensive remote results (transcripts,
//! generated articles, summaries).
//!
//! Read-through is the caller's job: `get`, and on a miss call the remote
//! service and `set` the result.

pub mod keys;
pub mod store;

pub use store::{CacheEntry, CacheStats, ResultCache};
