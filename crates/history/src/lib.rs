//! Bounded, most-recent-first viewing history with favorites and reading
//! progress.

pub mod store;

pub use store::{HistoryEntry, HistoryRecord, HistoryStore};
