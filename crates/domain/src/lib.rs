//! Shared types for the sara workspace: configuration, the common error
//! type, the injectable clock and structured trace events.

pub mod clock;
pub mod config;
pub mod error;
pub mod trace;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, QuotaExceeded, Result};
