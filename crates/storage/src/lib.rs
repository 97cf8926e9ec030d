//! Durable key-value storage for sara.
//!
//! Each stateful component owns exactly one record key and reads/writes it
//! through a [`KvStore`]. Two adapters ship here: [`FileStore`] (one JSON
//! file per key) and [`MemoryStore`] (tests, with failure injection).

pub mod fs;
pub mod json;
pub mod kv;
pub mod memory;

pub use fs::FileStore;
pub use json::{load_json, save_json};
pub use kv::KvStore;
pub use memory::MemoryStore;
