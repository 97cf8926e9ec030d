use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use sara_domain::error::{Error, Result};

use crate::kv::KvStore;

/// In-process store. Survives as long as the value does, which is enough to
/// exercise restart behaviour by building a second component over the same
/// `Arc<MemoryStore>`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `read` fail with `Error::Storage`.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `write` fail with `Error::Storage`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw bytes currently stored under `key`.
    pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.records.lock().get(key).cloned()
    }
}

impl KvStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::storage(key, "read failure injected"));
        }
        Ok(self.records.lock().get(key).cloned())
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::storage(key, "write failure injected"));
        }
        self.records.lock().insert(key.to_owned(), bytes.to_vec());
        Ok(())
    }
}
