//! JSON record helpers with the read/write failure policy shared by every
//! component: reads fail open, writes fail closed.

use serde::de::DeserializeOwned;
use serde::Serialize;

use sara_domain::error::{Error, Result};

use crate::kv::KvStore;

/// Load and decode a record.
///
/// Missing, unreadable and undecodable records all come back as `None`
/// (logged at `warn` for the latter two) so the caller starts from empty
/// state instead of failing.
pub fn load_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Option<T> {
    let bytes = match store.read(key) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "durable read failed, starting empty");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "durable record is corrupt, starting empty");
            None
        }
    }
}

/// Encode and write a record. Every failure is `Error::Storage`.
pub fn save_json<T: Serialize + ?Sized>(store: &dyn KvStore, key: &str, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)
        .map_err(|e| Error::storage(key, format!("serializing: {e}")))?;
    store.write(key, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use std::collections::BTreeMap;

    #[test]
    fn missing_record_is_none() {
        let store = MemoryStore::new();
        let loaded: Option<BTreeMap<String, u64>> = load_json(&store, "absent");
        assert!(loaded.is_none());
    }

    #[test]
    fn corrupt_record_is_none() {
        let store = MemoryStore::new();
        store.write("k", b"{not json").unwrap();
        let loaded: Option<BTreeMap<String, u64>> = load_json(&store, "k");
        assert!(loaded.is_none());
    }

    #[test]
    fn read_failure_is_none() {
        let store = MemoryStore::new();
        save_json(&store, "k", &BTreeMap::from([("a".to_string(), 1u64)])).unwrap();
        store.fail_reads(true);
        let loaded: Option<BTreeMap<String, u64>> = load_json(&store, "k");
        assert!(loaded.is_none());
    }

    #[test]
    fn write_failure_is_surfaced() {
        let store = MemoryStore::new();
        store.fail_writes(true);
        let err = save_json(&store, "k", &1u64).unwrap_err();
        assert!(err.is_storage());
    }

    #[test]
    fn saved_record_loads_back() {
        let store = MemoryStore::new();
        let record = BTreeMap::from([("llm".to_string(), 3u64)]);
        save_json(&store, "k", &record).unwrap();
        let loaded: BTreeMap<String, u64> = load_json(&store, "k").unwrap();
        assert_eq!(loaded, record);
    }
}
