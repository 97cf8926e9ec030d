use sara_domain::error::Result;

/// Byte-oriented durable store.
///
/// `read` returns `Ok(None)` for a key that was never written. Any failure
/// to reach or decode the backing medium is `Error::Storage`.
pub trait KvStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()>;
}
