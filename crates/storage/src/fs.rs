//! Directory-backed store: record `key` lives in `<root>/<key>.json`.
//!
//! Writes go to a sibling `.tmp` file first and are renamed into place, so a
//! crash mid-write leaves the previous record intact.

use std::io::Write;
use std::path::{Path, PathBuf};

use sara_domain::config::{is_valid_record_key, RECORD_KEY_RULE};
use sara_domain::error::{Error, Result};

use crate::kv::KvStore;

#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (creating if needed) the store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)
            .map_err(|e| Error::storage(root.display().to_string(), e))?;
        tracing::info!(path = %root.display(), "file store ready");
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if !is_valid_record_key(key) {
            return Err(Error::storage(key, RECORD_KEY_RULE));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl KvStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::storage(key, e)),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");

        let written = std::fs::File::create(&tmp).and_then(|mut f| {
            f.write_all(bytes)?;
            f.sync_all()
        });
        if let Err(e) = written {
            let _ = std::fs::remove_file(&tmp);
            return Err(Error::storage(key, e));
        }

        std::fs::rename(&tmp, &path).map_err(|e| {
            let _ = std::fs::remove_file(&tmp);
            Error::storage(key, e)
        })
    }
}
