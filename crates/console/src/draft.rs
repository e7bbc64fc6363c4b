//! Small JSON key/value cache for in-progress form drafts.
//!
//! All keys live in one file under the configured draft directory.  A
//! missing file reads as empty.  Writes go through a temp file and a rename
//! so a crash never leaves a half-written cache behind.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::ConsoleError;

/// Key under which today's distribution form is cached.
pub const TODAY_DISTRIBUTION_DRAFT_KEY: &str = "todayDistributionDraft";

const STORE_FILE: &str = "local-storage.json";

#[derive(Debug, Clone)]
pub struct DraftStore {
    path: PathBuf,
}

impl DraftStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STORE_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and deserialize `key`.  `Ok(None)` when the key is absent.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConsoleError> {
        let mut entries = self.read_all()?;
        match entries.remove(key) {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ConsoleError::Draft(format!("invalid entry '{key}': {e}"))),
            None => Ok(None),
        }
    }

    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConsoleError> {
        let value = serde_json::to_value(value)
            .map_err(|e| ConsoleError::Draft(format!("failed to encode '{key}': {e}")))?;
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value);
        self.write_all(&entries)
    }

    /// Drop `key`.  Removing an absent key is not an error.
    pub fn remove(&self, key: &str) -> Result<(), ConsoleError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }

    // ---- private helpers ----

    fn read_all(&self) -> Result<BTreeMap<String, Value>, ConsoleError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(ConsoleError::Draft(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw)
            .map_err(|e| ConsoleError::Draft(format!("corrupt {}: {e}", self.path.display())))
    }

    fn write_all(&self, entries: &BTreeMap<String, Value>) -> Result<(), ConsoleError> {
        let io_err = |e: std::io::Error| {
            ConsoleError::Draft(format!("failed to write {}: {e}", self.path.display()))
        };

        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let body = serde_json::to_vec_pretty(entries)
            .map_err(|e| ConsoleError::Draft(format!("failed to encode drafts: {e}")))?;

        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}
