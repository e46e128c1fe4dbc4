//! JSONL file event store.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::store::{AuditError, AuditRecord, AuditStore};

/// Event store appending one JSON object per line to a file.
pub struct JsonlAuditStore {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlAuditStore {
    /// Open (or create) the event log at `path`, creating parent
    /// directories as needed.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, AuditError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Path of the event log.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditStore for JsonlAuditStore {
    fn append(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let line = serde_json::to_string(record)?;
        let mut file = self.file.lock().expect("poisoned");
        writeln!(file, "{}", line)?;
        Ok(())
    }
}
