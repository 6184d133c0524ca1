//! Append-only history of wipe records, persisted as one JSON array.
//!
//! Every append takes an exclusive `flock` on a sidecar `<ledger>.lock` file,
//! reads the whole collection, adds the record and writes the collection to
//! a temporary file that is fsynced and renamed over the ledger. A crash at
//! any point leaves either the old or the new ledger on disk, never a torn
//! one, and concurrent writers in other processes are serialized.

use super::record::{to_indented_json, WipeRecord};
use super::write_atomic;
use crate::error::{AuditError, AuditResult};
use nix::fcntl::{flock, FlockArg};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct HistoryLedger {
    path: PathBuf,
}

/// Held for the duration of a read-modify-write cycle
struct LedgerLock {
    file: File,
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        // Closing the descriptor releases the lock as well
        let _ = flock(self.file.as_raw_fd(), FlockArg::Unlock);
    }
}

impl HistoryLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    fn lock(&self) -> io::Result<LedgerLock> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.lock_path())?;
        flock(file.as_raw_fd(), FlockArg::LockExclusive).map_err(io::Error::from)?;
        Ok(LedgerLock { file })
    }

    fn corrupt(&self, reason: impl Into<String>) -> AuditError {
        AuditError::LedgerCorrupt {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }

    /// All records in insertion order. A missing ledger is empty.
    ///
    /// Only a file that is not an array of records is corrupt. Field
    /// contents are checked on append, so an odd `deleted_at` written by
    /// another tool still loads and can still be matched.
    pub fn load_all(&self) -> AuditResult<Vec<WipeRecord>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AuditError::Io(e)),
        };

        serde_json::from_slice(&bytes).map_err(|e| self.corrupt(e.to_string()))
    }

    /// Append one record; returns the number of records now in the ledger
    pub fn append(&self, record: WipeRecord) -> AuditResult<usize> {
        record.validate().map_err(AuditError::InvalidRecord)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let _lock = self.lock()?;
        let mut records = self.load_all()?;
        records.push(record);
        write_atomic(&self.path, &to_indented_json(&records)?)?;

        tracing::info!(
            ledger = %self.path.display(),
            records = records.len(),
            "Appended wipe record"
        );
        Ok(records.len())
    }
}
