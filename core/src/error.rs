// Typed failures for the erase engine and the signed audit subsystem.
//
// Nothing in the core retries. Every failure is handed back to the caller,
// and a failure from the erase engine means the target must not be attested.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Step of the vendor secure-erase sequence that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecureEraseStep {
    Preflight,
    SetPassword,
    EraseUnit,
}

impl fmt::Display for SecureEraseStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let step = match self {
            SecureEraseStep::Preflight => "running preflight checks",
            SecureEraseStep::SetPassword => "setting the temporary erase password",
            SecureEraseStep::EraseUnit => "issuing security erase unit",
        };
        f.write_str(step)
    }
}

#[derive(Error, Debug)]
pub enum EraseError {
    #[error("Target not found: {}", .0.display())]
    TargetNotFound(PathBuf),

    #[error("Insufficient permissions for {}: {source}", path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Some passes ran, then I/O failed. The target is neither intact nor
    /// securely erased.
    #[error(
        "Partial overwrite of {}: {passes_completed} pass(es) completed, {} entries finished before failure: {source}",
        path.display(),
        completed_entries.len()
    )]
    PartialOverwrite {
        path: PathBuf,
        passes_completed: u32,
        completed_entries: Vec<PathBuf>,
        #[source]
        source: io::Error,
    },

    #[error(
        "Device wipe failed on {} during pass {pass}/{total_passes} ({passes_completed} completed): {source}",
        device.display()
    )]
    DeviceWipeFailed {
        device: PathBuf,
        pass: u32,
        total_passes: u32,
        passes_completed: u32,
        #[source]
        source: io::Error,
    },

    #[error("Secure erase failed on {} while {step}: {reason}", device.display())]
    SecureEraseFailed {
        device: PathBuf,
        step: SecureEraseStep,
        reason: String,
    },

    #[error("Wipe of {} cancelled at a pass boundary after {passes_completed} completed pass(es)", path.display())]
    WipeCancelled { path: PathBuf, passes_completed: u32 },

    #[error("{} cannot be wiped as requested: {reason}", path.display())]
    UnsupportedTarget { path: PathBuf, reason: String },

    #[error("Invalid erase options: {0}")]
    InvalidOptions(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl EraseError {
    /// Classify an I/O error raised before any byte of the target was written
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => EraseError::TargetNotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => EraseError::PermissionDenied {
                path: path.to_path_buf(),
                source: err,
            },
            _ => EraseError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Number of passes that completed before this failure, if meaningful
    pub fn passes_completed(&self) -> Option<u32> {
        match self {
            EraseError::PartialOverwrite {
                passes_completed, ..
            }
            | EraseError::DeviceWipeFailed {
                passes_completed, ..
            }
            | EraseError::WipeCancelled {
                passes_completed, ..
            } => Some(*passes_completed),
            _ => None,
        }
    }

    /// Flatten into an `io::Error` carrying this error's message
    pub(crate) fn into_io(self) -> io::Error {
        match self {
            EraseError::PartialOverwrite { source, .. }
            | EraseError::Io { source, .. }
            | EraseError::PermissionDenied { source, .. }
            | EraseError::DeviceWipeFailed { source, .. } => source,
            EraseError::TargetNotFound(path) => io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} disappeared during the wipe", path.display()),
            ),
            other => io::Error::other(other.to_string()),
        }
    }
}

pub type EraseResult<T> = Result<T, EraseError>;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Signing key unavailable: {0}")]
    SigningKeyUnavailable(String),

    #[error("Wipe ledger {} is corrupt: {reason}", path.display())]
    LedgerCorrupt { path: PathBuf, reason: String },

    #[error("Signature does not match the audit record")]
    SignatureInvalid,

    #[error("Invalid content hash {0:?}: expected 64 hexadecimal characters")]
    InvalidContentHash(String),

    #[error("Invalid wipe record: {0}")]
    InvalidRecord(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Wipe cannot be attested: {0}")]
    NotAttestable(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type AuditResult<T> = Result<T, AuditError>;

/// Failure of the combined erase-then-attest flow
#[derive(Error, Debug)]
pub enum WipeError {
    #[error(transparent)]
    Erase(#[from] EraseError),

    #[error(transparent)]
    Audit(#[from] AuditError),
}
