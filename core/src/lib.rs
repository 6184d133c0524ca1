// Allow uppercase acronyms for industry-standard terms like SSD
#![allow(clippy::upper_case_acronyms)]

pub mod algorithms;
pub mod audit;
pub mod config;
pub mod crypto;
pub mod drives;
pub mod engine;
pub mod error;
pub mod ui;
pub mod wipe_orchestrator;

// Re-export the main entry points for convenience
pub use audit::{AuditRecordBuilder, HistoryLedger, VerificationService, WipeRecord};
pub use config::{Settings, SettingsLoader};
pub use engine::EraseEngine;
pub use error::{AuditError, AuditResult, EraseError, EraseResult, WipeError};
pub use wipe_orchestrator::{WipeOrchestrator, WipeOutcome};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation flag shared between a running wipe and whoever may stop it
/// (the CLI wires SIGINT to it).
///
/// The engine only looks at the flag between passes. A pass that has started
/// always runs to completion, so a cancelled wipe stops on a pass boundary.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation at the next pass boundary
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clear a previous request so the engine can be reused
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// What kind of storage a wipe target is. Selects the overwrite strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    File,
    DirectoryTree,
    BlockDevice,
    SSD,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetKind::File => "file",
            TargetKind::DirectoryTree => "directory tree",
            TargetKind::BlockDevice => "block device",
            TargetKind::SSD => "SSD",
        };
        f.write_str(name)
    }
}

/// Identifies what is to be destroyed. Built by the caller before erasure
/// begins and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WipeTarget {
    path: PathBuf,
    kind: TargetKind,
}

impl WipeTarget {
    pub fn new(path: impl Into<PathBuf>, kind: TargetKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(path, TargetKind::File)
    }

    pub fn directory_tree(path: impl Into<PathBuf>) -> Self {
        Self::new(path, TargetKind::DirectoryTree)
    }

    pub fn block_device(path: impl Into<PathBuf>) -> Self {
        Self::new(path, TargetKind::BlockDevice)
    }

    pub fn ssd(path: impl Into<PathBuf>) -> Self {
        Self::new(path, TargetKind::SSD)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Name recorded in the audit record: the last path component, or the
    /// whole path when there is none (e.g. `/`).
    pub fn display_name(&self) -> String {
        match self.path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => self.path.display().to_string(),
        }
    }
}

/// Whether the engine writes to the target at all.
///
/// `DryRun` is an explicit opt-in for rehearsals. It never writes, its report
/// is flagged as simulated, and a simulated wipe is never attested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EraseMode {
    #[default]
    Live,
    DryRun,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EraseOptions {
    /// Random passes for files (each file also gets one final zero pass).
    /// Block devices always use the fixed random/zero/random sequence.
    pub passes: u32,
    /// Size of the write buffer used while streaming a pass
    pub chunk_size: usize,
    pub mode: EraseMode,
}

impl Default for EraseOptions {
    fn default() -> Self {
        Self {
            passes: algorithms::file::FileWipe::DEFAULT_PASSES,
            chunk_size: algorithms::DEFAULT_CHUNK_SIZE,
            mode: EraseMode::Live,
        }
    }
}

impl EraseOptions {
    pub fn dry_run(mut self) -> Self {
        self.mode = EraseMode::DryRun;
        self
    }

    pub fn with_passes(mut self, passes: u32) -> Self {
        self.passes = passes;
        self
    }
}

/// What a successful erase did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EraseReport {
    pub kind: TargetKind,
    /// Passes completed on the target; for trees, the passes applied to each file
    pub passes_completed: u32,
    pub bytes_overwritten: u64,
    pub files_erased: u64,
    pub directories_removed: u64,
    /// True when produced by `EraseMode::DryRun`
    pub simulated: bool,
}

impl EraseReport {
    pub(crate) fn empty(kind: TargetKind) -> Self {
        Self {
            kind,
            passes_completed: 0,
            bytes_overwritten: 0,
            files_erased: 0,
            directories_removed: 0,
            simulated: false,
        }
    }
}
