// Erase engine - picks and runs the overwrite strategy for a target kind
//
// Regular files and directory trees are overwritten in place, block devices
// get the clear-method sequence and SSDs go through the drive's own secure
// erase. No strategy retries; the first failure is returned to the caller.

use crate::algorithms::{
    ClearWipe, FileWipe, MediumOpener, NoFollowOpener, NoopObserver, PassContext, PassObserver,
    TreeWipe,
};
use crate::drives::{HdparmSecureErase, SecureEraseUnit, SsdWipe};
use crate::error::{EraseError, EraseResult};
use crate::{CancelToken, EraseMode, EraseOptions, EraseReport, TargetKind, WipeTarget};
use std::fs::{self, File};
use std::io::{Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;
use walkdir::WalkDir;

pub struct EraseEngine {
    secure_erase: Box<dyn SecureEraseUnit>,
    opener: Box<dyn MediumOpener>,
    cancel: CancelToken,
    /// Held for the whole of a wipe; one wipe per engine at a time
    in_flight: Mutex<()>,
}

impl Default for EraseEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl EraseEngine {
    pub fn new() -> Self {
        Self::with_secure_erase_unit(Box::new(HdparmSecureErase::new()))
    }

    pub fn with_secure_erase_unit(secure_erase: Box<dyn SecureEraseUnit>) -> Self {
        Self {
            secure_erase,
            opener: Box::new(NoFollowOpener),
            cancel: CancelToken::new(),
            in_flight: Mutex::new(()),
        }
    }

    /// Replace how regular files are opened for overwriting
    pub fn with_medium_opener(mut self, opener: Box<dyn MediumOpener>) -> Self {
        self.opener = opener;
        self
    }

    /// Handle for stopping the running wipe at its next pass boundary
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn erase(&self, target: &WipeTarget, options: &EraseOptions) -> EraseResult<EraseReport> {
        self.erase_observed(target, options, &mut NoopObserver)
    }

    pub fn erase_observed(
        &self,
        target: &WipeTarget,
        options: &EraseOptions,
        observer: &mut dyn PassObserver,
    ) -> EraseResult<EraseReport> {
        validate_options(options)?;

        // The guard protects no data, so a panicked previous wipe is no reason to refuse
        let _guard = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let path = target.path();
        tracing::info!(
            path = %path.display(),
            kind = %target.kind(),
            mode = ?options.mode,
            "Starting erase"
        );

        if options.mode == EraseMode::DryRun {
            return simulate(target, options);
        }

        let mut ctx = PassContext {
            cancel: &self.cancel,
            observer,
            chunk_size: options.chunk_size,
        };

        let result = match target.kind() {
            TargetKind::File => {
                FileWipe::wipe_opened(path, options.passes, &mut ctx, self.opener.as_ref())
            }
            TargetKind::DirectoryTree => {
                TreeWipe::wipe_opened(path, options.passes, &mut ctx, self.opener.as_ref())
            }
            TargetKind::BlockDevice => ClearWipe::wipe(path, &mut ctx),
            TargetKind::SSD => SsdWipe::run(self.secure_erase.as_ref(), path, &self.cancel),
        };

        match &result {
            Ok(report) => tracing::info!(
                path = %path.display(),
                passes = report.passes_completed,
                bytes = report.bytes_overwritten,
                "Erase completed"
            ),
            Err(e) => tracing::error!(path = %path.display(), error = %e, "Erase failed"),
        }
        result
    }
}

fn validate_options(options: &EraseOptions) -> EraseResult<()> {
    FileWipe::check_passes(options.passes)?;
    if options.chunk_size == 0 {
        return Err(EraseError::InvalidOptions(
            "chunk size must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Check the target and plan the passes without writing. The report
/// describes what a live run would do.
fn simulate(target: &WipeTarget, options: &EraseOptions) -> EraseResult<EraseReport> {
    let path = target.path();
    let kind = target.kind();
    let mut report = EraseReport {
        simulated: true,
        ..EraseReport::empty(kind)
    };

    match kind {
        TargetKind::File => {
            let meta = fs::symlink_metadata(path).map_err(|e| EraseError::from_io(path, e))?;
            if !meta.file_type().is_file() {
                return Err(unsupported(path, "not a regular file"));
            }
            report.passes_completed = FileWipe::plan(options.passes).len() as u32;
            report.bytes_overwritten = meta.len() * u64::from(report.passes_completed);
            report.files_erased = 1;
        }
        TargetKind::DirectoryTree => {
            let meta = fs::symlink_metadata(path).map_err(|e| EraseError::from_io(path, e))?;
            if !meta.file_type().is_dir() {
                return Err(unsupported(path, "not a directory"));
            }
            let passes = FileWipe::plan(options.passes).len() as u32;
            report.passes_completed = passes;
            for entry in WalkDir::new(path).follow_links(false) {
                let entry = entry.map_err(|e| {
                    let at = e.path().unwrap_or(path).to_path_buf();
                    let source = e
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                    EraseError::from_io(&at, source)
                })?;
                if entry.file_type().is_dir() {
                    report.directories_removed += 1;
                } else if entry.file_type().is_file() {
                    let len = entry.metadata().map(|m| m.len()).unwrap_or(0);
                    report.files_erased += 1;
                    report.bytes_overwritten += len * u64::from(passes);
                }
            }
        }
        TargetKind::BlockDevice => {
            let mut device = File::open(path).map_err(|e| EraseError::from_io(path, e))?;
            if device.metadata().map(|m| m.is_dir()).unwrap_or(false) {
                return Err(unsupported(path, "a directory is not a block device"));
            }
            let extent = device
                .seek(SeekFrom::End(0))
                .map_err(|e| EraseError::from_io(path, e))?;
            report.passes_completed = ClearWipe::PLAN.len() as u32;
            report.bytes_overwritten = extent * u64::from(report.passes_completed);
        }
        TargetKind::SSD => {
            fs::metadata(path).map_err(|e| EraseError::from_io(path, e))?;
            report.passes_completed = 1;
        }
    }

    tracing::info!(
        path = %path.display(),
        passes = report.passes_completed,
        bytes = report.bytes_overwritten,
        "Dry run: nothing was written"
    );
    Ok(report)
}

fn unsupported(path: &Path, reason: &str) -> EraseError {
    EraseError::UnsupportedTarget {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
