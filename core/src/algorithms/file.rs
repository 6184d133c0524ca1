// Multi-pass overwrite of a single regular file.
//
// `passes` random passes, then one zero pass, each flushed with `sync_all`.
// The directory entry is removed only after every pass has succeeded, so a
// failed wipe leaves the (partially overwritten) file in place.

use super::{
    run_passes, MediumOpener, NoFollowOpener, PassContext, PassFailure, Pattern, WipeMedium,
};
use crate::error::{EraseError, EraseResult};
use crate::{EraseReport, TargetKind};
use std::fs;
use std::io;
use std::path::Path;

pub struct FileWipe;

impl FileWipe {
    pub const DEFAULT_PASSES: u32 = 3;

    /// Upper bound on random passes (the length of the Gutmann sequence)
    pub const MAX_PASSES: u32 = 35;

    /// `passes` random patterns followed by a single zero pattern
    pub fn plan(passes: u32) -> Vec<Pattern> {
        let mut plan = vec![Pattern::Random; passes.min(Self::MAX_PASSES) as usize];
        plan.push(Pattern::Zero);
        plan
    }

    pub fn check_passes(passes: u32) -> EraseResult<()> {
        if passes == 0 || passes > Self::MAX_PASSES {
            return Err(EraseError::InvalidOptions(format!(
                "passes must be between 1 and {}, got {}",
                Self::MAX_PASSES,
                passes
            )));
        }
        Ok(())
    }

    pub fn wipe(path: &Path, passes: u32, ctx: &mut PassContext<'_>) -> EraseResult<EraseReport> {
        Self::wipe_opened(path, passes, ctx, &NoFollowOpener)
    }

    /// `wipe`, writing the passes through whatever `opener` hands back
    pub fn wipe_opened(
        path: &Path,
        passes: u32,
        ctx: &mut PassContext<'_>,
        opener: &dyn MediumOpener,
    ) -> EraseResult<EraseReport> {
        Self::check_passes(passes)?;
        let meta = fs::symlink_metadata(path).map_err(|e| EraseError::from_io(path, e))?;
        if !meta.file_type().is_file() {
            return Err(EraseError::UnsupportedTarget {
                path: path.to_path_buf(),
                reason: "not a regular file".to_string(),
            });
        }

        let mut medium = opener.open(path).map_err(|e| EraseError::from_io(path, e))?;
        let bytes = Self::overwrite(medium.as_mut(), path, passes, ctx)?;
        drop(medium);

        let total = passes + 1;
        fs::remove_file(path).map_err(|source| unlink_failure(path, total, source))?;

        tracing::info!(path = %path.display(), passes = total, bytes, "File overwritten and removed");

        Ok(EraseReport {
            passes_completed: total,
            bytes_overwritten: bytes,
            files_erased: 1,
            ..EraseReport::empty(TargetKind::File)
        })
    }

    /// Run the file plan over `medium` without touching the directory entry
    pub fn overwrite(
        medium: &mut dyn WipeMedium,
        path: &Path,
        passes: u32,
        ctx: &mut PassContext<'_>,
    ) -> EraseResult<u64> {
        Self::check_passes(passes)?;
        run_passes(medium, path, &Self::plan(passes), ctx).map_err(|failure| match failure {
            PassFailure::Cancelled { completed } => EraseError::WipeCancelled {
                path: path.to_path_buf(),
                passes_completed: completed,
            },
            PassFailure::Io {
                completed, source, ..
            } => EraseError::PartialOverwrite {
                path: path.to_path_buf(),
                passes_completed: completed,
                completed_entries: Vec::new(),
                source,
            },
        })
    }
}

/// Every pass finished but the entry could not be removed
pub(crate) fn unlink_failure(path: &Path, passes_completed: u32, source: io::Error) -> EraseError {
    match source.kind() {
        io::ErrorKind::PermissionDenied => EraseError::PermissionDenied {
            path: path.to_path_buf(),
            source,
        },
        _ => EraseError::PartialOverwrite {
            path: path.to_path_buf(),
            passes_completed,
            completed_entries: Vec::new(),
            source,
        },
    }
}
