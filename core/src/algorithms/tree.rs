// Bottom-up wipe of a directory tree.
//
// Deepest entries come first and the root is removed last. Regular files go
// through `FileWipe`; symbolic links and special files are unlinked without
// following them; directories are removed once their contents are gone.

use super::file::FileWipe;
use super::{MediumOpener, NoFollowOpener, PassContext};
use crate::error::{EraseError, EraseResult};
use crate::{CancelToken, EraseReport, TargetKind};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub struct TreeWipe;

impl TreeWipe {
    pub fn wipe(root: &Path, passes: u32, ctx: &mut PassContext<'_>) -> EraseResult<EraseReport> {
        Self::wipe_opened(root, passes, ctx, &NoFollowOpener)
    }

    /// `wipe`, opening every regular file through `opener`
    pub fn wipe_opened(
        root: &Path,
        passes: u32,
        ctx: &mut PassContext<'_>,
        opener: &dyn MediumOpener,
    ) -> EraseResult<EraseReport> {
        FileWipe::check_passes(passes)?;
        let cancel = ctx.cancel;
        let mut report = Self::wipe_with(root, cancel, |file| {
            FileWipe::wipe_opened(file, passes, ctx, opener).map(|r| r.bytes_overwritten)
        })?;
        report.passes_completed = passes + 1;
        Ok(report)
    }

    /// Walk the tree bottom-up, handing each regular file to `wipe_file`,
    /// which must overwrite and remove it.
    pub fn wipe_with<F>(
        root: &Path,
        cancel: &CancelToken,
        mut wipe_file: F,
    ) -> EraseResult<EraseReport>
    where
        F: FnMut(&Path) -> EraseResult<u64>,
    {
        let meta = fs::symlink_metadata(root).map_err(|e| EraseError::from_io(root, e))?;
        if !meta.file_type().is_dir() {
            return Err(EraseError::UnsupportedTarget {
                path: root.to_path_buf(),
                reason: "not a directory".to_string(),
            });
        }

        let mut report = EraseReport::empty(TargetKind::DirectoryTree);
        let mut completed: Vec<PathBuf> = Vec::new();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .contents_first(true)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(root).to_path_buf();
                    let source = err
                        .into_io_error()
                        .unwrap_or_else(|| io::Error::other("filesystem loop in directory tree"));
                    return Err(partial(path, completed, source));
                }
            };

            if cancel.is_cancelled() {
                tracing::warn!(
                    root = %root.display(),
                    entries_done = completed.len(),
                    "Tree wipe cancelled between entries"
                );
                return Err(EraseError::WipeCancelled {
                    path: root.to_path_buf(),
                    passes_completed: 0,
                });
            }

            let path = entry.path();
            let file_type = entry.file_type();

            let step = if file_type.is_dir() {
                fs::remove_dir(path).map(|_| report.directories_removed += 1)
            } else if file_type.is_file() {
                match wipe_file(path) {
                    Ok(bytes) => {
                        report.files_erased += 1;
                        report.bytes_overwritten += bytes;
                        Ok(())
                    }
                    Err(err @ EraseError::WipeCancelled { .. }) => return Err(err),
                    Err(err) => {
                        let passes = err.passes_completed().unwrap_or(0);
                        return Err(EraseError::PartialOverwrite {
                            path: path.to_path_buf(),
                            passes_completed: passes,
                            completed_entries: completed,
                            source: err.into_io(),
                        });
                    }
                }
            } else {
                // Links and special files carry no content of this tree
                fs::remove_file(path)
            };

            if let Err(source) = step {
                return Err(partial(path.to_path_buf(), completed, source));
            }
            tracing::debug!(entry = %path.display(), "Tree entry removed");
            completed.push(path.to_path_buf());
        }

        tracing::info!(
            root = %root.display(),
            files = report.files_erased,
            directories = report.directories_removed,
            "Directory tree wiped"
        );
        Ok(report)
    }
}

fn partial(path: PathBuf, completed: Vec<PathBuf>, source: io::Error) -> EraseError {
    EraseError::PartialOverwrite {
        path,
        passes_completed: 0,
        completed_entries: completed,
        source,
    }
}
