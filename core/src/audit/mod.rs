// Signed audit trail: record construction, the history ledger and
// verification of past wipes.

pub mod builder;
pub mod ledger;
pub mod record;
pub mod report;
pub mod verify;


pub use builder::AuditRecordBuilder;
pub use ledger::HistoryLedger;
pub use record::WipeRecord;
pub use report::{ArtifactPaths, ReportRenderer, TextReportRenderer};
pub use verify::VerificationService;

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Replace `path` with `bytes` so readers see either the old or the new
/// content. The temporary file lives in the target directory so the final
/// rename never crosses a filesystem.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => parent,
        None => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    // Make the rename itself durable
    File::open(parent)?.sync_all()
}
