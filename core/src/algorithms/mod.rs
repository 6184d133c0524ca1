// Overwrite strategies and the pass loop they share.
//
// Every strategy is a plan (an ordered list of patterns) run over a
// `WipeMedium`. A pass streams the pattern through a fixed-size buffer from
// the first to the last byte, then forces the data to stable storage before
// it counts as complete.

pub mod clear;
pub mod file;
pub mod tree;


pub use clear::ClearWipe;
pub use file::FileWipe;
pub use tree::TreeWipe;

use crate::crypto::secure_rng::secure_random_bytes;
use crate::CancelToken;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use std::os::unix::fs::{FileExt, OpenOptionsExt};
use std::path::Path;

/// Default size of the buffer a pass is streamed through
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Fresh CSPRNG output for every chunk
    Random,
    Zero,
}

impl Pattern {
    fn fill(self, buf: &mut [u8]) -> io::Result<()> {
        match self {
            Pattern::Random => secure_random_bytes(buf),
            Pattern::Zero => {
                buf.fill(0x00);
                Ok(())
            }
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Random => f.write_str("random"),
            Pattern::Zero => f.write_str("zero"),
        }
    }
}

/// Receives pass progress. Every method defaults to doing nothing.
pub trait PassObserver {
    fn pass_started(
        &mut self,
        _target: &Path,
        _pass: u32,
        _total: u32,
        _pattern: Pattern,
        _bytes: u64,
    ) {
    }

    /// Bytes of the current pass written so far
    fn bytes_written(&mut self, _written: u64, _total: u64) {}

    /// Called once the pass has been flushed to stable storage
    fn pass_completed(&mut self, _target: &Path, _pass: u32, _total: u32) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PassObserver for NoopObserver {}

/// Something a pass can be written to: a regular file or a block device
pub trait WipeMedium {
    /// Number of addressable bytes
    fn extent(&mut self) -> io::Result<u64>;

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()>;

    /// Force written data to stable storage
    fn sync(&mut self) -> io::Result<()>;
}

pub struct FileMedium {
    file: File,
}

impl FileMedium {
    pub fn new(file: File) -> Self {
        Self { file }
    }
}

impl WipeMedium for FileMedium {
    fn extent(&mut self) -> io::Result<u64> {
        // Block devices report a zero length in their metadata
        let end = self.file.seek(SeekFrom::End(0))?;
        self.file.seek(SeekFrom::Start(0))?;
        Ok(end)
    }

    fn write_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        self.file.write_all_at(buf, offset)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }
}

/// Opens the medium a regular file's passes are written to
pub trait MediumOpener: Send + Sync {
    fn open(&self, path: &Path) -> io::Result<Box<dyn WipeMedium>>;
}

/// Opens the file for writing with `O_NOFOLLOW`, so an entry swapped for a
/// symlink after the type check is refused instead of followed
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFollowOpener;

impl MediumOpener for NoFollowOpener {
    fn open(&self, path: &Path) -> io::Result<Box<dyn WipeMedium>> {
        let file = OpenOptions::new()
            .write(true)
            .custom_flags(libc::O_NOFOLLOW)
            .open(path)?;
        Ok(Box::new(FileMedium::new(file)))
    }
}

/// Shared state for one erase operation
pub struct PassContext<'a> {
    pub cancel: &'a CancelToken,
    pub observer: &'a mut dyn PassObserver,
    pub chunk_size: usize,
}

#[derive(Debug)]
pub enum PassFailure {
    /// Cancel was observed at the boundary before pass `completed + 1`
    Cancelled { completed: u32 },
    /// Pass `pass` failed; `completed` passes finished before it
    Io {
        pass: u32,
        completed: u32,
        source: io::Error,
    },
}

/// Run `plan` over the whole medium, in order. Returns bytes written
/// across all passes.
pub fn run_passes(
    medium: &mut dyn WipeMedium,
    target: &Path,
    plan: &[Pattern],
    ctx: &mut PassContext<'_>,
) -> Result<u64, PassFailure> {
    let total = plan.len() as u32;
    let extent = medium.extent().map_err(|source| PassFailure::Io {
        pass: 1,
        completed: 0,
        source,
    })?;

    let chunk_len = (ctx.chunk_size.max(1) as u64).min(extent.max(1)) as usize;
    let mut buffer = vec![0u8; chunk_len];
    let mut written_total = 0u64;

    for (index, pattern) in plan.iter().copied().enumerate() {
        let completed = index as u32;
        let pass = completed + 1;

        if ctx.cancel.is_cancelled() {
            tracing::warn!(
                target_path = %target.display(),
                pass,
                total,
                "Cancellation requested, stopping at pass boundary"
            );
            return Err(PassFailure::Cancelled { completed });
        }

        tracing::debug!(
            target_path = %target.display(),
            pass,
            total,
            %pattern,
            bytes = extent,
            "Starting pass"
        );
        ctx.observer.pass_started(target, pass, total, pattern, extent);

        let io_failure = |source| PassFailure::Io {
            pass,
            completed,
            source,
        };

        write_pass(medium, pattern, extent, &mut buffer, ctx.observer).map_err(io_failure)?;
        medium.sync().map_err(io_failure)?;

        written_total += extent;
        ctx.observer.pass_completed(target, pass, total);
        tracing::info!(target_path = %target.display(), pass, total, %pattern, "Pass complete");
    }

    Ok(written_total)
}

fn write_pass(
    medium: &mut dyn WipeMedium,
    pattern: Pattern,
    extent: u64,
    buffer: &mut [u8],
    observer: &mut dyn PassObserver,
) -> io::Result<()> {
    // A constant pattern only needs filling once per pass
    if pattern == Pattern::Zero {
        pattern.fill(buffer)?;
    }

    let mut offset = 0u64;
    while offset < extent {
        let len = (buffer.len() as u64).min(extent - offset) as usize;
        let chunk = &mut buffer[..len];
        if pattern == Pattern::Random {
            pattern.fill(chunk)?;
        }
        medium.write_at(offset, chunk)?;
        offset += len as u64;
        observer.bytes_written(offset, extent);
    }
    Ok(())
}
