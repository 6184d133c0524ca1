/// Disk images for device wipe tests
///
/// A regular file filled with a recognisable pattern stands in for a block
/// device, so the clear-method passes can be checked without hardware.
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Byte the image is filled with before wiping
pub const FILL_BYTE: u8 = 0xAB;

pub struct DiskImage {
    pub temp_file: NamedTempFile,
    size_bytes: u64,
}

impl DiskImage {
    /// Create an image of `size_kb` KiB filled with `FILL_BYTE`
    pub fn new(size_kb: u64) -> std::io::Result<Self> {
        let mut temp_file = NamedTempFile::new()?;
        let chunk = vec![FILL_BYTE; 1024];
        for _ in 0..size_kb {
            temp_file.write_all(&chunk)?;
        }
        temp_file.as_file().sync_all()?;

        Ok(Self {
            temp_file,
            size_bytes: size_kb * 1024,
        })
    }

    pub fn path(&self) -> &Path {
        self.temp_file.path()
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}
