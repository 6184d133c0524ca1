// Content hashes: SHA-256 of a target's bytes, computed before it is destroyed.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use walkdir::WalkDir;

/// Length of a hex-encoded SHA-256 digest
pub const HASH_HEX_LEN: usize = 64;

const READ_CHUNK: usize = 64 * 1024;

/// SHA-256 of everything `reader` yields, as lowercase hex
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_CHUNK];

    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// SHA-256 of a file or block device, read end to end
pub fn hash_file(path: &Path) -> io::Result<String> {
    hash_reader(File::open(path)?)
}

/// Digest of a directory tree.
///
/// Regular files are visited in file-name order. For each one the relative
/// path, a NUL byte, its hex content hash and a newline are fed into an outer
/// SHA-256, so the result changes if any file is renamed, added, removed or
/// modified. Symlinks are not followed.
pub fn hash_tree(root: &Path) -> io::Result<String> {
    let mut outer = Sha256::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .unwrap_or_else(|_| entry.path());
        outer.update(relative.to_string_lossy().as_bytes());
        outer.update([0u8]);
        outer.update(hash_file(entry.path())?.as_bytes());
        outer.update(b"\n");
    }

    Ok(hex::encode(outer.finalize()))
}

/// True for exactly 64 hex digits, either case
pub fn is_valid_hash(candidate: &str) -> bool {
    candidate.len() == HASH_HEX_LEN && candidate.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Trim and lowercase a hash, or `None` if it is not a SHA-256 hex digest
pub fn normalize_hash(candidate: &str) -> Option<String> {
    let trimmed = candidate.trim();
    is_valid_hash(trimmed).then(|| trimmed.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // Reference digests from `sha256sum`
    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn test_hash_reader_known_vectors() {
        assert_eq!(hash_reader(&b""[..]).unwrap(), EMPTY_SHA256);
        assert_eq!(hash_reader(&b"abc"[..]).unwrap(), ABC_SHA256);
    }

    #[test]
    fn test_hash_reader_spans_chunks() {
        let data = vec![0x5Au8; READ_CHUNK * 3 + 17];
        let expected = hex::encode(Sha256::digest(&data));
        assert_eq!(hash_reader(&data[..]).unwrap(), expected);
    }

    #[test]
    fn test_hash_tree_changes_with_content_and_names() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), b"alpha").unwrap();
        fs::write(dir.path().join("sub/b.txt"), b"beta").unwrap();

        let first = hash_tree(dir.path()).unwrap();
        assert_eq!(first, hash_tree(dir.path()).unwrap(), "tree hash must be stable");

        fs::write(dir.path().join("sub/b.txt"), b"BETA").unwrap();
        let modified = hash_tree(dir.path()).unwrap();
        assert_ne!(first, modified);

        fs::rename(dir.path().join("a.txt"), dir.path().join("c.txt")).unwrap();
        assert_ne!(modified, hash_tree(dir.path()).unwrap());
    }

    #[test]
    fn test_hash_validation() {
        assert!(is_valid_hash(ABC_SHA256));
        assert!(is_valid_hash(&ABC_SHA256.to_uppercase()));
        assert!(!is_valid_hash(&ABC_SHA256[..63]));
        assert!(!is_valid_hash(&format!("{}0", ABC_SHA256)));
        assert!(!is_valid_hash(&ABC_SHA256.replace('b', "g")));

        assert_eq!(
            normalize_hash(&format!("  {}\n", ABC_SHA256.to_uppercase())).as_deref(),
            Some(ABC_SHA256)
        );
        assert_eq!(normalize_hash("not-a-hash"), None);
    }
}
