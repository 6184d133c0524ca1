/// Common test helper functions
use std::fs;
use std::io::Read;
use std::path::Path;

/// Count bytes of `path` equal to `byte`
pub fn count_byte(path: &Path, byte: u8) -> std::io::Result<u64> {
    let mut file = fs::File::open(path)?;
    let mut buffer = vec![0u8; 4096];
    let mut count = 0u64;

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        count += buffer[..bytes_read].iter().filter(|b| **b == byte).count() as u64;
    }

    Ok(count)
}

/// Shannon entropy of a file in bits per byte
pub fn calculate_file_entropy(path: &Path) -> std::io::Result<f64> {
    let buffer = fs::read(path)?;
    if buffer.is_empty() {
        return Ok(0.0);
    }

    let mut counts = [0u64; 256];
    for &byte in &buffer {
        counts[byte as usize] += 1;
    }

    let length = buffer.len() as f64;
    Ok(counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / length;
            -p * p.log2()
        })
        .sum())
}

/// Build a small directory tree with nested files; returns the file count
pub fn populate_tree(root: &Path) -> std::io::Result<usize> {
    fs::create_dir_all(root.join("projects/alpha/drafts"))?;
    fs::create_dir_all(root.join("scans"))?;
    fs::write(root.join("index.md"), b"# index\n")?;
    fs::write(root.join("projects/alpha/plan.txt"), b"phase one")?;
    fs::write(root.join("projects/alpha/drafts/v1.txt"), vec![b'x'; 20_000])?;
    fs::write(root.join("scans/id.png"), vec![0x89; 4096])?;
    Ok(4)
}
