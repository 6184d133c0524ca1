// Cryptographically secure random data for overwrite passes and erase passwords.
//
// All randomness comes from the operating system CSPRNG through ring's
// `SystemRandom`. There is no userspace pool to seed, reseed, or exhaust.

use ring::rand::{SecureRandom, SystemRandom};
use std::io;
use std::sync::OnceLock;

static SYSTEM_RNG: OnceLock<SystemRandom> = OnceLock::new();

/// Get the process-wide system RNG
pub fn get_secure_rng() -> &'static SystemRandom {
    SYSTEM_RNG.get_or_init(SystemRandom::new)
}

/// Fill `dest` with cryptographically secure random bytes
pub fn secure_random_bytes(dest: &mut [u8]) -> io::Result<()> {
    get_secure_rng()
        .fill(dest)
        .map_err(|_| io::Error::other("system random source failed"))
}

/// Random lowercase hex token built from `byte_len` random bytes
pub fn random_token(byte_len: usize) -> io::Result<String> {
    let mut bytes = vec![0u8; byte_len];
    secure_random_bytes(&mut bytes)?;
    Ok(hex::encode(bytes))
}

/// Shannon entropy of `data` in bits per byte (0.0 ..= 8.0)
pub fn calculate_entropy(data: &[u8]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }

    let mut counts = [0u64; 256];
    for &byte in data {
        counts[byte as usize] += 1;
    }

    let length = data.len() as f64;
    counts
        .iter()
        .filter(|&&count| count > 0)
        .map(|&count| {
            let probability = count as f64 / length;
            -probability * probability.log2()
        })
        .sum()
}
