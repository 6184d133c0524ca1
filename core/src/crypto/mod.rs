pub mod hash;
pub mod keys;
pub mod secure_rng;
pub mod signature;

#[cfg(test)]
mod signature_tests;

// Re-export
pub use hash::{hash_file, hash_reader, hash_tree, is_valid_hash, normalize_hash};
pub use keys::{KeyProvider, PemKeyProvider, StaticKeyProvider};
pub use secure_rng::secure_random_bytes;
pub use signature::SignatureService;
