/// RSA key fixtures written as PEM files
use rsa::pkcs1::EncodeRsaPrivateKey;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();

/// Shared 2048-bit key; generating one per test is too slow
pub fn private_key() -> &'static RsaPrivateKey {
    KEY.get_or_init(|| {
        RsaPrivateKey::new(&mut rand::rngs::OsRng, 2048).expect("RSA key generation")
    })
}

pub fn public_key() -> RsaPublicKey {
    RsaPublicKey::from(private_key())
}

pub struct PemFiles {
    pub private_pkcs8: PathBuf,
    pub private_pkcs1: PathBuf,
    pub public: PathBuf,
}

/// Write the shared key pair to `dir` in the formats the loader accepts
pub fn write_pem_files(dir: &Path) -> PemFiles {
    let key = private_key();
    let files = PemFiles {
        private_pkcs8: dir.join("signing.pk8.pem"),
        private_pkcs1: dir.join("signing.rsa.pem"),
        public: dir.join("verify.pub.pem"),
    };

    fs::write(
        &files.private_pkcs8,
        key.to_pkcs8_pem(LineEnding::LF).unwrap().as_bytes(),
    )
    .unwrap();
    fs::write(
        &files.private_pkcs1,
        key.to_pkcs1_pem(LineEnding::LF).unwrap().as_bytes(),
    )
    .unwrap();
    fs::write(
        &files.public,
        public_key().to_public_key_pem(LineEnding::LF).unwrap(),
    )
    .unwrap();
    files
}
