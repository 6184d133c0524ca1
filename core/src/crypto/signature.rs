use crate::error::{AuditError, AuditResult};
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{Pss, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

/// Output size of the message digest (SHA-256)
const DIGEST_LEN: usize = 32;

/// RSA-PSS signatures over audit records.
///
/// SHA-256 message digest, MGF1 with SHA-256, and the largest salt the key
/// permits. The salt makes every signature unique even over identical data.
pub struct SignatureService;

impl SignatureService {
    /// Largest PSS salt for a modulus of `modulus_bits` bits with SHA-256:
    /// `ceil((modBits - 1) / 8) - hLen - 2`
    pub fn max_salt_len(modulus_bits: usize) -> usize {
        let em_len = modulus_bits.saturating_sub(1).div_ceil(8);
        em_len.saturating_sub(DIGEST_LEN + 2)
    }

    fn padding_for(modulus_bits: usize) -> Pss {
        Pss::new_with_salt::<Sha256>(Self::max_salt_len(modulus_bits))
    }

    pub fn sign(private_key: &RsaPrivateKey, data: &[u8]) -> AuditResult<Vec<u8>> {
        let digest = Sha256::digest(data);
        let padding = Self::padding_for(private_key.n().bits());

        private_key
            .sign_with_rng(&mut OsRng, padding, &digest)
            .map_err(|e| AuditError::Signing(e.to_string()))
    }

    /// Hex form of `sign`, as stored in audit records
    pub fn sign_hex(private_key: &RsaPrivateKey, data: &[u8]) -> AuditResult<String> {
        Self::sign(private_key, data).map(hex::encode)
    }

    /// True only if `signature` is a valid signature over `data`.
    ///
    /// Never errors: wrong length, garbage, or a mismatch all yield `false`.
    pub fn verify(public_key: &RsaPublicKey, signature: &[u8], data: &[u8]) -> bool {
        if signature.len() != public_key.size() {
            return false;
        }

        let digest = Sha256::digest(data);
        let padding = Self::padding_for(public_key.n().bits());
        public_key.verify(padding, &digest, signature).is_ok()
    }

    /// `verify` for a hex-encoded signature; undecodable hex is `false`
    pub fn verify_hex(public_key: &RsaPublicKey, signature_hex: &str, data: &[u8]) -> bool {
        match hex::decode(signature_hex.trim()) {
            Ok(signature) => Self::verify(public_key, &signature, data),
            Err(_) => false,
        }
    }
}
