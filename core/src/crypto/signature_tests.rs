// Tests for RSA-PSS signing and tamper detection

use crate::crypto::signature::SignatureService;
use crate::crypto::test_keys::{test_private_key, test_public_key};
use proptest::prelude::*;
use rand::rngs::OsRng;
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};

#[test]
fn test_max_salt_len_matches_pss_bound() {
    // emLen = ceil((modBits - 1) / 8); salt = emLen - 32 - 2
    assert_eq!(SignatureService::max_salt_len(2048), 222);
    assert_eq!(SignatureService::max_salt_len(3072), 350);
    assert_eq!(SignatureService::max_salt_len(4096), 478);
    // 2049-bit modulus: emBits = 2048 fits exactly in 256 bytes
    assert_eq!(SignatureService::max_salt_len(2049), 222);
}

#[test]
fn test_sign_then_verify() {
    let data = b"{\n    \"file_name\": \"report.pdf\"\n}";
    let signature = SignatureService::sign(test_private_key(), data).unwrap();

    assert_eq!(signature.len(), test_public_key().size());
    assert!(SignatureService::verify(&test_public_key(), &signature, data));
}

#[test]
fn test_signatures_are_randomized() {
    let data = b"same bytes every time";
    let first = SignatureService::sign(test_private_key(), data).unwrap();
    let second = SignatureService::sign(test_private_key(), data).unwrap();

    assert_ne!(first, second, "PSS salt must make signatures differ");
    assert!(SignatureService::verify(&test_public_key(), &first, data));
    assert!(SignatureService::verify(&test_public_key(), &second, data));
}

#[test]
fn test_verify_rejects_malformed_signatures() {
    let public_key = test_public_key();
    let data = b"payload";

    assert!(!SignatureService::verify(&public_key, &[], data));
    assert!(!SignatureService::verify(&public_key, &[0u8; 16], data));
    assert!(!SignatureService::verify(&public_key, &vec![0u8; public_key.size()], data));
    assert!(!SignatureService::verify(&public_key, &vec![0xFFu8; public_key.size()], data));
    assert!(!SignatureService::verify(
        &public_key,
        &vec![0u8; public_key.size() + 1],
        data
    ));
}

#[test]
fn test_verify_hex_handles_bad_encoding() {
    let data = b"payload";
    let signature_hex = SignatureService::sign_hex(test_private_key(), data).unwrap();

    assert!(SignatureService::verify_hex(&test_public_key(), &signature_hex, data));
    assert!(SignatureService::verify_hex(
        &test_public_key(),
        &signature_hex.to_uppercase(),
        data
    ));
    assert!(!SignatureService::verify_hex(&test_public_key(), "zz-not-hex", data));
    assert!(!SignatureService::verify_hex(&test_public_key(), &signature_hex[1..], data));
}

#[test]
fn test_verify_with_other_key_fails() {
    let other = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
    let data = b"payload";
    let signature = SignatureService::sign(test_private_key(), data).unwrap();

    assert!(!SignatureService::verify(&RsaPublicKey::from(&other), &signature, data));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_single_bit_flip_in_data_is_detected(
        data in proptest::collection::vec(any::<u8>(), 1..512),
        bit in any::<proptest::sample::Index>(),
    ) {
        let signature = SignatureService::sign(test_private_key(), &data).unwrap();
        prop_assert!(SignatureService::verify(&test_public_key(), &signature, &data));

        let mut tampered = data.clone();
        let position = bit.index(tampered.len() * 8);
        tampered[position / 8] ^= 1 << (position % 8);
        prop_assert!(!SignatureService::verify(&test_public_key(), &signature, &tampered));
    }

    #[test]
    fn prop_single_bit_flip_in_signature_is_detected(
        data in proptest::collection::vec(any::<u8>(), 0..256),
        bit in any::<proptest::sample::Index>(),
    ) {
        let mut signature = SignatureService::sign(test_private_key(), &data).unwrap();
        let position = bit.index(signature.len() * 8);
        signature[position / 8] ^= 1 << (position % 8);
        prop_assert!(!SignatureService::verify(&test_public_key(), &signature, &data));
    }
}
