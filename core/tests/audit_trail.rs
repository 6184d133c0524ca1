/// Audit trail integration tests: erase, sign, record, verify
#[path = "common/mod.rs"]
mod common;

use common::keys::{private_key, public_key, write_pem_files};
use std::fs;
use tempfile::TempDir;
use wipe_attest::audit::record::canonical_bytes;
use wipe_attest::crypto::{hash_file, hash_tree, KeyProvider, PemKeyProvider, SignatureService};
use wipe_attest::{
    AuditError, AuditRecordBuilder, EraseEngine, EraseOptions, HistoryLedger, Settings,
    VerificationService, WipeError, WipeOrchestrator, WipeRecord, WipeTarget,
};

fn settings(dir: &std::path::Path, pem_dir: &std::path::Path) -> Settings {
    let pems = write_pem_files(pem_dir);
    Settings {
        ledger_path: dir.join("wipe_history.json"),
        report_dir: dir.join("reports"),
        private_key_path: Some(pems.private_pkcs8),
        public_key_path: Some(pems.public),
        passes: 1,
        ..Settings::default()
    }
}

#[test]
fn test_golden_content_hashes() {
    let dir = TempDir::new().unwrap();
    let abc = dir.path().join("abc.txt");
    fs::write(&abc, b"abc").unwrap();
    assert_eq!(
        hash_file(&abc).unwrap(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );

    let empty = dir.path().join("empty");
    fs::write(&empty, b"").unwrap();
    assert_eq!(
        hash_file(&empty).unwrap(),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn test_tree_hash_ignores_creation_order_but_not_content() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    fs::create_dir_all(a.join("x")).unwrap();
    fs::create_dir_all(b.join("x")).unwrap();

    fs::write(a.join("x/1"), b"one").unwrap();
    fs::write(a.join("2"), b"two").unwrap();
    fs::write(b.join("2"), b"two").unwrap();
    fs::write(b.join("x/1"), b"one").unwrap();
    assert_eq!(hash_tree(&a).unwrap(), hash_tree(&b).unwrap());

    fs::write(b.join("2"), b"TWO").unwrap();
    assert_ne!(hash_tree(&a).unwrap(), hash_tree(&b).unwrap());
}

#[test]
fn test_full_audit_trail_with_pem_keys() {
    let dir = TempDir::new().unwrap();
    let settings = settings(dir.path(), dir.path());

    let victim = dir.path().join("patient-records.csv");
    fs::write(&victim, b"id,name\n1,redacted\n").unwrap();
    let digest = hash_file(&victim).unwrap();

    let orchestrator =
        WipeOrchestrator::new(&settings, EraseEngine::new(), settings.key_provider());
    let outcome = orchestrator
        .execute(&WipeTarget::file(&victim), &digest, &settings.erase_options())
        .unwrap();
    assert!(!victim.exists());

    // Ledger lookup from a fresh service, as a later verifier would do
    let service = VerificationService::new(HistoryLedger::new(&settings.ledger_path));
    let found = service.verify(&format!(" {} ", digest.to_uppercase())).unwrap().unwrap();
    assert_eq!(found.file_name, "patient-records.csv");
    assert_eq!(found, outcome.record);

    // Independent re-check of the artifact with only the public key
    let artifact = VerificationService::load_artifact(&outcome.artifacts.signed_json).unwrap();
    let verifier = PemKeyProvider::new(None, settings.public_key_path.clone());
    VerificationService::verify_artifact(&artifact, &verifier.verifying_key().unwrap()).unwrap();

    let rendered = fs::read_to_string(&outcome.artifacts.rendered).unwrap();
    assert!(rendered.contains("Secure Wipe Report"));
    assert!(rendered.contains(&digest));

    assert!(service.verify(&"0".repeat(64)).unwrap().is_none());
}

#[test]
fn test_tampered_artifact_on_disk_is_detected() {
    let dir = TempDir::new().unwrap();
    let builder = AuditRecordBuilder::new(dir.path().join("reports"));
    let record = builder
        .build("ledger-2023.xlsx", &"4".repeat(64), private_key())
        .unwrap();
    let paths = builder.write_artifacts(&record).unwrap();

    let original = fs::read_to_string(&paths.signed_json).unwrap();
    let forged = original.replace(&record.deleted_at, "2019-01-01T00:00:00.000000Z");
    assert_ne!(original, forged);
    fs::write(&paths.signed_json, forged).unwrap();

    let loaded = VerificationService::load_artifact(&paths.signed_json).unwrap();
    assert!(matches!(
        VerificationService::verify_artifact(&loaded, &public_key()),
        Err(AuditError::SignatureInvalid)
    ));
}

#[test]
fn test_signature_covers_exact_canonical_bytes() {
    let record = AuditRecordBuilder::new("unused")
        .build("a.txt", &"f".repeat(64), private_key())
        .unwrap();
    let bytes = canonical_bytes(&record.file_name, &record.file_hash, &record.deleted_at);

    assert!(SignatureService::verify_hex(&public_key(), &record.signature, &bytes));

    // Compact JSON of the same fields is a different byte string
    let compact = serde_json::to_vec(&serde_json::json!({
        "file_name": record.file_name,
        "file_hash": record.file_hash,
        "deleted_at": record.deleted_at,
    }))
    .unwrap();
    assert!(!SignatureService::verify_hex(&public_key(), &record.signature, &compact));
}

#[test]
fn test_pkcs1_private_key_is_accepted() {
    let dir = TempDir::new().unwrap();
    let pems = write_pem_files(dir.path());
    let provider = PemKeyProvider::new(Some(pems.private_pkcs1), None);

    let key = provider.signing_key().unwrap();
    let sig = SignatureService::sign(&key, b"payload").unwrap();
    assert!(SignatureService::verify(
        &provider.verifying_key().unwrap(),
        &sig,
        b"payload"
    ));
}

#[test]
fn test_unreadable_key_stops_wipe_before_erasure() {
    let dir = TempDir::new().unwrap();
    let mut settings = settings(dir.path(), dir.path());
    settings.private_key_path = Some(dir.path().join("missing.pem"));

    let victim = dir.path().join("keep.txt");
    fs::write(&victim, b"keep").unwrap();

    let orchestrator =
        WipeOrchestrator::new(&settings, EraseEngine::new(), settings.key_provider());
    let err = orchestrator
        .execute(&WipeTarget::file(&victim), &"1".repeat(64), &EraseOptions::default())
        .unwrap_err();

    assert!(matches!(
        err,
        WipeError::Audit(AuditError::SigningKeyUnavailable(_))
    ));
    assert!(victim.exists());
    assert!(HistoryLedger::new(&settings.ledger_path)
        .load_all()
        .unwrap()
        .is_empty());
}

#[test]
fn test_corrupt_ledger_is_reported_not_replaced() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("wipe_history.json");
    fs::write(&path, b"{ this is not a ledger").unwrap();

    let ledger = HistoryLedger::new(&path);
    let record = WipeRecord {
        file_name: "a".into(),
        file_hash: "a".repeat(64),
        deleted_at: "2024-01-01T00:00:00.000000Z".into(),
        signature: "00".into(),
    };
    assert!(matches!(
        ledger.append(record),
        Err(AuditError::LedgerCorrupt { .. })
    ));
    assert_eq!(fs::read(&path).unwrap(), b"{ this is not a ledger");
    assert!(matches!(
        VerificationService::new(ledger).verify(&"a".repeat(64)),
        Err(AuditError::LedgerCorrupt { .. })
    ));
}
