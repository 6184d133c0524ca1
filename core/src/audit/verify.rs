use super::ledger::HistoryLedger;
use super::record::WipeRecord;
use crate::crypto::signature::SignatureService;
use crate::error::{AuditError, AuditResult};
use chrono::FixedOffset;
use rsa::RsaPublicKey;
use std::fs;
use std::path::Path;

/// Layout used when presenting `deleted_at` in a caller's timezone
pub const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

/// Answers "was this content wiped, and when".
///
/// Ledger lookups are trusted as-is; a presented signed artifact can be
/// re-checked independently with [`VerificationService::verify_artifact`].
#[derive(Debug, Clone)]
pub struct VerificationService {
    ledger: HistoryLedger,
}

impl VerificationService {
    pub fn new(ledger: HistoryLedger) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    /// First record whose hash matches `hash_query`, ignoring case and
    /// surrounding whitespace
    pub fn verify(&self, hash_query: &str) -> AuditResult<Option<WipeRecord>> {
        let records = self.ledger.load_all()?;
        let found = Self::find_in(&records, hash_query).cloned();

        tracing::info!(
            query = %hash_query.trim(),
            matched = found.is_some(),
            "Ledger lookup"
        );
        Ok(found)
    }

    pub fn find_in<'a>(records: &'a [WipeRecord], hash_query: &str) -> Option<&'a WipeRecord> {
        let query = hash_query.trim();
        if query.is_empty() {
            return None;
        }
        records
            .iter()
            .find(|r| r.file_hash.trim().eq_ignore_ascii_case(query))
    }

    /// `deleted_at` converted to `offset`, or the stored string unchanged
    /// when it cannot be parsed
    pub fn display_deleted_at(record: &WipeRecord, offset: &FixedOffset) -> String {
        match record.deleted_at_utc() {
            Some(at) => at.with_timezone(offset).format(DISPLAY_FORMAT).to_string(),
            None => record.deleted_at.clone(),
        }
    }

    /// Re-check a signed artifact against the public key
    pub fn verify_artifact(record: &WipeRecord, public_key: &RsaPublicKey) -> AuditResult<()> {
        if SignatureService::verify_hex(public_key, &record.signature, &record.canonical_bytes()) {
            Ok(())
        } else {
            tracing::warn!(file_name = %record.file_name, "Artifact signature did not verify");
            Err(AuditError::SignatureInvalid)
        }
    }

    pub fn load_artifact(path: &Path) -> AuditResult<WipeRecord> {
        let bytes = fs::read(path)?;
        let record: WipeRecord = serde_json::from_slice(&bytes)?;
        Ok(record)
    }
}

/// Parse a display offset: `Z`, `UTC`, `+HH:MM`, `-HH:MM` or `+HHMM`
pub fn parse_display_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }

    let (sign, rest) = match raw.chars().next()? {
        '+' => (1, &raw[1..]),
        '-' => (-1, &raw[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
