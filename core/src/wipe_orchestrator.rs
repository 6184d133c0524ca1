// Wipe Orchestrator - erase first, attest only on success
//
// Sequence for one wipe:
//   1. check the content hash and load the signing key (nothing erased yet)
//   2. run the erase engine
//   3. sign the record, append it to the ledger, write the artifacts
// Any failure in 1 or 2 leaves no record behind.

use crate::algorithms::{NoopObserver, PassObserver};
use crate::audit::{AuditRecordBuilder, ArtifactPaths, HistoryLedger, WipeRecord};
use crate::config::Settings;
use crate::crypto::hash::normalize_hash;
use crate::crypto::KeyProvider;
use crate::engine::EraseEngine;
use crate::error::{AuditError, WipeError};
use crate::{EraseMode, EraseOptions, EraseReport, WipeTarget};

/// Everything a successful, attested wipe produced
#[derive(Debug, Clone)]
pub struct WipeOutcome {
    pub record: WipeRecord,
    pub report: EraseReport,
    pub artifacts: ArtifactPaths,
    /// Records in the ledger after this append
    pub ledger_len: usize,
}

pub struct WipeOrchestrator<K: KeyProvider> {
    engine: EraseEngine,
    keys: K,
    builder: AuditRecordBuilder,
    ledger: HistoryLedger,
}

impl<K: KeyProvider> WipeOrchestrator<K> {
    pub fn new(settings: &Settings, engine: EraseEngine, keys: K) -> Self {
        Self::from_parts(
            engine,
            keys,
            AuditRecordBuilder::new(&settings.report_dir),
            HistoryLedger::new(&settings.ledger_path),
        )
    }

    pub fn from_parts(
        engine: EraseEngine,
        keys: K,
        builder: AuditRecordBuilder,
        ledger: HistoryLedger,
    ) -> Self {
        Self {
            engine,
            keys,
            builder,
            ledger,
        }
    }

    pub fn engine(&self) -> &EraseEngine {
        &self.engine
    }

    pub fn ledger(&self) -> &HistoryLedger {
        &self.ledger
    }

    pub fn execute(
        &self,
        target: &WipeTarget,
        content_hash: &str,
        options: &EraseOptions,
    ) -> Result<WipeOutcome, WipeError> {
        self.execute_observed(target, content_hash, options, &mut NoopObserver)
    }

    /// Erase `target`, then sign and record its destruction
    pub fn execute_observed(
        &self,
        target: &WipeTarget,
        content_hash: &str,
        options: &EraseOptions,
        observer: &mut dyn PassObserver,
    ) -> Result<WipeOutcome, WipeError> {
        if options.mode == EraseMode::DryRun {
            return Err(AuditError::NotAttestable(
                "a dry run never writes to the target".to_string(),
            )
            .into());
        }

        let file_hash = normalize_hash(content_hash)
            .ok_or_else(|| AuditError::InvalidContentHash(content_hash.to_string()))?;
        let signing_key = self.keys.signing_key()?;

        let report = self.engine.erase_observed(target, options, observer)?;
        if report.simulated {
            return Err(AuditError::NotAttestable("simulated erase".to_string()).into());
        }

        let record = self
            .builder
            .build(&target.display_name(), &file_hash, &signing_key)?;

        let ledger_len = match self.ledger.append(record.clone()) {
            Ok(len) => len,
            Err(e) => {
                // The target is gone; keep the signed record recoverable from the log
                tracing::error!(
                    error = %e,
                    record = %serde_json::to_string(&record).unwrap_or_default(),
                    "Target erased but the record could not be appended to the ledger"
                );
                return Err(e.into());
            }
        };

        let artifacts = self.builder.write_artifacts(&record)?;

        tracing::info!(
            file_name = %record.file_name,
            file_hash = %record.file_hash,
            deleted_at = %record.deleted_at,
            "Wipe attested"
        );

        Ok(WipeOutcome {
            record,
            report,
            artifacts,
            ledger_len,
        })
    }
}
