use super::record::{canonical_bytes, format_timestamp, WipeRecord};
use super::report::{write_artifacts, ArtifactPaths, ReportRenderer, TextReportRenderer};
use crate::crypto::hash::normalize_hash;
use crate::crypto::signature::SignatureService;
use crate::error::{AuditError, AuditResult};
use chrono::{DateTime, Utc};
use rsa::RsaPrivateKey;
use std::path::{Path, PathBuf};

/// Builds signed wipe records and their artifacts.
///
/// Only call this after the erase engine has reported success.
pub struct AuditRecordBuilder {
    report_dir: PathBuf,
    renderer: Box<dyn ReportRenderer>,
}

impl AuditRecordBuilder {
    pub fn new(report_dir: impl Into<PathBuf>) -> Self {
        Self {
            report_dir: report_dir.into(),
            renderer: Box::new(TextReportRenderer),
        }
    }

    /// Swap the human-readable renderer (e.g. for a PDF collaborator)
    pub fn with_renderer(mut self, renderer: Box<dyn ReportRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn report_dir(&self) -> &Path {
        &self.report_dir
    }

    pub fn build(
        &self,
        target_name: &str,
        content_hash: &str,
        private_key: &RsaPrivateKey,
    ) -> AuditResult<WipeRecord> {
        self.build_at(target_name, content_hash, private_key, Utc::now())
    }

    /// `build` with an explicit deletion time
    pub fn build_at(
        &self,
        target_name: &str,
        content_hash: &str,
        private_key: &RsaPrivateKey,
        deleted_at: DateTime<Utc>,
    ) -> AuditResult<WipeRecord> {
        let file_hash = normalize_hash(content_hash)
            .ok_or_else(|| AuditError::InvalidContentHash(content_hash.to_string()))?;
        let deleted_at = format_timestamp(deleted_at);

        // Sign these exact bytes; never a later re-serialization
        let signed_bytes = canonical_bytes(target_name, &file_hash, &deleted_at);
        let signature = SignatureService::sign_hex(private_key, &signed_bytes)?;

        tracing::debug!(
            file_name = %target_name,
            file_hash = %file_hash,
            deleted_at = %deleted_at,
            "Signed wipe record"
        );

        Ok(WipeRecord {
            file_name: target_name.to_string(),
            file_hash,
            deleted_at,
            signature,
        })
    }

    /// Write the signed JSON artifact and the rendered report
    pub fn write_artifacts(&self, record: &WipeRecord) -> AuditResult<ArtifactPaths> {
        write_artifacts(&self.report_dir, record, self.renderer.as_ref())
    }
}
