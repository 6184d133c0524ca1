// Per-wipe artifacts written next to the ledger entry: the signed JSON
// artifact (machine-verifiable) and a rendered, human-readable report
// (informational only).

use super::record::{to_indented_json, WipeRecord};
use super::write_atomic;
use crate::error::AuditResult;
use std::path::{Path, PathBuf};

pub const REPORT_TITLE: &str = "Secure Wipe Report";

/// Turns a record into a human-readable document
pub trait ReportRenderer: Send + Sync {
    /// File extension of the rendered document, without the dot
    fn extension(&self) -> &str;

    fn render(&self, record: &WipeRecord) -> Vec<u8>;
}

/// Plain-text rendering of the four record fields under a fixed title
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReportRenderer;

impl ReportRenderer for TextReportRenderer {
    fn extension(&self) -> &str {
        "txt"
    }

    fn render(&self, record: &WipeRecord) -> Vec<u8> {
        let lines = [
            REPORT_TITLE.to_string(),
            "=".repeat(REPORT_TITLE.len()),
            String::new(),
            format!("File Name: {}", record.file_name),
            format!("File SHA256 Hash: {}", record.file_hash),
            format!("Deleted At (UTC): {}", record.deleted_at),
            String::new(),
            "SHA256 Hash Signature (hex):".to_string(),
            record.signature.clone(),
        ];
        let mut text = lines.join("\n");
        text.push('\n');
        text.into_bytes()
    }
}

/// Where the artifacts for one wipe were written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub signed_json: PathBuf,
    pub rendered: PathBuf,
}

/// File stem for a record's artifacts. Path separators and control
/// characters are replaced so the artifacts stay inside the report directory.
pub fn artifact_stem(file_name: &str) -> String {
    let cleaned: String = file_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    let base = match cleaned.as_str() {
        "" | "." | ".." => "unnamed",
        other => other,
    };
    format!("{}_wipe_report", base)
}

/// Writes the signed JSON artifact and the rendered report for `record`
pub fn write_artifacts(
    report_dir: &Path,
    record: &WipeRecord,
    renderer: &dyn ReportRenderer,
) -> AuditResult<ArtifactPaths> {
    let stem = artifact_stem(&record.file_name);
    let signed_json = report_dir.join(format!("{}.json", stem));
    let rendered = report_dir.join(format!("{}.{}", stem, renderer.extension()));

    write_atomic(&signed_json, &to_indented_json(record)?)?;
    write_atomic(&rendered, &renderer.render(record))?;

    tracing::info!(
        json = %signed_json.display(),
        report = %rendered.display(),
        "Wrote wipe artifacts"
    );

    Ok(ArtifactPaths {
        signed_json,
        rendered,
    })
}
