//! Batch orchestration: drive extraction over a file list for one company.
//!
//! Files are processed strictly sequentially in caller order. Every per-file
//! problem (unreadable file, empty text, NPWP mismatch, missing critical
//! fields) is absorbed into the result lists and the loop moves on; nothing
//! a single file does can abort the batch.

use crate::classify::{classify, missing_critical_fields, Decision};
use crate::extract::extract_fields;
use crate::pdf::TextSource;
use crate::types::{
    field, BatchResult, BatchSummary, BuktiPotongRecord, CompanyIdentity, ExtractionStatus,
    FailedFile, SkippedFile,
};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Fields reported in the end-of-run extraction statistics.
pub const KEY_FIELDS: &[&str] = &[
    field::NOMOR_BUKTI_POTONG,
    field::DPP,
    field::PAJAK_PENGHASILAN,
    field::NPWP_NIK_YANG_DIPUNGUT,
    field::NAMA_YANG_DIPUNGUT,
];

/// Receives progress events as the batch advances. All methods default to
/// no-ops so callers only override what they render. The percentage is
/// monotonically increasing and emitted after each file.
pub trait BatchProgress {
    fn on_batch_start(&mut self, total_files: usize) {
        let _ = total_files;
    }

    fn on_file_done(&mut self, processed: usize, total_files: usize, percent: f64) {
        let _ = (processed, total_files, percent);
    }
}

/// Default observer for callers that don't render progress.
pub struct NoopProgress;

impl BatchProgress for NoopProgress {}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string()
}

/// Run the full pipeline over `files` for `company`.
///
/// Returns the accumulated records, per-file failures, and NPWP-mismatch
/// skips; call [`summarize`] on the result for the end-of-run counts.
pub fn run_batch<S: TextSource + ?Sized>(
    files: &[PathBuf],
    company: &CompanyIdentity,
    source: &S,
    progress: &mut dyn BatchProgress,
) -> BatchResult {
    let total = files.len();
    let mut result = BatchResult::default();

    info!(total, company = %company.name, npwp = %company.npwp, "batch started");
    info!("only PDFs matching NPWP {} will be processed", company.npwp);
    progress.on_batch_start(total);

    for (i, path) in files.iter().enumerate() {
        let filename = file_name_of(path);
        info!("processing ({}/{}): {}", i + 1, total, filename);

        match process_file(path, &filename, company, source) {
            FileOutcome::Record(record) => {
                info!(
                    "processed: {} - Bupot={}, DPP={}",
                    filename,
                    record.get(field::NOMOR_BUKTI_POTONG),
                    record.get(field::DPP)
                );
                if record.status == ExtractionStatus::Incomplete {
                    let missing = missing_critical_fields(&record).join(", ");
                    warn!("{}: missing critical fields: {}", filename, missing);
                    result.failed.push(FailedFile {
                        filename: filename.clone(),
                        error: format!("Missing critical fields: {}", missing),
                    });
                }
                result.records.push(record);
            }
            FileOutcome::Skipped(skipped) => {
                warn!(
                    "skipping {}: belongs to {} (NPWP: {})",
                    filename, skipped.company_name, skipped.company_npwp
                );
                result.skipped.push(skipped);
            }
            FileOutcome::Failed(message) => {
                error!("failed to process {}: {}", filename, message);
                result.failed.push(FailedFile {
                    filename,
                    error: message,
                });
            }
        }

        let processed = i + 1;
        let percent = processed as f64 / total as f64 * 100.0;
        progress.on_file_done(processed, total, percent);
    }

    result
}

enum FileOutcome {
    Record(BuktiPotongRecord),
    Skipped(SkippedFile),
    Failed(String),
}

fn process_file<S: TextSource + ?Sized>(
    path: &Path,
    filename: &str,
    company: &CompanyIdentity,
    source: &S,
) -> FileOutcome {
    let text = match source.extract_text(path) {
        Ok(text) => text,
        Err(e) => return FileOutcome::Failed(e.to_string()),
    };
    if text.is_empty() {
        return FileOutcome::Failed("No text extracted from PDF".to_string());
    }

    let mut record = extract_fields(&text, filename);

    match classify(&record, company) {
        Decision::Skip { reason } => {
            return FileOutcome::Skipped(SkippedFile {
                filename: filename.to_string(),
                company_name: record.get(field::NAMA_YANG_DIPUNGUT).to_string(),
                company_npwp: record.get(field::NPWP_NIK_YANG_DIPUNGUT).to_string(),
                reason,
            });
        }
        Decision::AcceptWithWarning => {
            warn!(
                "{}: NPWP not found in PDF or company data, processing anyway",
                filename
            );
        }
        Decision::Accept => {}
    }

    record.status = if missing_critical_fields(&record).is_empty() {
        ExtractionStatus::Success
    } else {
        ExtractionStatus::Incomplete
    };
    FileOutcome::Record(record)
}

/// End-of-run counts for a batch over `total` input files.
pub fn summarize(result: &BatchResult, total: usize) -> BatchSummary {
    let success = result
        .records
        .iter()
        .filter(|r| r.status == ExtractionStatus::Success)
        .count();
    let incomplete = result.records.len() - success;
    BatchSummary {
        total,
        success,
        incomplete,
        // Incomplete records also sit in the failed diagnostics list; count
        // only the entries without a corresponding record as hard failures.
        failed: result.failed.len() - incomplete,
        skipped: result.skipped.len(),
    }
}

/// Per-field extraction success counts for [`KEY_FIELDS`], over all records.
pub fn field_success_counts(result: &BatchResult) -> Vec<(&'static str, usize)> {
    KEY_FIELDS
        .iter()
        .map(|key| {
            let hits = result.records.iter().filter(|r| r.has(key)).count();
            (*key, hits)
        })
        .collect()
}

/// Log the end-of-run summary the way operators expect to read it.
pub fn log_summary(summary: &BatchSummary, result: &BatchResult) {
    info!("extraction complete");
    info!("total files: {}", summary.total);
    info!("successfully extracted: {}", summary.success);
    info!("incomplete extraction: {}", summary.incomplete);
    info!("failed: {}", summary.failed);
    info!("skipped (NPWP mismatch): {}", summary.skipped);
    if !result.records.is_empty() {
        for (key, hits) in field_success_counts(result) {
            let rate = hits as f64 / result.records.len() as f64 * 100.0;
            info!(
                "{}: {}/{} extracted ({:.1}%)",
                key,
                hits,
                result.records.len(),
                rate
            );
        }
    }
    for failed in &result.failed {
        warn!("  - {}: {}", failed.filename, failed.error);
    }
    for skipped in &result.skipped {
        info!(
            "  - {}: belongs to {} (NPWP: {})",
            skipped.filename, skipped.company_name, skipped.company_npwp
        );
    }
}
