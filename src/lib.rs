//! Coretax Bukti Potong extractor.
//!
//! Turns the fixed-layout Indonesian tax-withholding PDFs ("Bukti Potong")
//! into structured records and exports them to Excel, scoped to one company
//! by NPWP matching. The pipeline is pure and synchronous:
//!
//! text source → [`normalize`] → [`extract`] → [`classify`] → [`batch`]
//! accumulation → [`excel`] export.
//!
//! Front-ends (CLI here, anything else elsewhere) stay thin: they resolve a
//! [`CompanyIdentity`] from the [`db::CompanyStore`], hand the orchestrator a
//! file list, and render the returned [`BatchResult`].

pub mod batch;
pub mod classify;
pub mod db;
pub mod error;
pub mod excel;
pub mod extract;
pub mod normalize;
pub mod pdf;
pub mod types;

pub use batch::{field_success_counts, log_summary, run_batch, summarize, BatchProgress, NoopProgress};
pub use classify::{classify, clean_npwp, missing_critical_fields, Decision, CRITICAL_FIELDS};
pub use db::CompanyStore;
pub use error::CoretaxError;
pub use excel::export_records_to_excel;
pub use extract::extract_fields;
pub use normalize::clean_pdf_text;
pub use pdf::{PdfTextExtractor, TextSource};
pub use types::{
    BatchResult, BatchSummary, BuktiPotongRecord, CompanyIdentity, ExtractionStatus, FailedFile,
    SkippedFile, FIELD_KEYS,
};
