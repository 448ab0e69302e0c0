//! Run-level error taxonomy.
//!
//! Per-field extraction misses and per-file failures are not errors: they are
//! absorbed into [`crate::types::BatchResult`] so one bad document never costs
//! the batch. Only failures that sink the whole run (missing output
//! directory, export I/O, database trouble) surface as `Err(CoretaxError)`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoretaxError {
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// Input file exists but could not be read.
    #[error("Could not read file '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The PDF library rejected the file (corrupt, encrypted, not a PDF).
    #[error("Could not parse PDF '{path}': {detail}")]
    PdfParse { path: PathBuf, detail: String },

    /// Output directory is missing or is not a directory.
    #[error("Output directory does not exist: '{path}'")]
    OutputDirMissing { path: PathBuf },

    /// Writing the workbook failed (permissions, disk, open in Excel).
    #[error("Could not write Excel file '{path}': {detail}")]
    ExportFailed { path: PathBuf, detail: String },

    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    /// No company with the requested name exists in the store.
    #[error("Company not found: '{0}'")]
    CompanyNotFound(String),

    /// A store mutation was rejected (duplicate name, bad NPWP, wrong password).
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
