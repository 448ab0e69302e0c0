//! PDF text acquisition behind an injectable seam.
//!
//! The pipeline only needs "all page text of one file as a string", so the
//! provider is a trait: the default implementation reads the file and runs
//! `pdf-extract`, and tests or an embedding front-end can substitute
//! anything else.

use crate::error::CoretaxError;
use std::fs;
use std::path::Path;
use tracing::info;

/// Source of raw page text for one PDF file.
pub trait TextSource {
    fn extract_text(&self, path: &Path) -> Result<String, CoretaxError>;
}

/// Default text source backed by the `pdf-extract` crate. Scanned or
/// image-only PDFs produce empty text here, which the orchestrator records
/// as a per-file failure.
#[derive(Debug, Default)]
pub struct PdfTextExtractor;

impl TextSource for PdfTextExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, CoretaxError> {
        let bytes = fs::read(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CoretaxError::FileNotFound {
                    path: path.to_path_buf(),
                }
            } else {
                CoretaxError::ReadFailed {
                    path: path.to_path_buf(),
                    source: e,
                }
            }
        })?;

        let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| {
            CoretaxError::PdfParse {
                path: path.to_path_buf(),
                detail: e.to_string(),
            }
        })?;

        let text = text.trim().to_string();
        info!(
            file = %path.display(),
            chars = text.len(),
            "extracted text from PDF"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_maps_to_file_not_found() {
        let source = PdfTextExtractor;
        let err = source
            .extract_text(Path::new("/nonexistent/bukti.pdf"))
            .unwrap_err();
        assert!(matches!(err, CoretaxError::FileNotFound { .. }));
    }

    #[test]
    fn non_pdf_bytes_map_to_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_a_pdf.pdf");
        std::fs::write(&path, b"plain text, no pdf header").unwrap();
        let err = PdfTextExtractor.extract_text(&path).unwrap_err();
        assert!(matches!(err, CoretaxError::PdfParse { .. }));
    }
}
