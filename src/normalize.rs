//! Text cleanup for raw PDF-extracted text.
//!
//! The source documents are machine-generated, but the PDF layout splits
//! header phrases across lines and pads separators inside numbers with
//! spaces. Cleanup happens in a fixed order: whitespace collapse first, then
//! the label repairs, then the digit-separator rejoin.

use once_cell::sync::Lazy;
use regex::Regex;

/// Ordered label repairs. Each pattern re-joins a phrase the PDF layout
/// breaks across lines; order matters and matching is case-insensitive.
static LABEL_REPAIRS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)KEMENTERIAN\s*KEUANGAN", "KEMENTERIAN KEUANGAN"),
        (r"(?i)BUKTI\s*PEMOTONGAN\s*DAN", "BUKTI PEMOTONGAN DAN"),
        (r"(?i)PEMUNGUTAN\s*PPH", "PEMUNGUTAN PPH"),
        (r"(?i)MASA\s*PAJAK", "MASA PAJAK"),
        (r"(?i)TIDAK\s*FINAL", "TIDAK FINAL"),
        (r"(?i)RSM\s*INDONESIA", "RSM INDONESIA"),
        (r"(?i)BUKIT\s*ASAM", "BUKIT ASAM"),
    ]
    .into_iter()
    .map(|(pat, rep)| (Regex::new(pat).expect("label repair regex"), rep))
    .collect()
});

/// A `.` or `,` separator stranded between two digits by stray spaces.
static SPLIT_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d)\s+([.,])\s*(\d)").expect("split number regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Clean and normalize text extracted from a PDF. Pure and idempotent;
/// empty input yields empty output.
pub fn clean_pdf_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let mut cleaned = WHITESPACE.replace_all(text.trim(), " ").into_owned();

    for (pattern, replacement) in LABEL_REPAIRS.iter() {
        cleaned = pattern.replace_all(&cleaned, *replacement).into_owned();
    }
    cleaned = SPLIT_NUMBER
        .replace_all(&cleaned, "${1}${2}${3}")
        .into_owned();

    cleaned.trim().to_string()
}

/// Collapse internal whitespace runs to single spaces and trim.
pub fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
