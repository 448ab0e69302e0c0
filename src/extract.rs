//! Field extraction for Bukti Potong documents.
//!
//! The documents are system-generated with a fixed layout, so every field is
//! pulled out by an ordered list of anchored patterns over the normalized,
//! upper-cased text. The first pattern in a list that matches wins; later
//! patterns are never consulted once one succeeds. A field no pattern matches
//! stays an empty string; extraction itself never fails.

use crate::normalize::{clean_pdf_text, collapse_ws};
use crate::types::{field, BuktiPotongRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

const MONTH_NAMES: [&str; 12] = [
    "Januari",
    "Februari",
    "Maret",
    "April",
    "Mei",
    "Juni",
    "Juli",
    "Agustus",
    "September",
    "Oktober",
    "November",
    "Desember",
];

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("field pattern regex"))
        .collect()
}

/// Nomor Bukti Potong: an 8-10 char alphanumeric code followed by a MM-YYYY
/// period, located by contextual anchors in strict priority order.
static BUPOT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        // Between the MASA PAJAK header and the A. IDENTITAS section.
        r"(?s)MASA\s+PAJAK.*?([A-Z0-9]{8,10})\s+(\d{2}-\d{4}).*?A\.\s+IDENTITAS",
        // Directly after PEMUNGUTAN.
        r"PEMUNGUTAN\s+([A-Z0-9]{8,10})\s+\d{2}-\d{4}",
        // After the NOMOR / MASA PAJAK column headers.
        r"(?s)NOMOR\s+MASA\s+PAJAK.*?([A-Z0-9]{8,10})\s+\d{2}-\d{4}",
        // In the header area after the BPPU form code.
        r"(?s)BPPU.*?([A-Z0-9]{8,10})\s+\d{2}-\d{4}",
    ])
});

static MASA_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(\d{2}-\d{4})\s*TIDAK\s*FINAL",
        r"(\d{2}-\d{4})\s*NORMAL",
        r"MASA\s*PAJAK.*?(\d{2}-\d{4})",
        r"(\d{2}-\d{4})",
    ])
});

static NPWP_DIPUNGUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"A\.1\s*NPWP\s*/\s*NIK\s*:\s*(\d{15,16})").expect("A.1 regex"));
static NPWP_PEMUNGUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"C\.1\s*NPWP\s*/\s*NIK\s*:\s*(\d{15,16})").expect("C.1 regex"));

static NAMA_DIPUNGUT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)A\.2\s*NAMA\s*:\s*(.*?)A\.3").expect("A.2 regex"));

static DPP_INLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)B\.5\s*[^:]*:\s*(\d{1,3}(?:\.\d{3})*)").expect("B.5 regex"));
static PPH_INLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)B\.7\s*[^:]*:\s*(\d{1,3}(?:\.\d{3})*)").expect("B.7 regex"));
static AMOUNT_TABLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?si)B\.3\s+B\.4\s+B\.5\s+B\.6\s+B\.7(.*?)B\.8").expect("amount table regex")
});
/// Amounts inside the table span must carry at least one separator group.
static DOTTED_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}(?:\.\d{3})+").expect("dotted number regex"));

static NAMA_PEMUNGUT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?si)C\.3\s*NAMA\s*PEMOTONG\s*DAN/ATAU\s*PEMUNGUT\s*PPh\s*:\s*(.*?)C\.4",
        r"(?si)C\.3\s*NAMA\s*:\s*(.*?)C\.4",
    ])
});

const MONTH_ALT: &str =
    "JANUARI|FEBRUARI|MARET|APRIL|MEI|JUNI|JULI|AGUSTUS|SEPTEMBER|OKTOBER|NOVEMBER|DESEMBER";

static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    let patterns = [
        format!(r"C\.4\s*TANGGAL\s*:\s*(\d{{1,2}})\s+({MONTH_ALT})\s+(\d{{4}})"),
        format!(r"TANGGAL\s*:\s*(\d{{1,2}})\s+({MONTH_ALT})\s+(\d{{4}})"),
        // Last resort: any colon-prefixed day/month/year triple.
        format!(r":\s*(\d{{1,2}})\s+({MONTH_ALT})\s+(\d{{4}})"),
    ];
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("date pattern regex"))
        .collect()
});

static JENIS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"(?s)B\.8.*?JENIS\s*DOKUMEN\s*:\s*(.+?)(?:\s*TANGGAL|B\.9|$)",
        r"(?s)JENIS\s*DOKUMEN\s*:\s*(.+?)(?:\s*TANGGAL|B\.9|$)",
    ])
});

static NOMOR_DOK_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        // Inline: B.9 NOMOR DOKUMEN : 250331/25 ... B.10
        r"(?si)B\.9\s*NOMOR\s*DOKUMEN\s*:\s*(.+?)\s*B\.10",
        // Label and value split across lines by the layout.
        r"(?si)B\.9\s*\n?\s*NOMOR\s*DOKUMEN\s*\n?\s*:\s*\n?\s*(.+?)\s*B\.10",
        // Bare label without the B.9 prefix.
        r"(?si)NOMOR\s*DOKUMEN\s*:\s*(.+?)\s*B\.10",
    ])
});

/// First capture group of the first matching pattern, in list order.
fn first_capture<'t>(patterns: &[Regex], text: &'t str) -> Option<&'t str> {
    patterns
        .iter()
        .find_map(|p| p.captures(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Render an integer with comma thousands separators (1234567 -> "1,234,567").
pub fn format_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Strip `.` thousands separators and parse the plain digit string.
fn parse_dotted_amount(s: &str) -> Option<u64> {
    s.replace('.', "").parse().ok()
}

/// `MM-YYYY` -> `"<MonthName> YYYY"`. A month outside 1-12 keeps the raw
/// token unchanged so the failure stays visible downstream.
fn render_masa_pajak(masa: &str) -> String {
    let (month_str, year) = match masa.split_once('-') {
        Some(parts) => parts,
        None => return masa.to_string(),
    };
    let month: usize = month_str.parse().unwrap_or(0);
    match month {
        1..=12 => format!("{} {}", MONTH_NAMES[month - 1], year),
        _ => masa.to_string(),
    }
}

/// Canonical title-case month name for an upper-cased match.
fn title_case_month(upper: &str) -> String {
    MONTH_NAMES
        .iter()
        .find(|name| name.eq_ignore_ascii_case(upper))
        .map(|name| (*name).to_string())
        .unwrap_or_else(|| {
            let mut chars = upper.chars();
            match chars.next() {
                Some(first) => first.to_string() + &chars.as_str().to_lowercase(),
                None => String::new(),
            }
        })
}

/// Extract all schema fields from one document's raw text.
///
/// Normalizes and upper-cases internally, then runs each field's pattern
/// cascade. Always returns a record with every field key present; fields that
/// matched nothing are empty strings.
pub fn extract_fields(raw_text: &str, filename: &str) -> BuktiPotongRecord {
    let text = clean_pdf_text(raw_text).to_uppercase();
    let mut record = BuktiPotongRecord::new();
    record.source_file = filename.to_string();

    if let Some(bupot) = first_capture(&BUPOT_PATTERNS, &text) {
        record.set(field::NOMOR_BUKTI_POTONG, bupot);
    }

    if let Some(masa) = first_capture(&MASA_PATTERNS, &text) {
        record.set(field::MASA_PAJAK, render_masa_pajak(masa));
    }

    if let Some(c) = NPWP_DIPUNGUT.captures(&text) {
        record.set(field::NPWP_NIK_YANG_DIPUNGUT, &c[1]);
    }
    if let Some(c) = NPWP_PEMUNGUT.captures(&text) {
        record.set(field::NPWP_NIK_PEMUNGUT, &c[1]);
    }

    if let Some(c) = NAMA_DIPUNGUT.captures(&text) {
        record.set(field::NAMA_YANG_DIPUNGUT, collapse_ws(&c[1]));
    }

    if let Some(c) = DPP_INLINE.captures(&text) {
        if let Some(value) = parse_dotted_amount(&c[1]) {
            record.set(field::DPP, format_thousands(value));
        }
    }
    if let Some(c) = PPH_INLINE.captures(&text) {
        if let Some(value) = parse_dotted_amount(&c[1]) {
            record.set(field::PAJAK_PENGHASILAN, format_thousands(value));
        }
    }

    // Table layout fallback: amounts sit in a row under the B.3..B.7 column
    // headers instead of behind inline labels. First token is the DPP, last
    // is the tax. Extra separated tokens in the span would shift the pick;
    // the source format does not produce them, so this is not guarded.
    if !record.has(field::DPP) || !record.has(field::PAJAK_PENGHASILAN) {
        if let Some(c) = AMOUNT_TABLE.captures(&text) {
            let tokens: Vec<&str> = DOTTED_NUMBER
                .find_iter(c.get(1).map(|m| m.as_str()).unwrap_or(""))
                .map(|m| m.as_str())
                .collect();
            if tokens.len() >= 2 {
                if !record.has(field::DPP) {
                    if let Some(value) = parse_dotted_amount(tokens[0]) {
                        record.set(field::DPP, format_thousands(value));
                    }
                }
                if !record.has(field::PAJAK_PENGHASILAN) {
                    if let Some(value) = parse_dotted_amount(tokens[tokens.len() - 1]) {
                        record.set(field::PAJAK_PENGHASILAN, format_thousands(value));
                    }
                }
            }
        }
    }

    if let Some(nama) = first_capture(&NAMA_PEMUNGUT_PATTERNS, &text) {
        record.set(field::NAMA_PEMUNGUT, collapse_ws(nama));
    }

    if let Some(caps) = DATE_PATTERNS.iter().find_map(|p| p.captures(&text)) {
        let day = &caps[1];
        let month = title_case_month(&caps[2]);
        let year = &caps[3];
        record.set(field::TANGGAL, format!("{} {} {}", day, month, year));
    }

    if let Some(jenis) = first_capture(&JENIS_PATTERNS, &text) {
        record.set(field::JENIS_DOKUMEN, collapse_ws(jenis));
    }

    if let Some(nomor) = first_capture(&NOMOR_DOK_PATTERNS, &text) {
        record.set(field::NOMOR_DOKUMEN, collapse_ws(nomor));
    }

    debug!(
        file = filename,
        bupot = record.get(field::NOMOR_BUKTI_POTONG),
        dpp = record.get(field::DPP),
        "fields extracted"
    );

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FIELD_KEYS;

    /// Text shaped like one normalized Bukti Potong page.
    fn sample_document() -> &'static str {
        "KEMENTERIAN KEUANGAN REPUBLIK INDONESIA BUKTI PEMOTONGAN DAN \
         PEMUNGUTAN PPH NOMOR MASA PAJAK SIFAT PEMOTONGAN \
         0000012345 06-2025 TIDAK FINAL A. IDENTITAS PENERIMA PENGHASILAN \
         A.1 NPWP / NIK : 012345678901234 \
         A.2 NAMA : PT MAJU BERSAMA SEJAHTERA A.3 ALAMAT : JAKARTA \
         B.5 DASAR PENGENAAN PAJAK : 1.234.567 \
         B.7 PPH DIPOTONG : 123.456 \
         B.8 JENIS DOKUMEN : FAKTUR PAJAK TANGGAL : 5 JUNI 2025 \
         B.9 NOMOR DOKUMEN : 250331/25 B.10 \
         C. IDENTITAS PEMOTONG C.1 NPWP / NIK : 987654321098765 \
         C.3 NAMA PEMOTONG DAN/ATAU PEMUNGUT PPh : PT PEMBAYAR UTAMA C.4 \
         TANGGAL : 10 JUNI 2025"
    }

    #[test]
    fn full_document_extracts_every_field() {
        let rec = extract_fields(sample_document(), "bp.pdf");
        assert_eq!(rec.get(field::NOMOR_BUKTI_POTONG), "0000012345");
        assert_eq!(rec.get(field::MASA_PAJAK), "Juni 2025");
        assert_eq!(rec.get(field::NPWP_NIK_YANG_DIPUNGUT), "012345678901234");
        assert_eq!(rec.get(field::NAMA_YANG_DIPUNGUT), "PT MAJU BERSAMA SEJAHTERA");
        assert_eq!(rec.get(field::DPP), "1,234,567");
        assert_eq!(rec.get(field::PAJAK_PENGHASILAN), "123,456");
        assert_eq!(rec.get(field::NPWP_NIK_PEMUNGUT), "987654321098765");
        assert_eq!(rec.get(field::NAMA_PEMUNGUT), "PT PEMBAYAR UTAMA");
        // The C.4-anchored pattern outranks the bare TANGGAL in the B.8 area.
        assert_eq!(rec.get(field::TANGGAL), "10 Juni 2025");
        assert_eq!(rec.get(field::JENIS_DOKUMEN), "FAKTUR PAJAK");
        assert_eq!(rec.get(field::NOMOR_DOKUMEN), "250331/25");
        assert_eq!(rec.source_file, "bp.pdf");
    }

    #[test]
    fn garbage_input_yields_empty_fields_not_panic() {
        let rec = extract_fields("completely unrelated text ::: 42", "junk.pdf");
        for key in FIELD_KEYS {
            // Pattern anchors all miss; every key still present.
            assert!(rec.fields.contains_key(*key));
        }
        assert_eq!(rec.get(field::NOMOR_BUKTI_POTONG), "");
        assert_eq!(rec.get(field::DPP), "");
    }

    #[test]
    fn inline_amounts_re_render_with_commas() {
        let rec = extract_fields("B.5 DPP : 1.234.567 B.7 PPH : 123.456", "a.pdf");
        assert_eq!(rec.get(field::DPP), "1,234,567");
        assert_eq!(rec.get(field::PAJAK_PENGHASILAN), "123,456");
    }

    #[test]
    fn table_layout_takes_first_and_last_tokens() {
        let text = "B.3 B.4 B.5 B.6 B.7 21-100-01 SEWA 1.000.000 2 50.000 B.8";
        let rec = extract_fields(text, "t.pdf");
        assert_eq!(rec.get(field::DPP), "1,000,000");
        assert_eq!(rec.get(field::PAJAK_PENGHASILAN), "50,000");
    }

    #[test]
    fn table_tokens_require_a_separator_group() {
        // "2" (the rate) has no dot group and must not count as an amount.
        let text = "B.3 B.4 B.5 B.6 B.7 2 1.000.000 50.000 B.8";
        let rec = extract_fields(text, "t.pdf");
        assert_eq!(rec.get(field::DPP), "1,000,000");
        assert_eq!(rec.get(field::PAJAK_PENGHASILAN), "50,000");
    }

    #[test]
    fn inline_amount_wins_over_table() {
        let text = "B.5 DPP : 7.000 B.3 B.4 B.5 B.6 B.7 1.000.000 50.000 B.8";
        let rec = extract_fields(text, "t.pdf");
        assert_eq!(rec.get(field::DPP), "7,000");
        // B.7 inline missed, so the tax still comes from the table.
        assert_eq!(rec.get(field::PAJAK_PENGHASILAN), "50,000");
    }

    #[test]
    fn single_table_token_is_not_enough() {
        let rec = extract_fields("B.3 B.4 B.5 B.6 B.7 1.000.000 B.8", "t.pdf");
        assert_eq!(rec.get(field::DPP), "");
        assert_eq!(rec.get(field::PAJAK_PENGHASILAN), "");
    }

    #[test]
    fn masa_pajak_renders_indonesian_month() {
        let rec = extract_fields("01-2025 TIDAK FINAL", "m.pdf");
        assert_eq!(rec.get(field::MASA_PAJAK), "Januari 2025");
    }

    #[test]
    fn masa_pajak_out_of_range_month_keeps_raw_token() {
        let rec = extract_fields("13-2025 TIDAK FINAL", "m.pdf");
        assert_eq!(rec.get(field::MASA_PAJAK), "13-2025");
    }

    #[test]
    fn masa_pajak_anchors_beat_bare_period() {
        // A stray period appears before the anchored one; the TIDAK FINAL
        // anchor has priority over the bare MM-YYYY pattern.
        let rec = extract_fields("NOMOR 01-2024 LALU 07-2025 TIDAK FINAL", "m.pdf");
        assert_eq!(rec.get(field::MASA_PAJAK), "Juli 2025");
    }

    #[test]
    fn bupot_falls_back_to_pemungutan_anchor() {
        let rec = extract_fields("PEMUNGUTAN AB12345678 03-2025", "b.pdf");
        assert_eq!(rec.get(field::NOMOR_BUKTI_POTONG), "AB12345678");
    }

    #[test]
    fn date_last_resort_matches_colon_prefixed_triple() {
        let rec = extract_fields("DITANDATANGANI : 17 AGUSTUS 2025", "d.pdf");
        assert_eq!(rec.get(field::TANGGAL), "17 Agustus 2025");
    }

    #[test]
    fn jenis_dokumen_stops_at_tanggal() {
        let rec = extract_fields("JENIS DOKUMEN : INVOICE KOMERSIAL TANGGAL : X", "j.pdf");
        assert_eq!(rec.get(field::JENIS_DOKUMEN), "INVOICE KOMERSIAL");
    }

    #[test]
    fn nomor_dokumen_collapses_internal_whitespace() {
        let rec = extract_fields("B.9 NOMOR DOKUMEN : 2503  31/25 B.10", "n.pdf");
        assert_eq!(rec.get(field::NOMOR_DOKUMEN), "2503 31/25");
    }

    #[test]
    fn format_thousands_groups_digits() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1000), "1,000");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }
}
