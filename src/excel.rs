//! Typed Excel export for extracted records.
//!
//! One workbook, one `Coretax_Extraction` sheet. Amounts become real integer
//! cells, dates become real date cells, NPWP columns are forced to text so
//! leading zeros survive, and the filename carries the company name plus a
//! run timestamp so no run ever overwrites another.

use crate::error::CoretaxError;
use crate::types::{BuktiPotongRecord, CompanyIdentity, FIELD_KEYS};
use chrono::{Datelike, NaiveDate};
use rust_xlsxwriter::{Color, ExcelDateTime, Format, Workbook, Worksheet, XlsxError};
use std::path::{Path, PathBuf};
use tracing::info;

const SHEET_NAME: &str = "Coretax_Extraction";

/// Localized column headers; the first eleven line up with [`FIELD_KEYS`].
const EXPORT_HEADERS: &[&str] = &[
    "Nomor Bukti Potong",
    "Masa Pajak",
    "NPWP/NIK yang Dipungut",
    "Nama yang Dipungut",
    "DPP",
    "Pajak Penghasilan",
    "NPWP/NIK Pemungut",
    "Nama Pemungut",
    "Tanggal",
    "Jenis Dokumen",
    "Nomor Dokumen",
    "Source File",
    "Status",
];

const NPWP_COLUMNS: [usize; 2] = [2, 6];
const AMOUNT_COLUMNS: [usize; 2] = [4, 5];
const DATE_COLUMN: usize = 8;

const MONTH_NUMBERS: [(&str, u32); 12] = [
    ("Januari", 1),
    ("Februari", 2),
    ("Maret", 3),
    ("April", 4),
    ("Mei", 5),
    ("Juni", 6),
    ("Juli", 7),
    ("Agustus", 8),
    ("September", 9),
    ("Oktober", 10),
    ("November", 11),
    ("Desember", 12),
];

/// Parse a thousands-separated amount string to an integer.
/// Empty or unparseable values are `None`, never an error.
pub fn parse_amount(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "nan" {
        return None;
    }
    let cleaned: String = trimmed
        .chars()
        .filter(|c| *c != ',' && *c != '.' && !c.is_whitespace())
        .collect();
    cleaned.parse().ok()
}

/// Parse `"<day> <IndonesianMonth> <year>"` into a calendar date.
/// Anything that does not fit the format is `None`.
pub fn parse_indonesian_date(value: &str) -> Option<NaiveDate> {
    let parts: Vec<&str> = value.split_whitespace().collect();
    if parts.len() != 3 {
        return None;
    }
    let day: u32 = parts[0].parse().ok()?;
    let month = MONTH_NUMBERS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(parts[1]))
        .map(|(_, n)| *n)?;
    let year: i32 = parts[2].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Company name reduced to filesystem-safe characters, spaces underscored.
pub fn sanitize_company_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
        .collect();
    kept.trim().replace(' ', "_")
}

/// Drop control characters that would corrupt the sheet XML; the writer
/// handles XML escaping itself.
fn sanitize_cell(s: &str) -> String {
    s.chars()
        .filter(|c| {
            let u = *c as u32;
            !(u < 0x20 || u == 0x7F || u == 0xFFFE || u == 0xFFFF)
        })
        .collect()
}

/// A literal "nan" is an artifact of the extraction side, not a value.
fn cell_text(value: &str) -> String {
    if value == "nan" {
        String::new()
    } else {
        sanitize_cell(value)
    }
}

fn write_text_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    text: &str,
    format: &Format,
) -> Result<(), XlsxError> {
    worksheet
        .write_string_with_format(row, col, &cell_text(text), format)
        .map(|_| ())
}

/// Estimate a column width from text length, capped like a spreadsheet user
/// would set it by hand.
fn estimate_width(text: &str) -> f64 {
    ((text.chars().count() + 2) as f64).clamp(10.0, 50.0)
}

fn column_widths(records: &[BuktiPotongRecord]) -> Vec<f64> {
    let mut widths: Vec<f64> = EXPORT_HEADERS.iter().map(|h| estimate_width(h)).collect();
    for record in records {
        for (col, key) in FIELD_KEYS.iter().enumerate() {
            let w = estimate_width(record.get(key));
            if w > widths[col] {
                widths[col] = w;
            }
        }
        let w = estimate_width(&record.source_file);
        if w > widths[11] {
            widths[11] = w;
        }
    }
    widths
}

/// Pick an output path that cannot collide with a previous run.
fn output_path(output_dir: &Path, company: &CompanyIdentity) -> PathBuf {
    let safe_name = sanitize_company_name(&company.name);
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    let mut path = output_dir.join(format!("coretax_{}_{}.xlsx", safe_name, timestamp));
    let mut counter = 2u32;
    while path.exists() {
        path = output_dir.join(format!("coretax_{}_{}_{}.xlsx", safe_name, timestamp, counter));
        counter += 1;
    }
    path
}

/// Write all records (complete and incomplete) to a new workbook in
/// `output_dir` and return the file path. Export is all-or-nothing: any
/// I/O or writer error fails the whole run.
pub fn export_records_to_excel(
    records: &[BuktiPotongRecord],
    output_dir: &Path,
    company: &CompanyIdentity,
) -> Result<PathBuf, CoretaxError> {
    if !output_dir.is_dir() {
        return Err(CoretaxError::OutputDirMissing {
            path: output_dir.to_path_buf(),
        });
    }
    let path = output_path(output_dir, company);

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name(SHEET_NAME)
        .map_err(|e| export_error(&path, e))?;

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x0099D8))
        .set_font_color(Color::RGB(0xFFFFFF));
    let text_format = Format::new();
    let npwp_format = Format::new().set_num_format("@");
    let amount_format = Format::new().set_num_format("#,##0");
    let date_format = Format::new().set_num_format("DD MMM YYYY");

    for (col, &width) in column_widths(records).iter().enumerate() {
        worksheet
            .set_column_width(col as u16, width)
            .map_err(|e| export_error(&path, e))?;
    }

    for (col, header) in EXPORT_HEADERS.iter().enumerate() {
        write_text_cell(worksheet, 0, col as u16, header, &header_format)
            .map_err(|e| export_error(&path, e))?;
    }

    for (row_idx, record) in records.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        for (col_idx, key) in FIELD_KEYS.iter().enumerate() {
            let col = col_idx as u16;
            let value = record.get(key);
            if AMOUNT_COLUMNS.contains(&col_idx) {
                if let Some(amount) = parse_amount(value) {
                    worksheet
                        .write_number_with_format(row, col, amount as f64, &amount_format)
                        .map_err(|e| export_error(&path, e))?;
                }
            } else if col_idx == DATE_COLUMN {
                if let Some(date) = parse_indonesian_date(value) {
                    let excel_date = ExcelDateTime::from_ymd(
                        date.year() as u16,
                        date.month() as u8,
                        date.day() as u8,
                    )
                    .map_err(|e| export_error(&path, e))?;
                    worksheet
                        .write_datetime_with_format(row, col, &excel_date, &date_format)
                        .map_err(|e| export_error(&path, e))?;
                }
            } else if NPWP_COLUMNS.contains(&col_idx) {
                write_text_cell(worksheet, row, col, value, &npwp_format)
                    .map_err(|e| export_error(&path, e))?;
            } else {
                write_text_cell(worksheet, row, col, value, &text_format)
                    .map_err(|e| export_error(&path, e))?;
            }
        }
        write_text_cell(worksheet, row, 11, &record.source_file, &text_format)
            .map_err(|e| export_error(&path, e))?;
        write_text_cell(worksheet, row, 12, record.status.as_str(), &text_format)
            .map_err(|e| export_error(&path, e))?;
    }

    worksheet
        .set_freeze_panes(1, 0)
        .map_err(|e| export_error(&path, e))?;
    workbook.save(&path).map_err(|e| export_error(&path, e))?;

    info!(rows = records.len(), file = %path.display(), "results saved");
    Ok(path)
}

fn export_error(path: &Path, e: XlsxError) -> CoretaxError {
    CoretaxError::ExportFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    }
}
