//! End-to-end pipeline tests: batch over a stubbed text source, export to a
//! real workbook, and read the workbook back to verify the typed cells.

use calamine::{open_workbook, Data, Reader, Xlsx};
use coretax_extractor::{
    batch, excel, types::field, BuktiPotongRecord, CompanyIdentity, CoretaxError,
    ExtractionStatus, TextSource,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

struct FakeSource {
    texts: HashMap<String, String>,
}

impl TextSource for FakeSource {
    fn extract_text(&self, path: &Path) -> Result<String, CoretaxError> {
        let name = path.file_name().unwrap().to_str().unwrap();
        Ok(self.texts.get(name).cloned().unwrap_or_default())
    }
}

fn company() -> CompanyIdentity {
    CompanyIdentity {
        name: "PT Maju Bersama".to_string(),
        npwp: "01.234.567-8-901234".to_string(),
    }
}

fn fake_source() -> FakeSource {
    let matching = "KEMENTERIAN KEUANGAN REPUBLIK INDONESIA \
        BUKTI PEMOTONGAN DAN PEMUNGUTAN PPH \
        NOMOR MASA PAJAK 0000012345 06-2025 TIDAK FINAL A. IDENTITAS \
        A.1 NPWP / NIK : 012345678901234 \
        A.2 NAMA : PT MAJU BERSAMA A.3 ALAMAT : JAKARTA \
        B.5 DASAR PENGENAAN PAJAK : 1.000.000 \
        B.7 PPH YANG DIPOTONG : 50.000 \
        B.8 JENIS DOKUMEN : FAKTUR PAJAK TANGGAL : 5 JUNI 2025 \
        B.9 NOMOR DOKUMEN : 250331/25 B.10 \
        C.1 NPWP / NIK : 987654321098765 \
        C.3 NAMA : PT PEMBAYAR C.4 TANGGAL : 10 JUNI 2025";
    let mismatching = "PEMUNGUTAN 0000099999 06-2025 TIDAK FINAL \
        A.1 NPWP / NIK : 999999999999999 \
        A.2 NAMA : PT LAIN A.3 \
        B.5 DPP : 5.000 B.7 PPH : 100";
    FakeSource {
        texts: HashMap::from([
            ("a.pdf".to_string(), matching.to_string()),
            ("b.pdf".to_string(), mismatching.to_string()),
            ("c.pdf".to_string(), String::new()),
        ]),
    }
}

#[test]
fn batch_then_export_round_trips_typed_cells() {
    let files = vec![
        PathBuf::from("a.pdf"),
        PathBuf::from("b.pdf"),
        PathBuf::from("c.pdf"),
    ];
    let result = batch::run_batch(&files, &company(), &fake_source(), &mut batch::NoopProgress);

    assert_eq!(result.records.len(), 1);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.failed.len(), 1);
    let summary = batch::summarize(&result, files.len());
    assert_eq!(
        (summary.total, summary.success, summary.skipped, summary.failed),
        (3, 1, 1, 1)
    );

    let dir = tempfile::tempdir().unwrap();
    let path = excel::export_records_to_excel(&result.records, dir.path(), &company()).unwrap();
    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("coretax_PT_Maju_Bersama_"));

    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    let range = workbook.worksheet_range("Coretax_Extraction").unwrap();

    assert_eq!(
        range.get_value((0, 0)),
        Some(&Data::String("Nomor Bukti Potong".to_string()))
    );
    // NPWP stays text so the leading zero survives.
    assert_eq!(
        range.get_value((1, 2)),
        Some(&Data::String("012345678901234".to_string()))
    );
    // DPP is a real number cell, not a string.
    assert_eq!(range.get_value((1, 4)), Some(&Data::Float(1_000_000.0)));
    assert_eq!(range.get_value((1, 5)), Some(&Data::Float(50_000.0)));
    // The date column holds a typed (non-string) cell.
    match range.get_value((1, 8)) {
        Some(Data::DateTime(_)) | Some(Data::Float(_)) => {}
        other => panic!("expected a typed date cell, got {:?}", other),
    }
    assert_eq!(
        range.get_value((1, 11)),
        Some(&Data::String("a.pdf".to_string()))
    );
    assert_eq!(
        range.get_value((1, 12)),
        Some(&Data::String("Success".to_string()))
    );
}

#[test]
fn incomplete_records_are_exported_too() {
    let mut record = BuktiPotongRecord::new();
    record.set(field::NOMOR_BUKTI_POTONG, "0000012345");
    record.set(field::PAJAK_PENGHASILAN, "123,456");
    record.source_file = "only.pdf".to_string();
    record.status = ExtractionStatus::Incomplete;

    let dir = tempfile::tempdir().unwrap();
    let path = excel::export_records_to_excel(&[record], dir.path(), &company()).unwrap();

    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    let range = workbook.worksheet_range("Coretax_Extraction").unwrap();

    // Missing DPP leaves an empty cell; the tax amount is still typed.
    assert!(matches!(
        range.get_value((1, 4)),
        None | Some(&Data::Empty)
    ));
    assert_eq!(range.get_value((1, 5)), Some(&Data::Float(123_456.0)));
    assert_eq!(
        range.get_value((1, 12)),
        Some(&Data::String("Incomplete".to_string()))
    );
}

#[test]
fn string_amount_exports_as_integer_cell() {
    // "1,234,567" in the record becomes the integer 1234567 in the sheet.
    let mut record = BuktiPotongRecord::new();
    record.set(field::DPP, "1,234,567");
    record.source_file = "x.pdf".to_string();

    let dir = tempfile::tempdir().unwrap();
    let path = excel::export_records_to_excel(&[record], dir.path(), &company()).unwrap();

    let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
    let range = workbook.worksheet_range("Coretax_Extraction").unwrap();
    assert_eq!(range.get_value((1, 4)), Some(&Data::Float(1_234_567.0)));
}
