use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Schema field keys, in document order. Every record carries all of them.
pub mod field {
    pub const NOMOR_BUKTI_POTONG: &str = "Nomor Bukti Potong";
    pub const MASA_PAJAK: &str = "Masa Pajak";
    pub const NPWP_NIK_YANG_DIPUNGUT: &str = "NPWP_NIK_Yang_Dipungut";
    pub const NAMA_YANG_DIPUNGUT: &str = "Nama_Yang_Dipungut";
    pub const DPP: &str = "DPP";
    pub const PAJAK_PENGHASILAN: &str = "Pajak_Penghasilan";
    pub const NPWP_NIK_PEMUNGUT: &str = "NPWP_NIK_Pemungut";
    pub const NAMA_PEMUNGUT: &str = "Nama_Pemungut";
    pub const TANGGAL: &str = "Tanggal";
    pub const JENIS_DOKUMEN: &str = "Jenis_Dokumen";
    pub const NOMOR_DOKUMEN: &str = "Nomor_Dokumen";
}

/// All schema keys in column order.
pub const FIELD_KEYS: &[&str] = &[
    field::NOMOR_BUKTI_POTONG,
    field::MASA_PAJAK,
    field::NPWP_NIK_YANG_DIPUNGUT,
    field::NAMA_YANG_DIPUNGUT,
    field::DPP,
    field::PAJAK_PENGHASILAN,
    field::NPWP_NIK_PEMUNGUT,
    field::NAMA_PEMUNGUT,
    field::TANGGAL,
    field::JENIS_DOKUMEN,
    field::NOMOR_DOKUMEN,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractionStatus {
    Success,
    Incomplete,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::Success => "Success",
            ExtractionStatus::Incomplete => "Incomplete",
        }
    }
}

/// One extracted Bukti Potong document, keyed by the schema field names.
/// Every key in [`FIELD_KEYS`] is always present; empty string = not found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuktiPotongRecord {
    pub fields: HashMap<String, String>,
    /// Original PDF filename (set by the batch orchestrator).
    #[serde(default)]
    pub source_file: String,
    #[serde(rename = "extraction_status")]
    pub status: ExtractionStatus,
}

impl BuktiPotongRecord {
    pub fn new() -> Self {
        let mut fields = HashMap::with_capacity(FIELD_KEYS.len());
        for key in FIELD_KEYS {
            fields.insert((*key).to_string(), String::new());
        }
        BuktiPotongRecord {
            fields,
            source_file: String::new(),
            status: ExtractionStatus::Success,
        }
    }

    pub fn get(&self, key: &str) -> &str {
        self.fields.get(key).map(|s| s.as_str()).unwrap_or("")
    }

    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn has(&self, key: &str) -> bool {
        !self.get(key).is_empty()
    }
}

impl Default for BuktiPotongRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// The authenticated caller's organization, used as the acceptance filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyIdentity {
    pub name: String,
    pub npwp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedFile {
    pub filename: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFile {
    pub filename: String,
    pub company_name: String,
    pub company_npwp: String,
    pub reason: String,
}

/// Accumulated outcome of one batch run. Incomplete records appear in both
/// `records` and `failed` (as diagnostics), so `failed` is not disjoint from
/// `records`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchResult {
    pub records: Vec<BuktiPotongRecord>,
    pub failed: Vec<FailedFile>,
    pub skipped: Vec<SkippedFile>,
}

/// End-of-run counts. `failed` excludes incomplete records (those are counted
/// under `incomplete` and still exported).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub success: usize,
    pub incomplete: usize,
    pub failed: usize,
    pub skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_carries_every_field_key() {
        let rec = BuktiPotongRecord::new();
        assert_eq!(rec.fields.len(), FIELD_KEYS.len());
        for key in FIELD_KEYS {
            assert_eq!(rec.get(key), "");
        }
    }

    #[test]
    fn set_and_get_round_trip() {
        let mut rec = BuktiPotongRecord::new();
        rec.set(field::DPP, "1,234,567");
        assert_eq!(rec.get(field::DPP), "1,234,567");
        assert!(rec.has(field::DPP));
        assert!(!rec.has(field::TANGGAL));
    }

    #[test]
    fn status_renders_for_export() {
        assert_eq!(ExtractionStatus::Success.as_str(), "Success");
        assert_eq!(ExtractionStatus::Incomplete.as_str(), "Incomplete");
    }
}
