//! Acceptance filter: does this document belong to the requesting company?
//!
//! Matching is NPWP-only. Names are carried for diagnostics but never
//! compared, since the same legal entity appears under several spellings
//! across documents.

use crate::types::{field, BuktiPotongRecord, CompanyIdentity};
use serde::{Deserialize, Serialize};

/// Fields that must be present for a record to count as fully extracted.
pub const CRITICAL_FIELDS: &[&str] = &[
    field::NOMOR_BUKTI_POTONG,
    field::DPP,
    field::PAJAK_PENGHASILAN,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Document NPWP matches the company NPWP.
    Accept,
    /// One side has no NPWP; identity cannot be verified, process anyway.
    AcceptWithWarning,
    /// Both NPWPs present and different; excluded from results.
    Skip { reason: String },
}

/// Strip everything but letters and digits so `01.234.567-8-901` and
/// `012345678901` compare equal.
pub fn clean_npwp(npwp: &str) -> String {
    npwp.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Decide whether an extracted record belongs to `company`.
pub fn classify(record: &BuktiPotongRecord, company: &CompanyIdentity) -> Decision {
    let company_npwp = clean_npwp(&company.npwp);
    let document_npwp = clean_npwp(record.get(field::NPWP_NIK_YANG_DIPUNGUT));

    if company_npwp.is_empty() || document_npwp.is_empty() {
        return Decision::AcceptWithWarning;
    }
    if company_npwp != document_npwp {
        return Decision::Skip {
            reason: "NPWP mismatch".to_string(),
        };
    }
    Decision::Accept
}

/// Critical fields that are still empty, in schema order.
pub fn missing_critical_fields(record: &BuktiPotongRecord) -> Vec<&'static str> {
    CRITICAL_FIELDS
        .iter()
        .copied()
        .filter(|key| !record.has(key))
        .collect()
}
