//! Merged document record

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Reconciled identity-document record, assembled from the winning value of
/// every compared field.
///
/// Exposed to presentation/export layers unchanged; nothing here is bound to
/// a particular wire format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentData {
    pub source_file: PathBuf,
    pub surname: Option<String>,
    pub given_names: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub passport_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    /// M, F, or unknown
    pub sex: Option<String>,
    pub place_of_birth: Option<String>,

    /// MRZ format when the zone was read (TD1, TD3, ...)
    pub mrz_type: Option<String>,
    /// Check-digit verdict from the MRZ validator
    pub mrz_valid: bool,
}

impl DocumentData {
    /// Names of canonical fields that could not be extracted from either source.
    pub fn unavailable_fields(&self) -> Vec<&'static str> {
        let mut unavailable = Vec::new();
        if self.surname.is_none() {
            unavailable.push("surname");
        }
        if self.given_names.is_none() {
            unavailable.push("given_names");
        }
        if self.date_of_birth.is_none() {
            unavailable.push("date_of_birth");
        }
        if self.nationality.is_none() {
            unavailable.push("nationality");
        }
        if self.passport_number.is_none() {
            unavailable.push("passport_number");
        }
        if self.expiry_date.is_none() {
            unavailable.push("expiry_date");
        }
        if self.sex.is_none() {
            unavailable.push("sex");
        }
        if self.place_of_birth.is_none() {
            unavailable.push("place_of_birth");
        }
        unavailable
    }
}
