//! Field comparator and normalizer
//!
//! Pure comparison logic: canonicalizes field values from the two extraction
//! sources and decides, per field, whether they agree and which value wins.
//! Unparseable input is normal OCR/model noise and normalizes to absent, it
//! is never surfaced as an error.

use crate::extractors::{RawMrzData, VisualZoneData};
use crate::models::FieldValidationResult;
use crate::validators::discrepancy_reporter::DiscrepancyReporter;
use crate::validators::fields::{self, FieldPolicy, SourcePreference};
use chrono::NaiveDate;
use tracing::debug;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Cross-validates document fields between the MRZ and VLM sources.
pub struct FieldComparator {
    policy: FieldPolicy,
    reporter: DiscrepancyReporter,
}

impl Default for FieldComparator {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldComparator {
    pub fn new() -> Self {
        Self::with_policy(FieldPolicy::new())
    }

    /// Create a comparator with a non-default field policy. The internal
    /// reporter shares the same policy so recommendations match selections.
    pub fn with_policy(policy: FieldPolicy) -> Self {
        Self {
            reporter: DiscrepancyReporter::with_policy(policy.clone()),
            policy,
        }
    }

    /// Canonicalize a free-text value for comparison.
    ///
    /// Trims, folds case, collapses internal whitespace runs, and strips
    /// combining diacritical marks after NFKD decomposition, so a source
    /// that drops accents and one that preserves them still compare equal:
    /// `"  MÜLLER "` and `"muller"` both canonicalize to `"muller"`.
    /// A value that is empty after trimming is treated as absent.
    pub fn normalize_text(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }

        let lowered = trimmed.to_lowercase();
        let collapsed = lowered.split_whitespace().collect::<Vec<_>>().join(" ");
        let stripped: String = collapsed
            .nfkd()
            .filter(|c| !is_combining_mark(*c))
            .collect();

        Some(stripped)
    }

    /// Normalize a date to ISO `YYYY-MM-DD`.
    ///
    /// Accepts ISO unchanged, packed `YYMMDD` (MRZ convention, two-digit
    /// years >= 50 map to the 1900s), `DD/MM/YYYY`, and `MM-DD-YYYY`.
    /// Anything unparseable, or empty input, yields None.
    pub fn normalize_date(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        let bytes = trimmed.as_bytes();

        // ISO YYYY-MM-DD
        if trimmed.len() == 10 && bytes[4] == b'-' && bytes[7] == b'-' {
            return NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .map(|d| d.format("%Y-%m-%d").to_string());
        }

        // Packed MRZ YYMMDD
        if trimmed.len() == 6 && bytes.iter().all(|b| b.is_ascii_digit()) {
            return expand_packed_date(trimmed).map(|d| d.format("%Y-%m-%d").to_string());
        }

        // European DD/MM/YYYY
        if trimmed.len() == 10 && bytes[2] == b'/' && bytes[5] == b'/' {
            return NaiveDate::parse_from_str(trimmed, "%d/%m/%Y")
                .ok()
                .map(|d| d.format("%Y-%m-%d").to_string());
        }

        // US MM-DD-YYYY
        if trimmed.len() == 10 && bytes[2] == b'-' && bytes[5] == b'-' {
            return NaiveDate::parse_from_str(trimmed, "%m-%d-%Y")
                .ok()
                .map(|d| d.format("%Y-%m-%d").to_string());
        }

        None
    }

    /// Normalize a value according to the field's type: date fields go
    /// through date normalization, everything else through text.
    pub fn normalize_field(&self, field_name: &str, value: &str) -> Option<String> {
        if fields::is_date_field(field_name) {
            self.normalize_date(value)
        } else {
            self.normalize_text(value)
        }
    }

    /// Compare one field across both sources.
    ///
    /// Returns None when neither source carries the field (nothing to
    /// report). A field present in exactly one source validates trivially.
    /// When both are present the normalized forms are compared; on conflict
    /// the preferred source's raw value wins and a discrepancy is attached.
    pub fn compare(
        &self,
        field_name: &str,
        mrz_value: Option<&str>,
        vlm_value: Option<&str>,
    ) -> Option<FieldValidationResult> {
        // Whitespace-only input counts as absent, same as a missing value
        let mrz_raw = mrz_value.map(str::trim).filter(|v| !v.is_empty());
        let vlm_raw = vlm_value.map(str::trim).filter(|v| !v.is_empty());

        let (mrz_raw, vlm_raw) = match (mrz_raw, vlm_raw) {
            (None, None) => return None,
            (Some(m), None) => {
                return Some(FieldValidationResult {
                    field_name: field_name.to_string(),
                    validated: true,
                    mrz_value: Some(m.to_string()),
                    vlm_value: None,
                    final_value: Some(m.to_string()),
                    discrepancy: None,
                });
            }
            (None, Some(v)) => {
                return Some(FieldValidationResult {
                    field_name: field_name.to_string(),
                    validated: true,
                    mrz_value: None,
                    vlm_value: Some(v.to_string()),
                    final_value: Some(v.to_string()),
                    discrepancy: None,
                });
            }
            (Some(m), Some(v)) => (m, v),
        };

        let mrz_normalized = self.normalize_field(field_name, mrz_raw);
        let vlm_normalized = self.normalize_field(field_name, vlm_raw);

        let final_value = match self.policy.preferred_source(field_name) {
            SourcePreference::Mrz => mrz_raw,
            SourcePreference::Vlm => vlm_raw,
        };

        let (validated, discrepancy) = if mrz_normalized == vlm_normalized {
            (true, None)
        } else {
            debug!(
                field = field_name,
                mrz = mrz_raw,
                vlm = vlm_raw,
                "Sources disagree"
            );
            (
                false,
                Some(
                    self.reporter
                        .create_discrepancy(field_name, Some(mrz_raw), Some(vlm_raw)),
                ),
            )
        };

        Some(FieldValidationResult {
            field_name: field_name.to_string(),
            validated,
            mrz_value: Some(mrz_raw.to_string()),
            vlm_value: Some(vlm_raw.to_string()),
            final_value: Some(final_value.to_string()),
            discrepancy,
        })
    }

    /// Compare every canonical field across whichever sources succeeded.
    ///
    /// A None source simply contributes no values, so all of the other
    /// source's fields validate trivially. Fields absent from both sources
    /// are omitted.
    pub fn cross_validate(
        &self,
        mrz_data: Option<&RawMrzData>,
        vlm_data: Option<&VisualZoneData>,
    ) -> Vec<FieldValidationResult> {
        if mrz_data.is_none() && vlm_data.is_none() {
            return Vec::new();
        }

        let mut results = Vec::new();
        for field_name in fields::STANDARD_FIELDS {
            let mrz_value = mrz_data.and_then(|d| mrz_field_value(d, field_name));
            let vlm_value = vlm_data.and_then(|d| vlm_field_value(d, field_name));

            if let Some(result) = self.compare(field_name, mrz_value, vlm_value) {
                results.push(result);
            }
        }

        debug!(fields = results.len(), "Cross-validation complete");
        results
    }
}

/// Expand a packed YYMMDD date with the MRZ century rule.
fn expand_packed_date(digits: &str) -> Option<NaiveDate> {
    let yy: i32 = digits[0..2].parse().ok()?;
    let mm: u32 = digits[2..4].parse().ok()?;
    let dd: u32 = digits[4..6].parse().ok()?;

    let year = if yy >= 50 { 1900 + yy } else { 2000 + yy };
    NaiveDate::from_ymd_opt(year, mm, dd)
}

/// Map a canonical field name onto the MRZ extractor's field layout.
/// The zone has no place-of-birth field.
fn mrz_field_value<'a>(data: &'a RawMrzData, field_name: &str) -> Option<&'a str> {
    match field_name {
        "surname" => data.surname.as_deref(),
        "given_names" => data.given_names.as_deref(),
        "date_of_birth" => data.birth_date.as_deref(),
        "nationality" => data.nationality.as_deref(),
        "passport_number" => data.document_number.as_deref(),
        "expiry_date" => data.expiry_date.as_deref(),
        "sex" => data.sex.as_deref(),
        _ => None,
    }
}

fn vlm_field_value<'a>(data: &'a VisualZoneData, field_name: &str) -> Option<&'a str> {
    match field_name {
        "surname" => data.surname.as_deref(),
        "given_names" => data.given_names.as_deref(),
        "date_of_birth" => data.date_of_birth.as_deref(),
        "nationality" => data.nationality.as_deref(),
        "passport_number" => data.passport_number.as_deref(),
        "expiry_date" => data.expiry_date.as_deref(),
        "sex" => data.sex.as_deref(),
        "place_of_birth" => data.place_of_birth.as_deref(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DiscrepancySeverity;

    fn comparator() -> FieldComparator {
        FieldComparator::new()
    }

    #[test]
    fn test_normalize_text_folds_case_and_trims() {
        let c = comparator();
        assert_eq!(c.normalize_text("  SMITH  "), Some("smith".to_string()));
    }

    #[test]
    fn test_normalize_text_collapses_internal_whitespace() {
        let c = comparator();
        assert_eq!(
            c.normalize_text("John   Michael\tDoe"),
            Some("john michael doe".to_string())
        );
    }

    #[test]
    fn test_normalize_text_strips_diacritics() {
        let c = comparator();
        assert_eq!(c.normalize_text("  MÜLLER  "), Some("muller".to_string()));
        assert_eq!(c.normalize_text("muller"), Some("muller".to_string()));
        assert_eq!(c.normalize_text("José"), Some("jose".to_string()));
    }

    #[test]
    fn test_normalize_text_empty_is_absent() {
        let c = comparator();
        assert_eq!(c.normalize_text(""), None);
        assert_eq!(c.normalize_text("   "), None);
    }

    #[test]
    fn test_normalize_text_is_idempotent() {
        let c = comparator();
        for input in ["  MÜLLER  ", "John   Doe", "José García", "plain"] {
            let once = c.normalize_text(input).unwrap();
            let twice = c.normalize_text(&once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_normalize_date_iso_passthrough() {
        let c = comparator();
        assert_eq!(
            c.normalize_date("1985-03-15"),
            Some("1985-03-15".to_string())
        );
    }

    #[test]
    fn test_normalize_date_packed_1900s() {
        let c = comparator();
        assert_eq!(c.normalize_date("850315"), Some("1985-03-15".to_string()));
    }

    #[test]
    fn test_normalize_date_packed_2000s() {
        let c = comparator();
        assert_eq!(c.normalize_date("050315"), Some("2005-03-15".to_string()));
    }

    #[test]
    fn test_normalize_date_century_boundary() {
        let c = comparator();
        assert_eq!(c.normalize_date("500101"), Some("1950-01-01".to_string()));
        assert_eq!(c.normalize_date("490101"), Some("2049-01-01".to_string()));
    }

    #[test]
    fn test_normalize_date_european_format() {
        let c = comparator();
        assert_eq!(
            c.normalize_date("15/03/1985"),
            Some("1985-03-15".to_string())
        );
    }

    #[test]
    fn test_normalize_date_us_format() {
        let c = comparator();
        assert_eq!(
            c.normalize_date("03-15-1985"),
            Some("1985-03-15".to_string())
        );
    }

    #[test]
    fn test_normalize_date_rejects_garbage() {
        let c = comparator();
        assert_eq!(c.normalize_date(""), None);
        assert_eq!(c.normalize_date("  "), None);
        assert_eq!(c.normalize_date("not a date"), None);
        assert_eq!(c.normalize_date("991332"), None); // month 13
        assert_eq!(c.normalize_date("2020-02-30"), None);
        assert_eq!(c.normalize_date("850230"), None); // Feb 30
    }

    #[test]
    fn test_compare_agreement_across_case_and_whitespace() {
        let c = comparator();
        let result = c
            .compare("surname", Some("SMITH"), Some("  smith "))
            .unwrap();

        assert!(result.validated);
        assert!(result.discrepancy.is_none());
    }

    #[test]
    fn test_compare_agreement_across_date_formats() {
        let c = comparator();
        let result = c
            .compare("date_of_birth", Some("850315"), Some("1985-03-15"))
            .unwrap();

        assert!(result.validated);
        // MRZ preferred for dates: raw packed value wins
        assert_eq!(result.final_value.as_deref(), Some("850315"));
    }

    #[test]
    fn test_compare_conflict_prefers_mrz_for_passport_number() {
        let c = comparator();
        let result = c
            .compare("passport_number", Some("123456789"), Some("123456780"))
            .unwrap();

        assert!(!result.validated);
        assert_eq!(result.final_value.as_deref(), Some("123456789"));

        let discrepancy = result.discrepancy.unwrap();
        assert_eq!(discrepancy.severity, DiscrepancySeverity::Critical);
        assert_eq!(discrepancy.recommended_value.as_deref(), Some("123456789"));
    }

    #[test]
    fn test_compare_conflict_prefers_vlm_for_surname() {
        let c = comparator();
        let result = c
            .compare("surname", Some("MULLER"), Some("MUELLER"))
            .unwrap();

        assert!(!result.validated);
        assert_eq!(result.final_value.as_deref(), Some("MUELLER"));
    }

    #[test]
    fn test_compare_single_source_never_discrepant() {
        let c = comparator();
        for field in fields::STANDARD_FIELDS {
            let result = c.compare(field, Some("VALUE"), None).unwrap();
            assert!(result.validated, "{} should validate", field);
            assert!(result.discrepancy.is_none());
            assert_eq!(result.final_value.as_deref(), Some("VALUE"));

            let result = c.compare(field, None, Some("VALUE")).unwrap();
            assert!(result.validated);
            assert!(result.discrepancy.is_none());
        }
    }

    #[test]
    fn test_compare_both_absent_is_omitted() {
        let c = comparator();
        assert!(c.compare("surname", None, None).is_none());
        assert!(c.compare("surname", Some("  "), Some("")).is_none());
    }

    #[test]
    fn test_compare_whitespace_only_counts_as_absent() {
        let c = comparator();
        let result = c.compare("surname", Some("   "), Some("SMITH")).unwrap();
        assert!(result.validated);
        assert!(result.mrz_value.is_none());
        assert_eq!(result.final_value.as_deref(), Some("SMITH"));
    }

    fn mrz_fixture() -> RawMrzData {
        RawMrzData {
            mrz_type: Some("TD3".to_string()),
            raw_text: Some("P<USASMITH<<JOHN<<<".to_string()),
            surname: Some("SMITH".to_string()),
            given_names: Some("JOHN".to_string()),
            nationality: Some("USA".to_string()),
            birth_date: Some("850315".to_string()),
            sex: Some("M".to_string()),
            expiry_date: Some("300101".to_string()),
            document_number: Some("123456789".to_string()),
            ..Default::default()
        }
    }

    fn vlm_fixture() -> VisualZoneData {
        VisualZoneData {
            surname: Some("Smith".to_string()),
            given_names: Some("John".to_string()),
            date_of_birth: Some("1985-03-15".to_string()),
            nationality: Some("USA".to_string()),
            passport_number: Some("123456789".to_string()),
            expiry_date: Some("2030-01-01".to_string()),
            sex: Some("M".to_string()),
            place_of_birth: Some("New York".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_cross_validate_full_agreement() {
        let c = comparator();
        let results = c.cross_validate(Some(&mrz_fixture()), Some(&vlm_fixture()));

        assert_eq!(results.len(), 8);
        assert!(results.iter().all(|r| r.validated));
        assert!(results.iter().all(|r| r.discrepancy.is_none()));
    }

    #[test]
    fn test_cross_validate_records_mismatch() {
        let c = comparator();
        let mut vlm = vlm_fixture();
        vlm.passport_number = Some("123456780".to_string());

        let results = c.cross_validate(Some(&mrz_fixture()), Some(&vlm));
        let passport = results
            .iter()
            .find(|r| r.field_name == "passport_number")
            .unwrap();

        assert!(!passport.validated);
        assert!(passport.discrepancy.is_some());
        assert_eq!(passport.final_value.as_deref(), Some("123456789"));
    }

    #[test]
    fn test_cross_validate_mrz_only() {
        let c = comparator();
        let results = c.cross_validate(Some(&mrz_fixture()), None);

        // The MRZ has no place_of_birth, so only 7 fields surface
        assert_eq!(results.len(), 7);
        assert!(results.iter().all(|r| r.validated));
        assert!(results.iter().all(|r| r.vlm_value.is_none()));
    }

    #[test]
    fn test_cross_validate_vlm_only() {
        let c = comparator();
        let results = c.cross_validate(None, Some(&vlm_fixture()));

        assert_eq!(results.len(), 8);
        assert!(results.iter().all(|r| r.validated));
        assert!(results.iter().all(|r| r.mrz_value.is_none()));
    }

    #[test]
    fn test_cross_validate_both_absent() {
        let c = comparator();
        assert!(c.cross_validate(None, None).is_empty());
    }

    #[test]
    fn test_cross_validate_preserves_field_order() {
        let c = comparator();
        let results = c.cross_validate(Some(&mrz_fixture()), Some(&vlm_fixture()));
        let names: Vec<&str> = results.iter().map(|r| r.field_name.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "surname",
                "given_names",
                "date_of_birth",
                "nationality",
                "passport_number",
                "expiry_date",
                "sex",
                "place_of_birth",
            ]
        );
    }
}
