//! Canonical field set and reconciliation policy tables
//!
//! Source preference and discrepancy severity are static per field name.
//! The tables are immutable; deployments needing different behavior layer
//! overrides through [`FieldPolicy`] instead of mutating them.

use crate::models::DiscrepancySeverity;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Canonical comparable fields, in report order.
pub const STANDARD_FIELDS: [&str; 8] = [
    "surname",
    "given_names",
    "date_of_birth",
    "nationality",
    "passport_number",
    "expiry_date",
    "sex",
    "place_of_birth",
];

/// Fields whose values are calendar dates (normalized via the date path).
pub const DATE_FIELDS: [&str; 2] = ["date_of_birth", "expiry_date"];

/// Which source wins when both carry a value for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourcePreference {
    /// Machine-readable zone: checksum-validated, immune to free-text OCR noise
    Mrz,
    /// Vision model: recovers diacritics and free text the MRZ charset drops
    Vlm,
}

/// Fields where the checksum-backed MRZ is authoritative.
static MRZ_PREFERRED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["passport_number", "date_of_birth", "expiry_date", "nationality"]
        .into_iter()
        .collect()
});

/// Fields where the vision model is authoritative.
static VLM_PREFERRED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    ["surname", "given_names", "place_of_birth"]
        .into_iter()
        .collect()
});

static SEVERITY_MAP: Lazy<HashMap<&'static str, DiscrepancySeverity>> = Lazy::new(|| {
    HashMap::from([
        ("passport_number", DiscrepancySeverity::Critical),
        ("date_of_birth", DiscrepancySeverity::Critical),
        ("expiry_date", DiscrepancySeverity::Critical),
        ("surname", DiscrepancySeverity::Warning),
        ("given_names", DiscrepancySeverity::Warning),
        ("nationality", DiscrepancySeverity::Warning),
        ("sex", DiscrepancySeverity::Informational),
        ("place_of_birth", DiscrepancySeverity::Informational),
    ])
});

/// True for fields normalized as dates.
pub fn is_date_field(field_name: &str) -> bool {
    DATE_FIELDS.contains(&field_name)
}

/// True when the static tables explicitly prefer the MRZ for this field
/// (as opposed to the MRZ winning as the default).
pub fn is_mrz_preferred(field_name: &str) -> bool {
    MRZ_PREFERRED.contains(field_name)
}

/// Per-field reconciliation policy with optional overrides layered over the
/// static tables. Cheap to clone; shared by the comparator and the reporter
/// so the two can never disagree on who wins a field.
#[derive(Debug, Clone, Default)]
pub struct FieldPolicy {
    preference_overrides: HashMap<String, SourcePreference>,
    severity_overrides: HashMap<String, DiscrepancySeverity>,
}

impl FieldPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the preferred source for one field.
    pub fn with_preference_override(mut self, field_name: &str, preference: SourcePreference) -> Self {
        self.preference_overrides
            .insert(field_name.to_string(), preference);
        self
    }

    /// Override the discrepancy severity for one field.
    pub fn with_severity_override(mut self, field_name: &str, severity: DiscrepancySeverity) -> Self {
        self.severity_overrides
            .insert(field_name.to_string(), severity);
        self
    }

    /// Preferred source for a field. Fields without an explicit preference
    /// default to the MRZ.
    pub fn preferred_source(&self, field_name: &str) -> SourcePreference {
        if let Some(preference) = self.preference_overrides.get(field_name) {
            return *preference;
        }
        if VLM_PREFERRED.contains(field_name) {
            SourcePreference::Vlm
        } else {
            SourcePreference::Mrz
        }
    }

    /// Discrepancy severity for a field. Unmapped fields are Warning.
    pub fn severity_for(&self, field_name: &str) -> DiscrepancySeverity {
        if let Some(severity) = self.severity_overrides.get(field_name) {
            return *severity;
        }
        SEVERITY_MAP
            .get(field_name)
            .copied()
            .unwrap_or(DiscrepancySeverity::Warning)
    }
}
