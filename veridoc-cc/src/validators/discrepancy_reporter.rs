//! Discrepancy reporter
//!
//! Turns per-field comparison outcomes into a severity-classified report a
//! human reviewer can act on: which fields disagree, which value to trust,
//! and why.

use crate::models::{FieldDiscrepancy, FieldValidationResult};
use crate::validators::fields::{self, FieldPolicy, SourcePreference};
use tracing::debug;

/// Generates discrepancy reports from cross-validation results.
///
/// Applies the same source-preference policy as the comparator, so the
/// recommended value always matches the value the comparator selected.
pub struct DiscrepancyReporter {
    policy: FieldPolicy,
}

impl Default for DiscrepancyReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscrepancyReporter {
    pub fn new() -> Self {
        Self::with_policy(FieldPolicy::new())
    }

    pub fn with_policy(policy: FieldPolicy) -> Self {
        Self { policy }
    }

    /// Recommend a value based on source reliability.
    ///
    /// Falls back to the other source when the preferred one has nothing;
    /// None only when both are absent.
    pub fn recommend_value(
        &self,
        field_name: &str,
        mrz_value: Option<&str>,
        vlm_value: Option<&str>,
    ) -> Option<String> {
        match (mrz_value, vlm_value) {
            (None, None) => None,
            (Some(m), None) => Some(m.to_string()),
            (None, Some(v)) => Some(v.to_string()),
            (Some(m), Some(v)) => match self.policy.preferred_source(field_name) {
                SourcePreference::Mrz => Some(m.to_string()),
                SourcePreference::Vlm => Some(v.to_string()),
            },
        }
    }

    /// Build a discrepancy record for a field where the sources disagree.
    pub fn create_discrepancy(
        &self,
        field_name: &str,
        mrz_value: Option<&str>,
        vlm_value: Option<&str>,
    ) -> FieldDiscrepancy {
        FieldDiscrepancy {
            field_name: field_name.to_string(),
            mrz_value: mrz_value.map(str::to_string),
            vlm_value: vlm_value.map(str::to_string),
            recommended_value: self.recommend_value(field_name, mrz_value, vlm_value),
            severity: self.policy.severity_for(field_name),
            reason: self.reason(field_name, mrz_value, vlm_value),
        }
    }

    /// Filter validation results down to the unresolved fields, preserving
    /// input order. Empty when all sources agree.
    pub fn generate_report(&self, results: &[FieldValidationResult]) -> Vec<FieldDiscrepancy> {
        let report: Vec<FieldDiscrepancy> = results
            .iter()
            .filter_map(|r| r.discrepancy.clone())
            .collect();

        if !report.is_empty() {
            debug!(count = report.len(), "Discrepancies reported");
        }
        report
    }

    /// One-line explanation naming the preferred source and why.
    fn reason(&self, field_name: &str, mrz_value: Option<&str>, vlm_value: Option<&str>) -> String {
        if mrz_value.is_none() {
            return format!("only the vision model produced {}", field_name);
        }
        if vlm_value.is_none() {
            return format!("only the machine-readable zone produced {}", field_name);
        }

        match self.policy.preferred_source(field_name) {
            SourcePreference::Vlm => format!(
                "vision model preferred for {}: recovers diacritics and free text",
                field_name
            ),
            SourcePreference::Mrz if fields::is_mrz_preferred(field_name) => format!(
                "machine-readable zone preferred for {}: checksum-backed field",
                field_name
            ),
            SourcePreference::Mrz => format!(
                "machine-readable zone used as default for {}; values differ",
                field_name
            ),
        }
    }
}
