//! Cross-check result data model
//!
//! All types here are constructed once per run and never mutated afterwards.
//! Collections default to empty so downstream serialization never sees null.

use crate::models::DocumentData;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Outcome class of one cross-check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    /// Both sources produced data
    Success,
    /// Exactly one source produced data
    Partial,
    /// Neither source produced data
    Error,
}

impl ExtractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionStatus::Success => "success",
            ExtractionStatus::Partial => "partial",
            ExtractionStatus::Error => "error",
        }
    }
}

/// Severity class of a field disagreement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscrepancySeverity {
    /// Identity-defining fields (passport number, dates)
    Critical,
    /// Important fields (names, nationality)
    Warning,
    /// Optional fields (sex, place of birth)
    Informational,
}

impl DiscrepancySeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscrepancySeverity::Critical => "critical",
            DiscrepancySeverity::Warning => "warning",
            DiscrepancySeverity::Informational => "informational",
        }
    }
}

/// A field on which the two sources disagreed after normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDiscrepancy {
    pub field_name: String,
    pub mrz_value: Option<String>,
    pub vlm_value: Option<String>,
    pub recommended_value: Option<String>,
    pub severity: DiscrepancySeverity,
    pub reason: String,
}

/// Comparison outcome for a single field.
///
/// `validated` is true when both sources agreed after normalization, or when
/// only one source carried the field at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldValidationResult {
    pub field_name: String,
    pub validated: bool,
    pub mrz_value: Option<String>,
    pub vlm_value: Option<String>,
    /// Value chosen by the source-preference policy
    pub final_value: Option<String>,
    pub discrepancy: Option<FieldDiscrepancy>,
}

/// Timing and provenance for one run. Write-once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// Correlates log lines across one invocation
    pub check_id: Uuid,
    pub extraction_duration_ms: u64,
    /// None when the MRZ branch never produced a measurable attempt
    pub mrz_duration_ms: Option<u64>,
    /// None when the VLM branch never produced a measurable attempt
    pub vlm_duration_ms: Option<u64>,
    pub vlm_model: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Root aggregate of one cross-check invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossCheckResult {
    pub status: ExtractionStatus,
    pub document_data: Option<DocumentData>,

    #[serde(default)]
    pub field_confidences: HashMap<String, f64>,
    /// Present iff `status != Error`
    pub document_confidence: Option<f64>,

    #[serde(default)]
    pub discrepancies: Vec<FieldDiscrepancy>,

    #[serde(default)]
    pub sources_used: Vec<String>,
    pub mrz_extraction_success: bool,
    pub vlm_extraction_success: bool,

    pub metadata: ProcessingMetadata,

    /// Set only when `status == Error`
    pub error: Option<String>,
    pub mrz_error: Option<String>,
    pub vlm_error: Option<String>,
}

impl CrossCheckResult {
    /// True if any field disagreed between sources.
    pub fn has_discrepancies(&self) -> bool {
        !self.discrepancies.is_empty()
    }

    /// Discrepancies affecting identity-critical fields.
    pub fn critical_discrepancies(&self) -> Vec<&FieldDiscrepancy> {
        self.discrepancies
            .iter()
            .filter(|d| d.severity == DiscrepancySeverity::Critical)
            .collect()
    }
}
