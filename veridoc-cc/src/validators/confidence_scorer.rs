//! Confidence scorer
//!
//! Scores how much to trust each reconciled field, then aggregates the
//! per-field scores into one document-level number. Agreement between two
//! independently-obtained sources is worth more than a single source, which
//! in turn is worth more than a known conflict.

use crate::config::ConfidenceConfig;
use crate::extractors::{MRZ_SOURCE, VLM_SOURCE};
use crate::models::{DiscrepancySeverity, FieldValidationResult};
use std::collections::HashMap;
use tracing::debug;

/// Calculates confidence scores for cross-check results.
pub struct ConfidenceScorer {
    config: ConfidenceConfig,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(ConfidenceConfig::default())
    }
}

impl ConfidenceScorer {
    pub fn new(config: ConfidenceConfig) -> Self {
        Self { config }
    }

    /// Confidence for a single field, given which sources succeeded.
    ///
    /// With both sources available: agreement scores
    /// `agreement_confidence`; disagreement scores
    /// `disagreement_base_confidence`, scaled by
    /// `critical_disagreement_factor` when the conflicted field is
    /// Critical-severity. With one source: the per-source single-source
    /// constant. Output is clamped to [0.0, 1.0].
    pub fn field_confidence(
        &self,
        result: &FieldValidationResult,
        sources_used: &[String],
    ) -> f64 {
        let has_mrz = sources_used.iter().any(|s| s == MRZ_SOURCE);
        let has_vlm = sources_used.iter().any(|s| s == VLM_SOURCE);

        let confidence = if has_mrz && has_vlm {
            if result.validated {
                self.config.agreement_confidence
            } else {
                let base = self.config.disagreement_base_confidence;
                match result.discrepancy.as_ref().map(|d| d.severity) {
                    Some(DiscrepancySeverity::Critical) => {
                        base * self.config.critical_disagreement_factor
                    }
                    _ => base,
                }
            }
        } else if has_mrz {
            self.config.single_source_mrz_confidence
        } else if has_vlm {
            self.config.single_source_vlm_confidence
        } else {
            0.0
        };

        clamp(confidence)
    }

    /// Document confidence: the arithmetic mean of the per-field scores.
    ///
    /// An empty field set yields 0.0 — no extracted evidence, no confidence.
    pub fn document_confidence(&self, field_confidences: &HashMap<String, f64>) -> f64 {
        if field_confidences.is_empty() {
            return 0.0;
        }

        let sum: f64 = field_confidences.values().map(|c| clamp(*c)).sum();
        let mean = sum / field_confidences.len() as f64;

        debug!(
            fields = field_confidences.len(),
            confidence = mean,
            "Document confidence computed"
        );
        clamp(mean)
    }
}

fn clamp(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}
