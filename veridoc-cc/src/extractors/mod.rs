//! Extraction source boundaries
//!
//! The cross-check core consumes two independent extraction sources: a
//! machine-readable-zone reader and a vision-language model. Both are
//! external collaborators; this module defines their contracts and the raw
//! data they hand to the orchestrator. Raw extractions are immutable once
//! produced and consumed read-only.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Identifier for the MRZ branch in `sources_used`.
pub const MRZ_SOURCE: &str = "mrz";

/// Identifier for the VLM branch in `sources_used`.
pub const VLM_SOURCE: &str = "vlm";

/// MRZ extraction errors
#[derive(Debug, Error)]
pub enum MrzExtractError {
    /// No machine-readable zone located in the image
    #[error("No machine-readable zone found in image")]
    MrzNotFound,

    /// Image could not be decoded
    #[error("Unreadable image: {0}")]
    UnreadableImage(String),

    /// OCR backend not installed or not on PATH
    #[error("Missing OCR dependency: {0}")]
    MissingDependency(String),

    /// Any other extraction failure
    #[error("{0}")]
    Other(String),
}

/// VLM extraction errors
#[derive(Debug, Error)]
pub enum VlmExtractError {
    /// Provider-side deadline exceeded
    #[error("VLM request timed out after {0:?}")]
    Timeout(Duration),

    /// Network-level failure reaching the inference endpoint
    #[error("Transport error: {0}")]
    Transport(String),

    /// Model responded but fields could not be extracted
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Provider misconfigured (missing token, unknown model)
    #[error("Provider misconfigured: {0}")]
    Configuration(String),
}

/// Raw MRZ extraction result, prior to validation and reconciliation.
///
/// Values are kept exactly as decoded from the zone: dates stay in the
/// packed YYMMDD convention and names in the MRZ's truncated charset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMrzData {
    /// MRZ format (TD1, TD2, TD3, MRVA, MRVB)
    pub mrz_type: Option<String>,
    /// Full raw zone text, kept for checksum validation
    pub raw_text: Option<String>,
    pub surname: Option<String>,
    pub given_names: Option<String>,
    pub country: Option<String>,
    pub nationality: Option<String>,
    /// YYMMDD
    pub birth_date: Option<String>,
    /// M, F, or <
    pub sex: Option<String>,
    /// YYMMDD
    pub expiry_date: Option<String>,
    pub document_number: Option<String>,
    pub optional_data: Option<String>,
}

/// Structured fields extracted from the visual zone by the VLM.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VisualZoneData {
    pub surname: Option<String>,
    pub given_names: Option<String>,
    /// ISO YYYY-MM-DD as reported by the model
    pub date_of_birth: Option<String>,
    pub nationality: Option<String>,
    pub passport_number: Option<String>,
    /// ISO YYYY-MM-DD as reported by the model
    pub expiry_date: Option<String>,
    pub sex: Option<String>,
    pub place_of_birth: Option<String>,
    /// Unparsed model response, kept for diagnostics
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

/// Outcome of MRZ checksum validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MrzValidation {
    pub is_valid: bool,
    pub warnings: Vec<String>,
}

/// Machine-readable-zone reader.
///
/// Implementations are synchronous (OCR is CPU-bound); the orchestrator
/// offloads calls to a blocking worker so they never stall the VLM branch.
pub trait MrzExtractor: Send + Sync {
    fn extract(&self, image_path: &Path) -> Result<RawMrzData, MrzExtractError>;
}

/// ICAO 9303 check-digit validator for raw MRZ text.
///
/// Consumed only to set the `mrz_valid` flag on the merged record; the
/// verdict plays no part in field reconciliation.
pub trait MrzValidator: Send + Sync {
    fn validate(&self, raw_mrz: &str) -> MrzValidation;
}

/// Vision-language-model field extraction provider.
///
/// The field set mirrors the MRZ extractor's target fields so the comparator
/// can union them by name. Retry policy, if any, is internal to the
/// implementation and opaque to the core.
#[async_trait]
pub trait VlmProvider: Send + Sync {
    /// Identifying name of the underlying model, recorded in result metadata.
    fn model_name(&self) -> &str;

    /// Extract visual-zone fields from a document image.
    ///
    /// The timeout is advisory for the provider's own transport; the
    /// orchestrator enforces its own independent deadline regardless.
    async fn extract_fields(
        &self,
        image_path: &Path,
        timeout: Duration,
    ) -> Result<VisualZoneData, VlmExtractError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_the_failure() {
        let err = MrzExtractError::MissingDependency("tesseract".to_string());
        assert!(err.to_string().contains("tesseract"));

        let err = VlmExtractError::Timeout(Duration::from_secs(60));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_raw_data_defaults_are_empty() {
        let mrz = RawMrzData::default();
        assert!(mrz.document_number.is_none());
        assert!(mrz.raw_text.is_none());

        let vlm = VisualZoneData::default();
        assert!(vlm.passport_number.is_none());
    }
}
