//! Domain models for cross-check results

pub mod crosscheck;
pub mod document;

pub use crosscheck::{
    CrossCheckResult, DiscrepancySeverity, ExtractionStatus, FieldDiscrepancy,
    FieldValidationResult, ProcessingMetadata,
};
pub use document::DocumentData;
