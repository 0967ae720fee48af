//! Reconciliation components
//!
//! Pure logic, no side effects: the field comparator/normalizer, the
//! confidence scorer, the discrepancy reporter, and the shared field policy
//! tables they all consult.

pub mod confidence_scorer;
pub mod discrepancy_reporter;
pub mod field_comparator;
pub mod fields;

pub use confidence_scorer::ConfidenceScorer;
pub use discrepancy_reporter::DiscrepancyReporter;
pub use field_comparator::FieldComparator;
pub use fields::{FieldPolicy, SourcePreference};
