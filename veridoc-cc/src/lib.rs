//! # veridoc-cc: dual-source identity-document cross-check
//!
//! Extracts identity fields from a machine-readable zone reader and a
//! vision-language model concurrently, reconciles the two field sets, and
//! produces a single record with per-field confidence and a
//! severity-classified discrepancy report.
//!
//! The extraction sources are external collaborators behind the traits in
//! [`extractors`]; everything else — orchestration, comparison, scoring,
//! reporting — lives here. The entry point is
//! [`services::CrossCheckService::run`], which never fails: every outcome,
//! including total extraction failure, is expressed through the returned
//! [`models::CrossCheckResult`].

pub mod config;
pub mod extractors;
pub mod models;
pub mod services;
pub mod validators;

pub use crate::config::{ConfidenceConfig, CrossCheckConfig};
pub use crate::models::{CrossCheckResult, ExtractionStatus};
pub use crate::services::CrossCheckService;
