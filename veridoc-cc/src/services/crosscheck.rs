//! Cross-check orchestration service
//!
//! Runs the MRZ and VLM extractions concurrently under independent
//! deadlines, reconciles whatever came back, and assembles one
//! [`CrossCheckResult`]. Every failure mode — branch timeout, branch
//! failure, even a panic inside a collaborator — is expressed through the
//! returned result, never through an error path.

use crate::config::CrossCheckConfig;
use crate::extractors::{
    MrzExtractor, MrzValidator, RawMrzData, VisualZoneData, VlmProvider, MRZ_SOURCE, VLM_SOURCE,
};
use crate::models::{
    CrossCheckResult, DocumentData, ExtractionStatus, FieldValidationResult, ProcessingMetadata,
};
use crate::validators::{ConfidenceScorer, DiscrepancyReporter, FieldComparator};
use chrono::{NaiveDate, Utc};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// One extraction branch's outcome: data, error message, elapsed time.
/// Exactly one of data/error is set; elapsed is captured whenever the
/// branch ran at all.
type BranchOutcome<T> = (Option<T>, Option<String>, Option<u64>);

/// Orchestrates dual-source document extraction with cross-validation.
///
/// One call, one result: the service is stateless across invocations, so
/// concurrent calls from multiple callers need no synchronization.
pub struct CrossCheckService {
    mrz_extractor: Arc<dyn MrzExtractor>,
    mrz_validator: Arc<dyn MrzValidator>,
    vlm_provider: Arc<dyn VlmProvider>,
    config: CrossCheckConfig,
    comparator: FieldComparator,
    scorer: ConfidenceScorer,
    reporter: DiscrepancyReporter,
}

impl CrossCheckService {
    pub fn new(
        mrz_extractor: Arc<dyn MrzExtractor>,
        mrz_validator: Arc<dyn MrzValidator>,
        vlm_provider: Arc<dyn VlmProvider>,
    ) -> Self {
        Self::with_config(
            mrz_extractor,
            mrz_validator,
            vlm_provider,
            CrossCheckConfig::default(),
        )
    }

    pub fn with_config(
        mrz_extractor: Arc<dyn MrzExtractor>,
        mrz_validator: Arc<dyn MrzValidator>,
        vlm_provider: Arc<dyn VlmProvider>,
        config: CrossCheckConfig,
    ) -> Self {
        let scorer = ConfidenceScorer::new(config.confidence.clone());
        Self {
            mrz_extractor,
            mrz_validator,
            vlm_provider,
            config,
            comparator: FieldComparator::new(),
            scorer,
            reporter: DiscrepancyReporter::new(),
        }
    }

    /// Run the full cross-check for one document image.
    ///
    /// Never panics and never returns an error: unexpected failures inside
    /// the pipeline degrade to an `Error`-status result.
    pub async fn run(&self, image_path: &Path) -> CrossCheckResult {
        let check_id = Uuid::new_v4();
        let start = Instant::now();

        match AssertUnwindSafe(self.run_inner(check_id, image_path, start))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(_) => {
                error!(%check_id, "Cross-check aborted by unexpected panic");
                self.build_error_result(
                    check_id,
                    start,
                    None,
                    None,
                    "Unexpected error during cross-check".to_string(),
                    None,
                    None,
                )
            }
        }
    }

    async fn run_inner(
        &self,
        check_id: Uuid,
        image_path: &Path,
        start: Instant,
    ) -> CrossCheckResult {
        info!(%check_id, image = %image_path.display(), "Starting cross-check");

        // Both branches always run to completion (or their own deadline);
        // a timeout on one never cancels the other.
        let (mrz_branch, vlm_branch) = tokio::join!(
            self.extract_mrz(check_id, image_path),
            self.extract_vlm(check_id, image_path),
        );
        let (mrz_data, mrz_error, mrz_duration) = mrz_branch;
        let (vlm_data, vlm_error, vlm_duration) = vlm_branch;

        let mrz_success = mrz_data.is_some();
        let vlm_success = vlm_data.is_some();

        let mut sources_used: Vec<String> = Vec::new();
        if mrz_success {
            sources_used.push(MRZ_SOURCE.to_string());
        }
        if vlm_success {
            sources_used.push(VLM_SOURCE.to_string());
        }

        let status = match (mrz_success, vlm_success) {
            (true, true) => ExtractionStatus::Success,
            (false, false) => ExtractionStatus::Error,
            _ => ExtractionStatus::Partial,
        };

        if status == ExtractionStatus::Error {
            let overall = format!(
                "Both extraction sources failed (mrz: {}; vlm: {})",
                mrz_error.as_deref().unwrap_or("unknown"),
                vlm_error.as_deref().unwrap_or("unknown"),
            );
            warn!(%check_id, error = %overall, "Cross-check failed");
            return self.build_error_result(
                check_id,
                start,
                mrz_error,
                vlm_error,
                overall,
                mrz_duration,
                vlm_duration,
            );
        }

        let validation_results = self
            .comparator
            .cross_validate(mrz_data.as_ref(), vlm_data.as_ref());

        let mut field_confidences: HashMap<String, f64> = HashMap::new();
        for result in &validation_results {
            field_confidences.insert(
                result.field_name.clone(),
                self.scorer.field_confidence(result, &sources_used),
            );
        }
        let document_confidence = self.scorer.document_confidence(&field_confidences);

        let discrepancies = self.reporter.generate_report(&validation_results);

        let document_data =
            self.build_document_data(image_path, mrz_data.as_ref(), &validation_results);

        info!(
            %check_id,
            status = status.as_str(),
            fields = validation_results.len(),
            discrepancies = discrepancies.len(),
            document_confidence,
            "Cross-check complete"
        );

        CrossCheckResult {
            status,
            document_data: Some(document_data),
            field_confidences,
            document_confidence: Some(document_confidence),
            discrepancies,
            sources_used,
            mrz_extraction_success: mrz_success,
            vlm_extraction_success: vlm_success,
            metadata: self.build_metadata(check_id, start, mrz_duration, vlm_duration),
            error: None,
            mrz_error,
            vlm_error,
        }
    }

    /// MRZ branch: the extractor is synchronous and CPU-bound, so it runs on
    /// a blocking worker under this branch's own deadline.
    async fn extract_mrz(&self, check_id: Uuid, image_path: &Path) -> BranchOutcome<RawMrzData> {
        let started = Instant::now();
        let extractor = Arc::clone(&self.mrz_extractor);
        let path = image_path.to_path_buf();
        let task = tokio::task::spawn_blocking(move || extractor.extract(&path));

        match tokio::time::timeout(self.config.mrz_timeout, task).await {
            Ok(Ok(Ok(data))) => {
                let elapsed = elapsed_ms(started);
                debug!(%check_id, elapsed_ms = elapsed, "MRZ extraction succeeded");
                (Some(data), None, Some(elapsed))
            }
            Ok(Ok(Err(e))) => {
                let elapsed = elapsed_ms(started);
                warn!(%check_id, error = %e, "MRZ extraction failed");
                (
                    None,
                    Some(format!("MRZ extraction failed: {}", e)),
                    Some(elapsed),
                )
            }
            Ok(Err(join_error)) => {
                // Extractor panicked on the blocking worker
                let elapsed = elapsed_ms(started);
                warn!(%check_id, error = %join_error, "MRZ extraction aborted");
                (
                    None,
                    Some(format!("MRZ extraction failed: {}", join_error)),
                    Some(elapsed),
                )
            }
            Err(_) => {
                warn!(%check_id, timeout = ?self.config.mrz_timeout, "MRZ extraction timed out");
                (
                    None,
                    Some(format!(
                        "MRZ extraction timed out after {}s",
                        self.config.mrz_timeout.as_secs_f64()
                    )),
                    Some(elapsed_ms(started)),
                )
            }
        }
    }

    /// VLM branch: network-bound async call under its own deadline.
    async fn extract_vlm(&self, check_id: Uuid, image_path: &Path) -> BranchOutcome<VisualZoneData> {
        let started = Instant::now();
        let call = self
            .vlm_provider
            .extract_fields(image_path, self.config.vlm_timeout);

        match tokio::time::timeout(self.config.vlm_timeout, call).await {
            Ok(Ok(data)) => {
                let elapsed = elapsed_ms(started);
                debug!(%check_id, elapsed_ms = elapsed, "VLM extraction succeeded");
                (Some(data), None, Some(elapsed))
            }
            Ok(Err(e)) => {
                let elapsed = elapsed_ms(started);
                warn!(%check_id, error = %e, "VLM extraction failed");
                (
                    None,
                    Some(format!("VLM extraction failed: {}", e)),
                    Some(elapsed),
                )
            }
            Err(_) => {
                warn!(%check_id, timeout = ?self.config.vlm_timeout, "VLM extraction timed out");
                (
                    None,
                    Some(format!(
                        "VLM extraction timed out after {}s",
                        self.config.vlm_timeout.as_secs_f64()
                    )),
                    Some(elapsed_ms(started)),
                )
            }
        }
    }

    /// Assemble the merged record from each field's winning value.
    fn build_document_data(
        &self,
        image_path: &Path,
        mrz_data: Option<&RawMrzData>,
        validation_results: &[FieldValidationResult],
    ) -> DocumentData {
        let mut final_values: HashMap<&str, &str> = HashMap::new();
        for result in validation_results {
            if let Some(value) = result.final_value.as_deref() {
                final_values.insert(result.field_name.as_str(), value);
            }
        }
        let owned = |field: &str| final_values.get(field).map(|v| v.to_string());

        let date_of_birth = final_values
            .get("date_of_birth")
            .and_then(|v| self.parse_date(v));
        let expiry_date = final_values
            .get("expiry_date")
            .and_then(|v| self.parse_date(v));

        let mut mrz_type = None;
        let mut mrz_valid = false;
        if let Some(data) = mrz_data {
            mrz_type = data.mrz_type.clone();
            if let Some(raw_text) = data.raw_text.as_deref() {
                if !raw_text.is_empty() {
                    let validation = self.mrz_validator.validate(raw_text);
                    for warning in &validation.warnings {
                        debug!(warning = %warning, "MRZ validator warning");
                    }
                    mrz_valid = validation.is_valid;
                }
            }
        }

        DocumentData {
            source_file: image_path.to_path_buf(),
            surname: owned("surname"),
            given_names: owned("given_names"),
            date_of_birth,
            nationality: owned("nationality"),
            passport_number: owned("passport_number"),
            expiry_date,
            sex: owned("sex"),
            place_of_birth: owned("place_of_birth"),
            mrz_type,
            mrz_valid,
        }
    }

    /// Parse a winning date value into a structured date, tolerant of both
    /// ISO and the packed MRZ format.
    fn parse_date(&self, value: &str) -> Option<NaiveDate> {
        self.comparator
            .normalize_date(value)
            .and_then(|iso| NaiveDate::parse_from_str(&iso, "%Y-%m-%d").ok())
    }

    fn build_metadata(
        &self,
        check_id: Uuid,
        start: Instant,
        mrz_duration: Option<u64>,
        vlm_duration: Option<u64>,
    ) -> ProcessingMetadata {
        ProcessingMetadata {
            check_id,
            extraction_duration_ms: elapsed_ms(start),
            mrz_duration_ms: mrz_duration,
            vlm_duration_ms: vlm_duration,
            vlm_model: Some(self.vlm_provider.model_name().to_string()),
            timestamp: Utc::now(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn build_error_result(
        &self,
        check_id: Uuid,
        start: Instant,
        mrz_error: Option<String>,
        vlm_error: Option<String>,
        overall_error: String,
        mrz_duration: Option<u64>,
        vlm_duration: Option<u64>,
    ) -> CrossCheckResult {
        CrossCheckResult {
            status: ExtractionStatus::Error,
            document_data: None,
            field_confidences: HashMap::new(),
            document_confidence: None,
            discrepancies: Vec::new(),
            sources_used: Vec::new(),
            mrz_extraction_success: false,
            vlm_extraction_success: false,
            metadata: self.build_metadata(check_id, start, mrz_duration, vlm_duration),
            error: Some(overall_error),
            mrz_error,
            vlm_error,
        }
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}
