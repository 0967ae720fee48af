//! Configuration for the cross-check service
//!
//! Timeout resolution follows ENV → TOML → compiled default priority; the
//! chosen source is logged. Callers constructing the service can override
//! everything programmatically.

use std::time::Duration;
use tracing::{info, warn};
use veridoc_common::config::TomlConfig;
use veridoc_common::{Error, Result};

/// Default deadline for the local, CPU-bound MRZ read.
pub const DEFAULT_MRZ_TIMEOUT: Duration = Duration::from_secs(30);

/// Default deadline for the network-bound VLM call. Remote inference gets a
/// longer budget than the local OCR pass.
pub const DEFAULT_VLM_TIMEOUT: Duration = Duration::from_secs(60);

const MRZ_TIMEOUT_ENV: &str = "VERIDOC_MRZ_TIMEOUT_SECS";
const VLM_TIMEOUT_ENV: &str = "VERIDOC_VLM_TIMEOUT_SECS";

/// Confidence constants for the scoring scenarios.
///
/// Corroborated agreement scores highest; a single uncontradicted source
/// sits in the middle; a known conflict scores lowest, halved again when the
/// conflicted field is identity-critical.
#[derive(Debug, Clone)]
pub struct ConfidenceConfig {
    /// Both sources agree after normalization
    pub agreement_confidence: f64,

    /// Both sources produced the field but disagree
    pub disagreement_base_confidence: f64,

    /// Extra scaling applied to disagreements on Critical-severity fields
    pub critical_disagreement_factor: f64,

    /// Only the MRZ branch succeeded
    pub single_source_mrz_confidence: f64,

    /// Only the VLM branch succeeded
    pub single_source_vlm_confidence: f64,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            agreement_confidence: 1.0,
            disagreement_base_confidence: 0.4,
            critical_disagreement_factor: 0.5,
            single_source_mrz_confidence: 0.7,
            single_source_vlm_confidence: 0.6,
        }
    }
}

/// Configuration for [`crate::services::CrossCheckService`].
#[derive(Debug, Clone)]
pub struct CrossCheckConfig {
    /// Deadline for the MRZ branch
    pub mrz_timeout: Duration,

    /// Deadline for the VLM branch
    pub vlm_timeout: Duration,

    /// Confidence scoring constants
    pub confidence: ConfidenceConfig,
}

impl Default for CrossCheckConfig {
    fn default() -> Self {
        Self {
            mrz_timeout: DEFAULT_MRZ_TIMEOUT,
            vlm_timeout: DEFAULT_VLM_TIMEOUT,
            confidence: ConfidenceConfig::default(),
        }
    }
}

impl CrossCheckConfig {
    /// Resolve configuration with ENV → TOML → default priority.
    pub fn resolve(toml_config: Option<&TomlConfig>) -> Self {
        let mrz_timeout = resolve_timeout(
            MRZ_TIMEOUT_ENV,
            toml_config.and_then(|c| c.mrz_timeout_seconds),
            DEFAULT_MRZ_TIMEOUT,
            "mrz",
        );
        let vlm_timeout = resolve_timeout(
            VLM_TIMEOUT_ENV,
            toml_config.and_then(|c| c.vlm_timeout_seconds),
            DEFAULT_VLM_TIMEOUT,
            "vlm",
        );

        Self {
            mrz_timeout,
            vlm_timeout,
            confidence: ConfidenceConfig::default(),
        }
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.mrz_timeout.is_zero() {
            return Err(Error::Config("mrz_timeout must be positive".to_string()));
        }
        if self.vlm_timeout.is_zero() {
            return Err(Error::Config("vlm_timeout must be positive".to_string()));
        }
        Ok(())
    }
}

fn resolve_timeout(
    env_var: &str,
    toml_seconds: Option<f64>,
    default: Duration,
    branch: &str,
) -> Duration {
    if let Ok(raw) = std::env::var(env_var) {
        match raw.trim().parse::<f64>() {
            Ok(secs) if secs > 0.0 => {
                info!(branch, secs, "Timeout loaded from environment");
                return Duration::from_secs_f64(secs);
            }
            _ => warn!(branch, value = %raw, "Ignoring unparseable timeout override"),
        }
    }

    if let Some(secs) = toml_seconds {
        if secs > 0.0 {
            info!(branch, secs, "Timeout loaded from TOML config");
            return Duration::from_secs_f64(secs);
        }
        warn!(branch, secs, "Ignoring non-positive TOML timeout");
    }

    default
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let config = CrossCheckConfig::default();
        assert_eq!(config.mrz_timeout, Duration::from_secs(30));
        assert_eq!(config.vlm_timeout, Duration::from_secs(60));
        assert_eq!(config.confidence.agreement_confidence, 1.0);
        assert_eq!(config.confidence.disagreement_base_confidence, 0.4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = CrossCheckConfig {
            mrz_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = CrossCheckConfig {
            vlm_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_resolve_prefers_env_over_toml() {
        std::env::set_var(MRZ_TIMEOUT_ENV, "5");

        let toml = TomlConfig {
            mrz_timeout_seconds: Some(10.0),
            vlm_timeout_seconds: Some(90.0),
            vlm_model: None,
        };
        let config = CrossCheckConfig::resolve(Some(&toml));

        assert_eq!(config.mrz_timeout, Duration::from_secs(5));
        assert_eq!(config.vlm_timeout, Duration::from_secs(90));

        std::env::remove_var(MRZ_TIMEOUT_ENV);
    }

    #[test]
    #[serial]
    fn test_resolve_falls_back_to_defaults() {
        std::env::remove_var(MRZ_TIMEOUT_ENV);
        std::env::remove_var(VLM_TIMEOUT_ENV);

        let config = CrossCheckConfig::resolve(None);
        assert_eq!(config.mrz_timeout, DEFAULT_MRZ_TIMEOUT);
        assert_eq!(config.vlm_timeout, DEFAULT_VLM_TIMEOUT);
    }

    #[test]
    #[serial]
    fn test_resolve_ignores_invalid_env_value() {
        std::env::set_var(VLM_TIMEOUT_ENV, "not-a-number");

        let config = CrossCheckConfig::resolve(None);
        assert_eq!(config.vlm_timeout, DEFAULT_VLM_TIMEOUT);

        std::env::remove_var(VLM_TIMEOUT_ENV);
    }

    #[test]
    #[serial]
    fn test_resolve_ignores_non_positive_toml_value() {
        std::env::remove_var(MRZ_TIMEOUT_ENV);

        let toml = TomlConfig {
            mrz_timeout_seconds: Some(0.0),
            vlm_timeout_seconds: None,
            vlm_model: None,
        };
        let config = CrossCheckConfig::resolve(Some(&toml));
        assert_eq!(config.mrz_timeout, DEFAULT_MRZ_TIMEOUT);
    }
}
