//! Configuration loading for veridoc modules
//!
//! TOML configuration is optional everywhere: a missing or unparseable file
//! logs a warning and yields defaults, never a startup failure.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Schema of a veridoc module's TOML config file.
///
/// All fields are optional; absent keys fall through to compiled defaults or
/// environment overrides at the consuming module's resolution step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Override for the MRZ branch timeout, in seconds
    pub mrz_timeout_seconds: Option<f64>,

    /// Override for the VLM branch timeout, in seconds
    pub vlm_timeout_seconds: Option<f64>,

    /// Identifying name of the VLM deployment
    pub vlm_model: Option<String>,
}

/// Platform config file path for a module: `<config dir>/veridoc/<module>.toml`
pub fn config_file_path(module_name: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("veridoc").join(format!("{}.toml", module_name)))
}

/// Load a module's TOML config, degrading to defaults when absent or invalid.
pub fn load_toml_config(module_name: &str) -> TomlConfig {
    match config_file_path(module_name) {
        Some(path) if path.exists() => load_toml_config_from(&path).unwrap_or_else(|e| {
            warn!(module = module_name, error = %e, "Config file unusable, using defaults");
            TomlConfig::default()
        }),
        _ => TomlConfig::default(),
    }
}

/// Load a TOML config from an explicit path.
pub fn load_toml_config_from(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_path_includes_module_name() {
        if let Some(path) = config_file_path("veridoc-cc") {
            let path_str = path.to_string_lossy();
            assert!(path_str.contains("veridoc"));
            assert!(path_str.ends_with("veridoc-cc.toml"));
        }
    }

    #[test]
    fn test_load_missing_module_config_uses_defaults() {
        let config = load_toml_config("nonexistent-test-module-57261");
        assert_eq!(config, TomlConfig::default());
    }
}
