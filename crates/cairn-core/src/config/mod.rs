//! Common configuration types and YAML loading.

mod vars;

pub use vars::{InterpolationResult, interpolate};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::path::Path;

use crate::error::{ConfigError, EnvInterpolationSnafu, ReadFileSnafu, YamlParseSnafu};
use crate::metrics::DEFAULT_METRICS_ADDR;

/// Metrics configuration for Prometheus endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Whether to serve the Prometheus endpoint (default: false).
    #[serde(default)]
    pub enabled: bool,
    /// Address to bind the metrics HTTP server (default: "0.0.0.0:9090").
    #[serde(default = "default_metrics_address")]
    pub address: String,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            address: default_metrics_address(),
        }
    }
}

fn default_metrics_address() -> String {
    DEFAULT_METRICS_ADDR.to_string()
}

/// Parse YAML text after interpolating environment variables.
pub fn parse_yaml<T: DeserializeOwned>(contents: &str) -> Result<T, ConfigError> {
    let result = interpolate(contents);
    if !result.is_ok() {
        return EnvInterpolationSnafu {
            message: result.errors.join("\n"),
        }
        .fail();
    }

    serde_yaml::from_str(&result.text).context(YamlParseSnafu)
}

/// Read a YAML file from disk, interpolate environment variables, and parse it.
pub fn load_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;
    parse_yaml(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_metrics_config_default_address() {
        let config: MetricsConfig = serde_yaml::from_str("{}").unwrap();
        assert!(!config.enabled);
        assert_eq!(config.address, "0.0.0.0:9090");
    }

    #[test]
    fn test_parse_yaml_escapes_dollar() {
        let parsed: HashMap<String, String> = parse_yaml("query: \"RETURN $$rows\"").unwrap();
        assert_eq!(parsed["query"], "RETURN $rows");
    }

    #[test]
    fn test_parse_yaml_reports_missing_variable() {
        let err = parse_yaml::<HashMap<String, String>>("path: ${CAIRN_TEST_NEVER_SET_VAR}")
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvInterpolation { .. }));
        assert!(err.to_string().contains("CAIRN_TEST_NEVER_SET_VAR"));
    }

    #[test]
    fn test_load_yaml_missing_file() {
        let err = load_yaml::<MetricsConfig>(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
