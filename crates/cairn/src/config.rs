//! Configuration for the cairn dead-letter mechanism.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::classify::FailureClassifier;
use crate::error::ConfigError;
use crate::kind::{SourceKind, TargetKind};
pub use cairn_core::config::MetricsConfig;

/// Where dead-letter records go.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeadLetterConfig {
    /// Destination URL (supports S3, GCS, local). A trailing file name such
    /// as `deadletter.json` sets the record name stem and extension.
    pub path: String,
    /// Storage options for the destination (credentials, region, etc.).
    #[serde(default)]
    pub storage_options: HashMap<String, String>,
}

/// Worker pool settings for the batch runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    /// Number of concurrent write workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Jobs buffered per worker before dispatch waits.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_workers() -> usize {
    4
}

fn default_channel_capacity() -> usize {
    16
}

/// Main configuration for cairn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Dead-letter destination.
    pub dead_letter: DeadLetterConfig,
    /// Named source adapters and their kind.
    #[serde(default)]
    pub sources: IndexMap<String, String>,
    /// Named target adapters and their kind.
    #[serde(default)]
    pub targets: IndexMap<String, String>,
    #[serde(default)]
    pub runner: RunnerConfig,
    /// Prometheus endpoint, served by `run_pipeline` when enabled.
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Load configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config: Config = cairn_core::config::load_yaml(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = cairn_core::config::parse_yaml(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dead_letter.path.trim().is_empty() {
            return Err(ConfigError::EmptyDeadLetterPath);
        }
        if self.runner.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        for (adapter, name) in &self.sources {
            if SourceKind::from_name(name).is_none() {
                return Err(ConfigError::UnknownAdapterKind {
                    role: "source",
                    adapter: adapter.clone(),
                    name: name.clone(),
                });
            }
        }
        for (adapter, name) in &self.targets {
            if TargetKind::from_name(name).is_none() {
                return Err(ConfigError::UnknownAdapterKind {
                    role: "target",
                    adapter: adapter.clone(),
                    name: name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Build a classifier with every named adapter registered.
    ///
    /// Names that fail to resolve are skipped; `validate` reports them.
    pub fn classifier(&self) -> FailureClassifier {
        let classifier = self
            .sources
            .iter()
            .filter_map(|(adapter, name)| Some((adapter, SourceKind::from_name(name)?)))
            .fold(FailureClassifier::new(), |c, (adapter, kind)| {
                c.with_source(adapter.as_str(), kind)
            });

        self.targets
            .iter()
            .filter_map(|(adapter, name)| Some((adapter, TargetKind::from_name(name)?)))
            .fold(classifier, |c, (adapter, kind)| {
                c.with_target(adapter.as_str(), kind)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
dead_letter:
  path: gs://bucket/run-42/deadletter.json
  storage_options:
    google_service_account: /secrets/sa.json
sources:
  zeroes: text_inline
  warehouse: BIGQUERY
targets:
  oopsie: query
  people: nodes
runner:
  workers: 8
  channel_capacity: 2
metrics:
  enabled: true
  address: 127.0.0.1:9100
"#;

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(FULL).unwrap();

        assert_eq!(config.dead_letter.path, "gs://bucket/run-42/deadletter.json");
        assert_eq!(
            config.dead_letter.storage_options["google_service_account"],
            "/secrets/sa.json"
        );
        assert_eq!(config.runner.workers, 8);
        assert_eq!(config.runner.channel_capacity, 2);
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.address, "127.0.0.1:9100");

        let classifier = config.classifier();
        assert_eq!(
            classifier.classify("zeroes", "oopsie"),
            (SourceKind::TextInline, TargetKind::Query)
        );
        assert_eq!(
            classifier.classify("warehouse", "people"),
            (SourceKind::BigQuery, TargetKind::Node)
        );
    }

    #[test]
    fn test_defaults() {
        let config = Config::parse("dead_letter:\n  path: /tmp/dlq\n").unwrap();
        assert!(config.sources.is_empty());
        assert!(config.dead_letter.storage_options.is_empty());
        assert_eq!(config.runner.workers, 4);
        assert_eq!(config.runner.channel_capacity, 16);
        assert!(!config.metrics.enabled);
        assert_eq!(config.metrics.address, "0.0.0.0:9090");
    }

    #[test]
    fn test_rejects_empty_path() {
        let err = Config::parse("dead_letter:\n  path: \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyDeadLetterPath));
    }

    #[test]
    fn test_rejects_zero_workers() {
        let err = Config::parse("dead_letter:\n  path: /tmp/dlq\nrunner:\n  workers: 0\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoWorkers));
    }

    #[test]
    fn test_rejects_unknown_kind() {
        let err = Config::parse("dead_letter:\n  path: /tmp/dlq\ntargets:\n  t: vertex\n")
            .unwrap_err();
        match err {
            ConfigError::UnknownAdapterKind {
                role,
                adapter,
                name,
            } => {
                assert_eq!(role, "target");
                assert_eq!(adapter, "t");
                assert_eq!(name, "vertex");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let err = Config::parse("dead_letter:\n  path: /tmp/dlq\n  max_failures: 3\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::YamlParse { .. }));
    }

    #[test]
    fn test_interpolates_environment() {
        // SAFETY: test-only variable with a unique name
        unsafe { std::env::set_var("CAIRN_TEST_DLQ_BUCKET", "failures") };
        let config =
            Config::parse("dead_letter:\n  path: gs://${CAIRN_TEST_DLQ_BUCKET}/dlq\n").unwrap();
        assert_eq!(config.dead_letter.path, "gs://failures/dlq");
    }
}
