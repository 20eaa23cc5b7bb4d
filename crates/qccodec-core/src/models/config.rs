//! Configuration structures for decoding, encoding and output.

use serde::{Deserialize, Serialize};

use crate::error::{QcError, Result};

/// Main configuration for qccodec.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QcConfig {
    /// Decoding configuration.
    pub decode: DecodeConfig,

    /// Encoding configuration.
    pub encode: EncodeConfig,

    /// Output configuration.
    pub output: OutputConfig,

    /// Batch decoding configuration.
    pub batch: BatchConfig,
}

/// Decoding configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Return the raw collected mapping instead of a validated result.
    pub raw: bool,
}

/// Encoding configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeConfig {
    /// Thread count written to CREST inputs that do not set one.
    /// Defaults to the number of logical CPUs.
    pub threads: Option<usize>,
}

impl EncodeConfig {
    /// Thread count to use when the request does not set one.
    pub fn resolved_threads(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }
}

/// Output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print JSON output.
    pub pretty: bool,

    /// Default output format ("json" or "text").
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            format: "json".to_string(),
        }
    }
}

/// Batch decoding configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of directories decoded concurrently.
    pub jobs: usize,

    /// Name of the stdout file inside each calculation directory.
    pub stdout_name: String,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            jobs: 4,
            stdout_name: "stdout.txt".to_string(),
        }
    }
}

impl QcConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<()> {
        self.validate()?;
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check values that deserialize but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if self.batch.jobs == 0 {
            return Err(QcError::Config("batch.jobs must be at least 1".to_string()));
        }
        if self.batch.stdout_name.trim().is_empty() {
            return Err(QcError::Config("batch.stdout_name must not be empty".to_string()));
        }
        if self.encode.threads == Some(0) {
            return Err(QcError::Config("encode.threads must be at least 1".to_string()));
        }
        if !matches!(self.output.format.to_lowercase().as_str(), "json" | "text") {
            return Err(QcError::Config(format!(
                "output.format must be 'json' or 'text', not '{}'",
                self.output.format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: QcConfig = serde_json::from_str(r#"{"batch": {"jobs": 8}}"#).unwrap();
        assert_eq!(config.batch.jobs, 8);
        assert_eq!(config.batch.stdout_name, "stdout.txt");
        assert_eq!(config.output, OutputConfig::default());
        assert!(!config.decode.raw);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = QcConfig::default();
        config.encode.threads = Some(2);
        config.save(&path).unwrap();
        assert_eq!(QcConfig::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_resolved_threads() {
        let config = EncodeConfig { threads: Some(3) };
        assert_eq!(config.resolved_threads(), 3);
        assert!(EncodeConfig::default().resolved_threads() >= 1);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        std::fs::write(&path, r#"{"batch": {"jobs": 0}}"#).unwrap();
        assert!(matches!(QcConfig::from_file(&path), Err(QcError::Config(_))));

        let mut config = QcConfig::default();
        config.output.format = "yaml".to_string();
        assert!(matches!(config.save(&path), Err(QcError::Config(_))));
    }

    #[test]
    fn test_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(QcConfig::from_file(&path), Err(QcError::Json(_))));
        assert!(matches!(
            QcConfig::from_file(&dir.path().join("missing.json")),
            Err(QcError::Io(_))
        ));
    }
}
