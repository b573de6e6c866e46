//! Application configuration.
//!
//! Defaults, an optional TOML configuration file, and CLI overrides, in
//! that precedence order (CLI wins).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cli::ValidateArgs;
use crate::doi::{DEFAULT_LOOKUP_ENDPOINT, LOOKUP_BATCH_CAPACITY};
use crate::error::ValidationError;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

impl From<ConfigError> for ValidationError {
    fn from(err: ConfigError) -> Self {
        ValidationError::Config(err.to_string())
    }
}

/// Configuration result type alias
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub network: NetworkConfig,
}

/// Corpus layout configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CorpusConfig {
    /// Corpus root directory
    pub root: PathBuf,
    /// Schema directory; defaults to `<root>/schemas`
    pub schema_dir: Option<PathBuf>,
    /// Vocabulary directory; defaults to `<root>/vocabulary`
    pub vocabulary_dir: Option<PathBuf>,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            schema_dir: None,
            vocabulary_dir: None,
        }
    }
}

/// Network configuration for the bulk lookup service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NetworkConfig {
    /// Bulk identifier lookup endpoint
    pub lookup_url: String,
    /// HTTP request timeout in seconds
    pub timeout_seconds: u64,
    /// Total lookup attempts per batch
    pub retry_attempts: u32,
    /// Delay before the second attempt, in milliseconds
    pub retry_delay_ms: u64,
    /// Identifiers per bulk request
    pub batch_size: usize,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            lookup_url: DEFAULT_LOOKUP_ENDPOINT.to_string(),
            timeout_seconds: 30,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            batch_size: LOOKUP_BATCH_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&raw)?;
        Ok(config)
    }

    /// Resolve the effective configuration: file (if given), then CLI
    /// overrides.
    pub fn resolve(args: &ValidateArgs) -> Result<Self> {
        let mut config = match &args.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(args);
        config.validate()?;
        Ok(config)
    }

    fn apply_cli(&mut self, args: &ValidateArgs) {
        if let Some(root) = &args.root {
            self.corpus.root = root.clone();
        }
        if let Some(dir) = &args.schema_dir {
            self.corpus.schema_dir = Some(dir.clone());
        }
        if let Some(dir) = &args.vocab_dir {
            self.corpus.vocabulary_dir = Some(dir.clone());
        }
        if let Some(url) = &args.lookup_url {
            self.network.lookup_url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.network.timeout_seconds = timeout;
        }
        if let Some(attempts) = args.retry_attempts {
            self.network.retry_attempts = attempts;
        }
        if let Some(batch_size) = args.batch_size {
            self.network.batch_size = batch_size;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.network.retry_attempts == 0 {
            return Err(ConfigError::Validation(
                "retry_attempts must be greater than 0".to_string(),
            ));
        }
        if self.network.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if self.network.batch_size == 0 || self.network.batch_size > LOOKUP_BATCH_CAPACITY {
            return Err(ConfigError::Validation(format!(
                "batch_size must be between 1 and {LOOKUP_BATCH_CAPACITY}"
            )));
        }
        Ok(())
    }

    /// Effective schema directory.
    pub fn schema_dir(&self) -> PathBuf {
        self.corpus
            .schema_dir
            .clone()
            .unwrap_or_else(|| self.corpus.root.join("schemas"))
    }

    /// Effective vocabulary directory.
    pub fn vocabulary_dir(&self) -> PathBuf {
        self.corpus
            .vocabulary_dir
            .clone()
            .unwrap_or_else(|| self.corpus.root.join("vocabulary"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::{Cli, Command};

    fn validate_args(argv: &[&str]) -> ValidateArgs {
        let mut full = vec!["validate-claims", "validate"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Command::Validate(args) => args,
            other => panic!("Expected validate subcommand, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.network.batch_size, LOOKUP_BATCH_CAPACITY);
        assert_eq!(config.network.retry_attempts, 3);
        assert_eq!(config.schema_dir(), PathBuf::from("./schemas"));
        assert_eq!(config.vocabulary_dir(), PathBuf::from("./vocabulary"));
    }

    #[test]
    fn test_toml_parsing() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[corpus]
root = "/corpus"
schema_dir = "/contracts/schemas"

[network]
timeout_seconds = 10
batch_size = 100
"#,
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.corpus.root, PathBuf::from("/corpus"));
        assert_eq!(config.schema_dir(), PathBuf::from("/contracts/schemas"));
        assert_eq!(config.vocabulary_dir(), PathBuf::from("/corpus/vocabulary"));
        assert_eq!(config.network.timeout_seconds, 10);
        assert_eq!(config.network.batch_size, 100);
        // Unspecified fields keep their defaults.
        assert_eq!(config.network.retry_attempts, 3);
    }

    #[test]
    fn test_cli_overrides() {
        let args = validate_args(&[
            "--root",
            "/corpus",
            "--timeout",
            "5",
            "--retry-attempts",
            "2",
            "--batch-size",
            "50",
            "--lookup-url",
            "https://lookup.example/batch",
        ]);
        let config = Config::resolve(&args).unwrap();
        assert_eq!(config.corpus.root, PathBuf::from("/corpus"));
        assert_eq!(config.network.timeout_seconds, 5);
        assert_eq!(config.network.retry_attempts, 2);
        assert_eq!(config.network.batch_size, 50);
        assert_eq!(config.network.lookup_url, "https://lookup.example/batch");
    }

    #[test]
    fn test_zero_retries_rejected() {
        let args = validate_args(&["--retry-attempts", "0"]);
        assert!(Config::resolve(&args).is_err());
    }

    #[test]
    fn test_oversized_batch_rejected() {
        let args = validate_args(&["--batch-size", "501"]);
        let err = Config::resolve(&args).unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }
}
