//! # validate-claims Library
//!
//! Batch validation of supplement-claim corpora: per-type JSON Schema
//! checking, controlled vocabularies, filename conventions, and batched,
//! cached verification of citation DOIs against a bulk lookup service.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod doi;
pub mod error;
pub mod filename;
pub mod migrate;
pub mod output;
pub mod record;
pub mod schema_registry;
pub mod validator;
pub mod vocabulary;

pub use cli::{Cli, Command, ListArgs, MigrateArgs, ValidateArgs, VerbosityLevel};
pub use config::{Config, ConfigError, CorpusConfig, NetworkConfig};
pub use discovery::CorpusDiscovery;
pub use doi::{
    BatchVerifier, DoiLookup, HttpDoiLookup, LookupConfig, RetryPolicy, VerificationCache,
    attempt_with_policy, DEFAULT_LOOKUP_ENDPOINT, LOOKUP_BATCH_CAPACITY,
};
pub use error::ValidationError;
pub use filename::{canonical_filename, matches_canonical, slugify};
pub use migrate::{DosageMigration, MigrationStats};
pub use output::Output;
pub use record::{ParseError, Record, RecordType, VocabularyRule};
pub use schema_registry::SchemaRegistry;
pub use validator::{EngineConfig, FileFailure, RunMode, RunReport, ValidationEngine};
pub use vocabulary::VocabularyRegistry;
