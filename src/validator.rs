//! Validation pipeline orchestration.
//!
//! A run moves through fixed phases: determine targets, parse every file
//! once, resolve all referenced identifiers in batches, then validate
//! each parsed record against its schema, vocabulary, filename rule, and
//! the precomputed verification cache. Identifier resolution completes in
//! full before any record check runs, so per-record validation is a pure
//! cache read. A record's outcome depends only on its own content and the
//! loaded contracts, never on sibling records.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::try_join_all;
use serde::Serialize;
use tracing::info;

use crate::discovery::CorpusDiscovery;
use crate::doi::{BatchVerifier, DoiLookup, VerificationCache};
use crate::error::{Result, ValidationError};
use crate::filename;
use crate::record::{Record, RecordType};
use crate::schema_registry::SchemaRegistry;
use crate::vocabulary::VocabularyRegistry;

/// How the target file set is determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Enumerate the entire corpus.
    Full,
    /// Validate exactly the caller-supplied files.
    Selective(Vec<PathBuf>),
}

/// Every violation found in one file, in check order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub messages: Vec<String>,
}

/// Aggregate outcome of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub total_files: usize,
    pub valid_files: usize,
    /// Distinct identifiers that went through the resolution phase.
    pub identifiers_resolved: usize,
    /// Failures sorted by path, independent of completion order.
    pub failures: Vec<FileFailure>,
    pub total_duration: Duration,
}

impl RunReport {
    /// A run succeeds only when no file accumulated any message.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Bound on concurrently processed files.
    pub max_concurrent_files: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_files: num_cpus::get(),
        }
    }
}

enum ParseOutcome {
    Parsed(Record),
    /// Unreadable, empty, or unparsable: the file's sole failure.
    Terminal(String),
}

struct TargetFile {
    path: PathBuf,
    record_type: Option<RecordType>,
    outcome: ParseOutcome,
}

/// Coordinates the registries, the batch verifier, and per-file checks.
pub struct ValidationEngine<L: DoiLookup> {
    schemas: Arc<SchemaRegistry>,
    vocabularies: Arc<VocabularyRegistry>,
    verifier: BatchVerifier<L>,
    config: EngineConfig,
}

impl<L: DoiLookup> ValidationEngine<L> {
    pub fn new(
        schemas: Arc<SchemaRegistry>,
        vocabularies: Arc<VocabularyRegistry>,
        verifier: BatchVerifier<L>,
        config: EngineConfig,
    ) -> Self {
        Self {
            schemas,
            vocabularies,
            verifier,
            config,
        }
    }

    /// Execute a full validation run over the target set.
    pub async fn run(&self, mode: RunMode, discovery: &CorpusDiscovery) -> Result<RunReport> {
        let run_start = Instant::now();

        let files = match mode {
            RunMode::Full => discovery.discover().await?,
            RunMode::Selective(mut list) => {
                list.sort();
                list.dedup();
                list
            }
        };
        info!(files = files.len(), "validation targets determined");

        let targets = self.parse_targets(files).await?;

        let mut dois = BTreeSet::new();
        for target in &targets {
            if let ParseOutcome::Parsed(record) = &target.outcome
                && let Some(doi) = record.doi()
            {
                dois.insert(doi.to_string());
            }
        }
        let cache = self.verifier.resolve(&dois).await;
        info!(identifiers = cache.len(), "identifier resolution complete");

        let total_files = targets.len();
        let mut failures = Vec::new();
        for target in targets {
            let messages = match target.outcome {
                ParseOutcome::Terminal(message) => vec![message],
                ParseOutcome::Parsed(record) => match target.record_type {
                    Some(ty) => self.validate_record(ty, &target.path, &record, &cache),
                    None => vec![
                        "Unrecognized record path: expected \
                         <collection>/claims/<type>/<file>.yml or <collection>/meta.yml"
                            .to_string(),
                    ],
                },
            };
            if !messages.is_empty() {
                failures.push(FileFailure {
                    path: target.path,
                    messages,
                });
            }
        }
        failures.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(RunReport {
            total_files,
            valid_files: total_files - failures.len(),
            identifiers_resolved: cache.len(),
            failures,
            total_duration: run_start.elapsed(),
        })
    }

    /// Read and parse every target concurrently, bounded by the
    /// configured limit. Input order is preserved regardless of
    /// completion order, and one file's failure never aborts siblings.
    async fn parse_targets(&self, files: Vec<PathBuf>) -> Result<Vec<TargetFile>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let semaphore = Arc::new(tokio::sync::Semaphore::new(self.config.max_concurrent_files));
        let tasks: Vec<_> = files
            .into_iter()
            .map(|path| {
                let semaphore = Arc::clone(&semaphore);
                tokio::spawn(async move {
                    let _permit = semaphore.acquire().await.map_err(|_| {
                        ValidationError::Concurrency {
                            details: "failed to acquire parse semaphore".to_string(),
                        }
                    })?;
                    Ok::<TargetFile, ValidationError>(parse_one(path).await)
                })
            })
            .collect();

        let joined = try_join_all(tasks)
            .await
            .map_err(|e| ValidationError::Concurrency {
                details: format!("task join error: {e}"),
            })?;

        let mut targets = Vec::with_capacity(joined.len());
        for result in joined {
            targets.push(result?);
        }
        Ok(targets)
    }

    /// All checks for one record, accumulating rather than
    /// short-circuiting. The cache is the sole identifier authority: no
    /// entry means the resolution phase never saw this identifier, which
    /// fails closed.
    fn validate_record(
        &self,
        ty: RecordType,
        path: &std::path::Path,
        record: &Record,
        cache: &VerificationCache,
    ) -> Vec<String> {
        let mut messages = self.schemas.check(ty, record);
        messages.extend(self.vocabularies.check(ty, record));
        messages.extend(filename::check(ty, path, record));

        if let Some(doi) = record.doi() {
            match cache.get(doi) {
                Some(true) => {}
                Some(false) => messages.push(format!("Unverified DOI: '{doi}'")),
                None => messages.push(format!("Unverified DOI: '{doi}' (never resolved)")),
            }
        }
        messages
    }
}

async fn parse_one(path: PathBuf) -> TargetFile {
    let record_type = RecordType::from_path(&path);
    let outcome = match tokio::fs::read_to_string(&path).await {
        Err(e) => ParseOutcome::Terminal(format!("Unreadable file: {e}")),
        Ok(raw) => match Record::parse(&raw) {
            Ok(record) => ParseOutcome::Parsed(record),
            Err(e) => ParseOutcome::Terminal(e.to_string()),
        },
    };
    TargetFile {
        path,
        record_type,
        outcome,
    }
}
