#![allow(dead_code)]

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;

use validate_claims::doi::{BatchVerifier, DoiLookup, RetryPolicy};
use validate_claims::error::{Result, ValidationError};
use validate_claims::record::RecordType;
use validate_claims::schema_registry::SchemaRegistry;
use validate_claims::validator::{EngineConfig, ValidationEngine};
use validate_claims::vocabulary::VocabularyRegistry;

const EFFECTS_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "type": "object",
  "required": ["effect", "kind", "direction", "strength"],
  "properties": {
    "effect": {"type": "string"},
    "kind": {"type": "string", "enum": ["cognitive", "physical", "metabolic"]},
    "direction": {"type": "string", "enum": ["up", "down"]},
    "strength": {"type": "string", "enum": ["weak", "moderate", "strong"]},
    "paper": {"type": "string"},
    "paper_quotes": {"type": "array", "items": {"type": "string"}},
    "dosage": {"type": "object"}
  },
  "additionalProperties": false
}"#;

const BIOMARKERS_SCHEMA: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "type": "object",
  "required": ["biomarker", "kind", "direction", "strength"],
  "properties": {
    "biomarker": {"type": "string"},
    "kind": {"type": "string"},
    "direction": {"type": "string", "enum": ["up", "down"]},
    "strength": {"type": "string", "enum": ["weak", "moderate", "strong"]},
    "paper": {"type": "string"},
    "paper_quotes": {"type": "array", "items": {"type": "string"}},
    "dosage": {"type": "object"}
  },
  "additionalProperties": false
}"#;

const PERMISSIVE_SCHEMA: &str = r#"{"type": "object"}"#;

/// A throwaway corpus with contracts written under `schemas/` and
/// `vocabulary/`, and claim collections under `supplements/`.
pub struct TestCorpus {
    temp: TempDir,
}

impl TestCorpus {
    pub fn new() -> Self {
        let temp = TempDir::new().unwrap();

        let schema_dir = temp.path().join("schemas");
        std::fs::create_dir_all(&schema_dir).unwrap();
        for ty in RecordType::ALL {
            let body = match ty {
                RecordType::Effects => EFFECTS_SCHEMA,
                RecordType::Biomarkers => BIOMARKERS_SCHEMA,
                _ => PERMISSIVE_SCHEMA,
            };
            std::fs::write(
                schema_dir.join(format!("{}.schema.json", ty.schema_name())),
                body,
            )
            .unwrap();
        }

        let vocab_dir = temp.path().join("vocabulary");
        std::fs::create_dir_all(&vocab_dir).unwrap();
        std::fs::write(
            vocab_dir.join("effect.yml"),
            "- focus-increase\n- muscle-strength\n- endurance\n- memory-formation\n",
        )
        .unwrap();
        std::fs::write(
            vocab_dir.join("biomarker.yml"),
            "- testosterone\n- cortisol\n- creatine-phosphate\n",
        )
        .unwrap();

        std::fs::create_dir_all(temp.path().join("supplements")).unwrap();

        Self { temp }
    }

    /// Corpus root holding the collection directories.
    pub fn root(&self) -> PathBuf {
        self.temp.path().join("supplements")
    }

    pub fn schema_dir(&self) -> PathBuf {
        self.temp.path().join("schemas")
    }

    pub fn vocabulary_dir(&self) -> PathBuf {
        self.temp.path().join("vocabulary")
    }

    pub fn write_claim(
        &self,
        collection: &str,
        type_dir: &str,
        file_name: &str,
        yaml: &str,
    ) -> PathBuf {
        let dir = self.root().join(collection).join("claims").join(type_dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(file_name);
        std::fs::write(&path, yaml).unwrap();
        path
    }

    pub fn write_meta(&self, collection: &str, yaml: &str) -> PathBuf {
        let dir = self.root().join(collection);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("meta.yml");
        std::fs::write(&path, yaml).unwrap();
        path
    }
}

/// Lookup transport answering from a fixed not-found set; records every
/// batch it receives.
pub struct MapLookup {
    not_found: HashSet<String>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl MapLookup {
    pub fn all_found() -> Arc<Self> {
        Self::with_not_found(&[])
    }

    pub fn with_not_found(dois: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            not_found: dois.iter().map(|d| d.to_string()).collect(),
            batches: Mutex::new(Vec::new()),
        })
    }

    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

impl DoiLookup for MapLookup {
    async fn lookup_batch(&self, dois: &[String]) -> Result<Vec<bool>> {
        self.batches.lock().unwrap().push(dois.to_vec());
        Ok(dois.iter().map(|d| !self.not_found.contains(d)).collect())
    }
}

/// Lookup transport failing every request with a fixed HTTP status.
pub struct FailingLookup {
    status: u16,
    calls: AtomicUsize,
}

impl FailingLookup {
    pub fn new(status: u16) -> Arc<Self> {
        Arc::new(Self {
            status,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl DoiLookup for FailingLookup {
    async fn lookup_batch(&self, _dois: &[String]) -> Result<Vec<bool>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ValidationError::HttpStatus {
            url: "https://lookup.example/batch".to_string(),
            status: self.status,
        })
    }
}

/// Millisecond-scale delays so retry tests stay fast.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        base_delay: Duration::from_millis(1),
        ..RetryPolicy::default()
    }
}

pub fn build_engine<L: DoiLookup>(
    corpus: &TestCorpus,
    verifier: BatchVerifier<L>,
) -> ValidationEngine<L> {
    let schemas = Arc::new(SchemaRegistry::load(&corpus.schema_dir()).unwrap());
    let vocabularies = Arc::new(VocabularyRegistry::load(&corpus.vocabulary_dir()).unwrap());
    ValidationEngine::new(schemas, vocabularies, verifier, EngineConfig::default())
}
