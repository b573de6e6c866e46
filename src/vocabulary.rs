//! Controlled vocabularies for constrained record fields.
//!
//! A vocabulary is a flat YAML list of allowed strings
//! (`<vocab_dir>/<name>.yml`). Vocabularies load once per run; an
//! unreadable, empty, or malformed vocabulary aborts the run before any
//! record is checked.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, ValidationError};
use crate::record::{Record, RecordType};

/// Allowed-value sets keyed by vocabulary name.
#[derive(Debug)]
pub struct VocabularyRegistry {
    vocabularies: HashMap<String, Vec<String>>,
}

impl VocabularyRegistry {
    /// Load every vocabulary referenced by a record type from `vocab_dir`.
    pub fn load(vocab_dir: &Path) -> Result<Self> {
        let mut vocabularies = HashMap::new();
        for ty in RecordType::ALL {
            if let Some(rule) = ty.vocabulary_rule()
                && !vocabularies.contains_key(rule.vocabulary)
            {
                let values = load_vocabulary(vocab_dir, rule.vocabulary)?;
                vocabularies.insert(rule.vocabulary.to_string(), values);
            }
        }
        Ok(Self { vocabularies })
    }

    /// Allowed values for a vocabulary, in file order.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.vocabularies.get(name).map(Vec::as_slice)
    }

    /// Check a record's controlled field, if its type declares one.
    ///
    /// A missing field is the schema's concern, not a vocabulary
    /// violation.
    pub fn check(&self, ty: RecordType, record: &Record) -> Vec<String> {
        let Some(rule) = ty.vocabulary_rule() else {
            return Vec::new();
        };
        let Some(value) = record.field_str(rule.field) else {
            return Vec::new();
        };
        match self.vocabularies.get(rule.vocabulary) {
            Some(allowed) if allowed.iter().any(|a| a == value) => Vec::new(),
            Some(_) => vec![format!(
                "Invalid {}: '{}' not found in vocabulary",
                rule.field, value
            )],
            None => vec![format!("No vocabulary loaded for field '{}'", rule.field)],
        }
    }
}

fn load_vocabulary(vocab_dir: &Path, name: &str) -> Result<Vec<String>> {
    let path = vocab_dir.join(format!("{name}.yml"));
    let raw = std::fs::read_to_string(&path).map_err(|e| ValidationError::VocabularyLoad {
        name: name.to_string(),
        reason: format!("cannot read {}: {e}", path.display()),
    })?;
    let values: Vec<String> =
        serde_yaml::from_str(&raw).map_err(|e| ValidationError::VocabularyLoad {
            name: name.to_string(),
            reason: format!("not a flat list of strings: {e}"),
        })?;
    if values.is_empty() {
        return Err(ValidationError::VocabularyLoad {
            name: name.to_string(),
            reason: "vocabulary is empty".to_string(),
        });
    }
    Ok(values)
}
