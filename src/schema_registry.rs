//! Structural contracts, compiled once per run.
//!
//! Each record type has one JSON Schema document
//! (`<schema_dir>/<type>.schema.json`). All of them are loaded and
//! compiled at startup; a missing or corrupt document is fatal because
//! the run cannot proceed without its contract. Checking a record never
//! fails for well-formed-but-invalid input - it yields messages, one per
//! violation.

use std::collections::HashMap;
use std::path::Path;

use jsonschema::Validator;
use serde_json::Value;

use crate::error::{Result, ValidationError};
use crate::record::{Record, RecordType};

/// Compiled structural validators, one per record type.
#[derive(Debug)]
pub struct SchemaRegistry {
    validators: HashMap<RecordType, Validator>,
}

impl SchemaRegistry {
    /// Load and compile `<type>.schema.json` for every record type.
    pub fn load(schema_dir: &Path) -> Result<Self> {
        let mut validators = HashMap::new();
        for ty in RecordType::ALL {
            let path = schema_dir.join(format!("{}.schema.json", ty.schema_name()));
            let raw =
                std::fs::read_to_string(&path).map_err(|e| ValidationError::SchemaLoad {
                    path: path.clone(),
                    reason: format!("cannot read schema: {e}"),
                })?;
            let value: Value =
                serde_json::from_str(&raw).map_err(|e| ValidationError::SchemaLoad {
                    path: path.clone(),
                    reason: format!("invalid JSON: {e}"),
                })?;
            let validator = compile(&value).map_err(|reason| ValidationError::SchemaLoad {
                path: path.clone(),
                reason,
            })?;
            validators.insert(ty, validator);
        }
        Ok(Self { validators })
    }

    /// Number of compiled schemas.
    pub fn schema_count(&self) -> usize {
        self.validators.len()
    }

    /// Check a record against its type's schema, collecting every
    /// violation. An empty list means the record is structurally valid.
    pub fn check(&self, ty: RecordType, record: &Record) -> Vec<String> {
        let Some(validator) = self.validators.get(&ty) else {
            return vec![format!("No schema compiled for record type '{ty}'")];
        };
        validator
            .iter_errors(record.as_value())
            .map(|e| {
                let instance_path = e.instance_path.to_string();
                if instance_path.is_empty() {
                    e.to_string()
                } else {
                    format!("{instance_path}: {e}")
                }
            })
            .collect()
    }
}

fn compile(schema: &Value) -> std::result::Result<Validator, String> {
    let mut options = jsonschema::options();
    options.with_draft(jsonschema::Draft::Draft202012);
    options.build(schema).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_schemas(dir: &Path, effects_schema: &str) {
        for ty in RecordType::ALL {
            let body = if ty == RecordType::Effects {
                effects_schema.to_string()
            } else {
                r#"{"type": "object"}"#.to_string()
            };
            std::fs::write(dir.join(format!("{}.schema.json", ty.schema_name())), body).unwrap();
        }
    }

    const EFFECTS_SCHEMA: &str = r#"{
        "type": "object",
        "required": ["effect", "kind"],
        "properties": {
            "effect": {"type": "string"},
            "kind": {"type": "string", "enum": ["cognitive", "physical"]}
        }
    }"#;

    #[test]
    fn test_valid_record_produces_no_messages() {
        let dir = TempDir::new().unwrap();
        write_schemas(dir.path(), EFFECTS_SCHEMA);
        let registry = SchemaRegistry::load(dir.path()).unwrap();
        assert_eq!(registry.schema_count(), RecordType::ALL.len());

        let record = Record::parse("effect: focus-increase\nkind: cognitive\n").unwrap();
        assert!(registry.check(RecordType::Effects, &record).is_empty());
    }

    #[test]
    fn test_all_violations_collected() {
        let dir = TempDir::new().unwrap();
        write_schemas(dir.path(), EFFECTS_SCHEMA);
        let registry = SchemaRegistry::load(dir.path()).unwrap();

        // Missing "effect" and an invalid "kind": both must be reported.
        let record = Record::parse("kind: spiritual\n").unwrap();
        let messages = registry.check(RecordType::Effects, &record);
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().any(|m| m.contains("effect")));
        assert!(messages.iter().any(|m| m.contains("kind")));
    }

    #[test]
    fn test_missing_schema_is_fatal() {
        let dir = TempDir::new().unwrap();
        let err = SchemaRegistry::load(dir.path()).unwrap_err();
        assert!(matches!(err, ValidationError::SchemaLoad { .. }));
    }

    #[test]
    fn test_corrupt_schema_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_schemas(dir.path(), EFFECTS_SCHEMA);
        std::fs::write(dir.path().join("cycles.schema.json"), "not json").unwrap();

        let err = SchemaRegistry::load(dir.path()).unwrap_err();
        match err {
            ValidationError::SchemaLoad { path, reason } => {
                assert!(path.ends_with("cycles.schema.json"));
                assert!(reason.contains("invalid JSON"));
            }
            other => panic!("Expected SchemaLoad, got {other}"),
        }
    }
}
