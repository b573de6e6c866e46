//! Claim records and their type tags.
//!
//! A record is the loosely-typed content of one YAML file. Its type is
//! derived from where the file sits in the corpus
//! (`<collection>/claims/<type>/<file>.yml` or `<collection>/meta.yml`),
//! never from the content itself. The type selects the schema, the
//! filename rule, and the vocabulary rule that apply.

use std::fmt;
use std::path::Path;

use serde_json::Value;

/// Category of a claim record, derived from its location in the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    Effects,
    Biomarkers,
    Cycles,
    Interactions,
    Formulations,
    Toxicity,
    Synergies,
    AddictionWithdrawal,
    /// Collection-level metadata (`<collection>/meta.yml`).
    Meta,
}

/// A controlled field constrained to a named vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VocabularyRule {
    /// Record field holding the constrained value.
    pub field: &'static str,
    /// Name of the vocabulary the value must belong to.
    pub vocabulary: &'static str,
}

impl RecordType {
    /// Every record type, claim types first.
    pub const ALL: [RecordType; 9] = [
        RecordType::Effects,
        RecordType::Biomarkers,
        RecordType::Cycles,
        RecordType::Interactions,
        RecordType::Formulations,
        RecordType::Toxicity,
        RecordType::Synergies,
        RecordType::AddictionWithdrawal,
        RecordType::Meta,
    ];

    /// The claim types stored under `<collection>/claims/<dir>/`.
    pub const CLAIMS: [RecordType; 8] = [
        RecordType::Effects,
        RecordType::Biomarkers,
        RecordType::Cycles,
        RecordType::Interactions,
        RecordType::Formulations,
        RecordType::Toxicity,
        RecordType::Synergies,
        RecordType::AddictionWithdrawal,
    ];

    /// Directory name under `claims/` for claim types, `meta` otherwise.
    pub fn dir_name(&self) -> &'static str {
        match self {
            RecordType::Effects => "effects",
            RecordType::Biomarkers => "biomarkers",
            RecordType::Cycles => "cycles",
            RecordType::Interactions => "interactions",
            RecordType::Formulations => "formulations",
            RecordType::Toxicity => "toxicity",
            RecordType::Synergies => "synergies",
            RecordType::AddictionWithdrawal => "addiction-withdrawal",
            RecordType::Meta => "meta",
        }
    }

    /// Stem of the schema document for this type: `<stem>.schema.json`.
    pub fn schema_name(&self) -> &'static str {
        self.dir_name()
    }

    fn from_dir_name(dir: &str) -> Option<Self> {
        Self::CLAIMS.into_iter().find(|ty| ty.dir_name() == dir)
    }

    /// Derive the record type from a file path.
    ///
    /// Recognizes `.../claims/<type>/<file>.yml` and `.../meta.yml`.
    /// Returns `None` for anything else.
    pub fn from_path(path: &Path) -> Option<Self> {
        let file_name = path.file_name()?.to_str()?;
        if file_name == "meta.yml" || file_name == "meta.yaml" {
            return Some(RecordType::Meta);
        }

        let mut components = path
            .components()
            .rev()
            .map(|c| c.as_os_str().to_str().unwrap_or(""));
        let _file = components.next()?;
        let type_dir = components.next()?;
        if components.next()? != "claims" {
            return None;
        }
        Self::from_dir_name(type_dir)
    }

    /// The controlled-field rule for this type, if it declares one.
    pub fn vocabulary_rule(&self) -> Option<VocabularyRule> {
        match self {
            RecordType::Effects => Some(VocabularyRule {
                field: "effect",
                vocabulary: "effect",
            }),
            RecordType::Biomarkers => Some(VocabularyRule {
                field: "biomarker",
                vocabulary: "biomarker",
            }),
            _ => None,
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Why a file's content could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    Empty,
    Yaml(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Empty => f.write_str("File is empty"),
            ParseError::Yaml(details) => write!(f, "Parse error: {details}"),
        }
    }
}

/// One claim record: the loosely-typed content of a single YAML file.
///
/// Content is held as a JSON value so the schema check can consume it
/// directly; YAML is converted on parse.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    value: Value,
}

impl Record {
    /// Parse a record from raw YAML text.
    pub fn parse(raw: &str) -> std::result::Result<Self, ParseError> {
        if raw.trim().is_empty() {
            return Err(ParseError::Empty);
        }
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(raw).map_err(|e| ParseError::Yaml(e.to_string()))?;
        let value = yaml_to_json_value(&yaml).map_err(ParseError::Yaml)?;
        Ok(Self { value })
    }

    /// Build a record from an already-parsed JSON value.
    pub fn from_value(value: Value) -> Self {
        Self { value }
    }

    /// The record content for schema checking.
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.value.get(name)
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(Value::as_str)
    }

    /// The DOI referenced by the record's optional `paper` field.
    pub fn doi(&self) -> Option<&str> {
        self.field_str("paper")
    }
}

/// Convert a `serde_yaml::Value` to a `serde_json::Value`.
///
/// Claim files use only the JSON-compatible subset of YAML; tags are
/// ignored and the inner value converted.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> std::result::Result<Value, String> {
    match yaml {
        serde_yaml::Value::Null => Ok(Value::Null),
        serde_yaml::Value::Bool(b) => Ok(Value::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Value::Number(serde_json::Number::from(i)))
            } else if let Some(u) = n.as_u64() {
                Ok(Value::Number(serde_json::Number::from(u)))
            } else if let Some(f) = n.as_f64() {
                serde_json::Number::from_f64(f)
                    .map(Value::Number)
                    .ok_or_else(|| format!("cannot represent float {f} in JSON"))
            } else {
                Err(format!("unsupported YAML number: {n:?}"))
            }
        }
        serde_yaml::Value::String(s) => Ok(Value::String(s.clone())),
        serde_yaml::Value::Sequence(seq) => {
            let items: std::result::Result<Vec<Value>, String> =
                seq.iter().map(yaml_to_json_value).collect();
            Ok(Value::Array(items?))
        }
        serde_yaml::Value::Mapping(map) => {
            let mut json_map = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    other => return Err(format!("unsupported YAML map key type: {other:?}")),
                };
                json_map.insert(key, yaml_to_json_value(v)?);
            }
            Ok(Value::Object(json_map))
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json_value(&tagged.value),
    }
}
