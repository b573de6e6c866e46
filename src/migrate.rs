//! One-time migration of legacy dosage fields.
//!
//! Rewrites `dosage_min`/`dosage_max`/`dosage_unit` into the structured
//! `dosage: {unit, value | min + max}` shape. The default unit comes from
//! the collection's `meta.yml`. This is a standalone maintenance command,
//! not part of the validation engine.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use tokio::fs;
use tracing::warn;

use crate::discovery::CorpusDiscovery;
use crate::error::{Result, ValidationError};
use crate::record::RecordType;

/// Canonical unit for each accepted spelling.
fn normalize_unit(unit: &str) -> Option<&'static str> {
    match unit.to_lowercase().as_str() {
        "mg" | "milligram" | "milligrams" => Some("milligram"),
        "g" | "gram" | "grams" => Some("gram"),
        "kg" | "kilogram" | "kilograms" => Some("kilogram"),
        "mcg" | "microgram" | "micrograms" | "μg" => Some("microgram"),
        "iu" => Some("IU"),
        "mg/kg" => Some("mg/kg"),
        "g/kg" => Some("g/kg"),
        _ => None,
    }
}

/// Per-run migration accounting.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationStats {
    pub total_files: usize,
    pub migrated_files: usize,
    pub skipped_files: usize,
    pub error_files: Vec<PathBuf>,
}

#[derive(Debug, PartialEq, Eq)]
enum FileOutcome {
    Migrated,
    Skipped,
}

/// Dosage-format migration over a corpus or an explicit file list.
pub struct DosageMigration {
    discovery: CorpusDiscovery,
}

impl DosageMigration {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            discovery: CorpusDiscovery::new(root),
        }
    }

    /// Migrate an explicit file list, or every claim file in the corpus.
    /// Individual file errors are recorded in the stats; they never abort
    /// the rest of the migration.
    pub async fn run(&self, files: Option<Vec<PathBuf>>) -> Result<MigrationStats> {
        let targets: Vec<PathBuf> = match files {
            Some(list) if !list.is_empty() => list,
            _ => self
                .discovery
                .discover()
                .await?
                .into_iter()
                .filter(|p| RecordType::from_path(p).is_some_and(|ty| ty != RecordType::Meta))
                .collect(),
        };

        // Group by collection so each meta.yml is read once.
        let mut by_collection: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
        for path in targets {
            by_collection
                .entry(collection_dir(&path))
                .or_default()
                .push(path);
        }

        let mut stats = MigrationStats::default();
        for (collection, files) in by_collection {
            let default_unit = self.default_unit_for(&collection).await;
            for path in files {
                stats.total_files += 1;
                match migrate_file(&path, &default_unit).await {
                    Ok(FileOutcome::Migrated) => stats.migrated_files += 1,
                    Ok(FileOutcome::Skipped) => stats.skipped_files += 1,
                    Err(error) => {
                        warn!("migration failed for {}: {error}", path.display());
                        stats.error_files.push(path);
                    }
                }
            }
        }
        Ok(stats)
    }

    /// Default dosage unit from the collection's `meta.yml`, falling back
    /// to milligram when the file is missing or unreadable.
    async fn default_unit_for(&self, collection: &Path) -> String {
        let meta_path = collection.join("meta.yml");
        match fs::read_to_string(&meta_path).await {
            Ok(raw) => serde_yaml::from_str::<Value>(&raw)
                .ok()
                .and_then(|meta| {
                    meta.get("dosage_unit")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or_else(|| "milligram".to_string()),
            Err(_) => {
                warn!(
                    "no readable meta.yml under {}, defaulting to milligram",
                    collection.display()
                );
                "milligram".to_string()
            }
        }
    }
}

/// `<collection>/claims/<type>/<file>` -> `<collection>`
fn collection_dir(path: &Path) -> PathBuf {
    path.ancestors()
        .nth(3)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

async fn migrate_file(path: &Path, default_unit: &str) -> Result<FileOutcome> {
    let raw = fs::read_to_string(path).await?;
    let mut doc: Value =
        serde_yaml::from_str(&raw).map_err(|e| ValidationError::Migration {
            path: path.to_path_buf(),
            reason: format!("invalid YAML: {e}"),
        })?;
    let Some(mapping) = doc.as_mapping_mut() else {
        return Err(ValidationError::Migration {
            path: path.to_path_buf(),
            reason: "record is not a mapping".to_string(),
        });
    };

    match migrate_mapping(mapping, default_unit) {
        Ok(true) => {
            let rendered =
                serde_yaml::to_string(&doc).map_err(|e| ValidationError::Migration {
                    path: path.to_path_buf(),
                    reason: format!("cannot render YAML: {e}"),
                })?;
            fs::write(path, rendered).await?;
            Ok(FileOutcome::Migrated)
        }
        Ok(false) => Ok(FileOutcome::Skipped),
        Err(reason) => Err(ValidationError::Migration {
            path: path.to_path_buf(),
            reason,
        }),
    }
}

/// Pure transform of one record mapping. Returns whether it changed.
fn migrate_mapping(
    mapping: &mut Mapping,
    default_unit: &str,
) -> std::result::Result<bool, String> {
    let min_key = Value::from("dosage_min");
    let max_key = Value::from("dosage_max");

    let has_min = mapping.contains_key(&min_key);
    let has_max = mapping.contains_key(&max_key);
    if !has_min && !has_max {
        return Ok(false);
    }
    if mapping
        .get(Value::from("dosage"))
        .is_some_and(Value::is_mapping)
    {
        warn!("record already has the structured dosage shape, skipping");
        return Ok(false);
    }

    let unit_raw = match mapping.remove(Value::from("dosage_unit")) {
        Some(Value::String(s)) => s,
        Some(other) => return Err(format!("unexpected dosage_unit value: {other:?}")),
        None => default_unit.to_string(),
    };
    let unit = normalize_unit(&unit_raw).ok_or_else(|| format!("unknown unit: {unit_raw}"))?;

    let min = mapping.remove(&min_key);
    let max = mapping.remove(&max_key);

    let mut dosage = Mapping::new();
    dosage.insert(Value::from("unit"), Value::from(unit));
    match (min, max) {
        (Some(min), Some(max)) if min == max => {
            dosage.insert(Value::from("value"), min);
        }
        (Some(min), Some(max)) => {
            dosage.insert(Value::from("min"), min);
            dosage.insert(Value::from("max"), max);
        }
        (Some(only), None) | (None, Some(only)) => {
            dosage.insert(Value::from("value"), only);
        }
        (None, None) => return Ok(false),
    }
    mapping.insert(Value::from("dosage"), Value::Mapping(dosage));
    Ok(true)
}
