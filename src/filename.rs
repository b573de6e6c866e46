//! Canonical filename derivation for claim records.
//!
//! Pure functions, no I/O: record content plus record type determine the
//! one filename the content should be stored under. Each type composes an
//! ordered subset of fields, slugified and hyphen-joined. Legitimate
//! duplicate-content files are tolerated through a numeric disambiguation
//! suffix (`-2`, `-3`, ...) before the extension.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::record::{Record, RecordType};

/// Placeholder used when a field named by the composition rule is absent.
const MISSING_FIELD_PLACEHOLDER: &str = "unknown";

/// Extension every claim file is stored under.
const EXTENSION: &str = "yml";

static WHITESPACE_REGEX: OnceLock<Regex> = OnceLock::new();
static INVALID_CHARS_REGEX: OnceLock<Regex> = OnceLock::new();
static HYPHEN_RUN_REGEX: OnceLock<Regex> = OnceLock::new();

fn whitespace_regex() -> &'static Regex {
    WHITESPACE_REGEX.get_or_init(|| Regex::new(r"\s+").expect("Failed to compile whitespace regex"))
}

fn invalid_chars_regex() -> &'static Regex {
    INVALID_CHARS_REGEX
        .get_or_init(|| Regex::new(r"[^a-z0-9-]").expect("Failed to compile invalid-chars regex"))
}

fn hyphen_run_regex() -> &'static Regex {
    HYPHEN_RUN_REGEX.get_or_init(|| Regex::new(r"-{2,}").expect("Failed to compile hyphen-run regex"))
}

/// Ordered field subset composing the canonical filename for a type.
fn filename_fields(ty: RecordType) -> &'static [&'static str] {
    match ty {
        RecordType::Effects => &["kind", "effect", "direction", "strength"],
        RecordType::Biomarkers => &["kind", "biomarker", "direction", "strength"],
        RecordType::Cycles => &["kind", "duration_weeks"],
        RecordType::Interactions => &["substance", "direction"],
        RecordType::Formulations => &["form"],
        RecordType::Toxicity => &["kind", "severity"],
        RecordType::Synergies => &["with", "effect"],
        RecordType::AddictionWithdrawal => &["kind", "symptom"],
        RecordType::Meta => &[],
    }
}

/// Normalize free text into a filename-safe slug: lowercase, whitespace to
/// hyphens, strip everything outside `[a-z0-9-]`, collapse hyphen runs,
/// trim leading and trailing hyphens.
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase();
    let hyphenated = whitespace_regex().replace_all(&lowered, "-");
    let stripped = invalid_chars_regex().replace_all(&hyphenated, "");
    let collapsed = hyphen_run_regex().replace_all(&stripped, "-");
    collapsed.trim_matches('-').to_string()
}

fn field_slug(record: &Record, field: &str) -> String {
    let slug = match record.field(field) {
        Some(Value::String(s)) => slugify(s),
        Some(Value::Number(n)) => slugify(&n.to_string()),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    };
    if slug.is_empty() {
        MISSING_FIELD_PLACEHOLDER.to_string()
    } else {
        slug
    }
}

/// The canonical filename (with extension) for a record of the given type.
pub fn canonical_filename(ty: RecordType, record: &Record) -> String {
    if ty == RecordType::Meta {
        return format!("meta.{EXTENSION}");
    }
    let parts: Vec<String> = filename_fields(ty)
        .iter()
        .map(|field| field_slug(record, field))
        .collect();
    format!("{}.{}", parts.join("-"), EXTENSION)
}

/// Whether an actual filename matches the canonical one, allowing the
/// numeric disambiguation suffix `-2`, `-3`, ... before the extension.
pub fn matches_canonical(actual: &str, canonical: &str) -> bool {
    let extension = format!(".{EXTENSION}");
    let Some(stem) = canonical.strip_suffix(&extension) else {
        return actual == canonical;
    };
    let Some(actual_stem) = actual.strip_suffix(&extension) else {
        return false;
    };
    if actual_stem == stem {
        return true;
    }
    match actual_stem
        .strip_prefix(stem)
        .and_then(|rest| rest.strip_prefix('-'))
    {
        Some(digits) => digits.parse::<u32>().map(|n| n >= 2).unwrap_or(false),
        None => false,
    }
}

/// Check a record file's name against its canonical derivation. Mismatch
/// reports both names so a human can rename or fix content.
pub fn check(ty: RecordType, path: &Path, record: &Record) -> Vec<String> {
    let expected = canonical_filename(ty, record);
    let actual = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    if matches_canonical(actual, &expected) {
        Vec::new()
    } else {
        vec![format!("Filename mismatch: '{actual}' should be '{expected}'")]
    }
}
