//! Validation and routing (spec §4.5).
//!
//! Checks a document against a [`Schema`]'s holographic patterns and builds
//! the routing table that `→§TARGET` flows resolve to. Hashing follows the
//! reference toolchain's content-addressed routing (see `core/routing.py` in
//! the original implementation): every routed value is digested with
//! SHA-256 so two documents that route the same value to the same target
//! produce identical routing entries regardless of surrounding whitespace.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use crate::octave::ast::{Document, Section, Value};
use crate::octave::schema::{self, Schema, UnknownFieldsPolicy};

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub code: &'static str,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} on field '{}': {}", self.code, self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq)]
pub struct RoutingEntry {
    pub field: String,
    pub target: String,
    pub value_hash: String,
    pub sealed_at: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub routing: Vec<RoutingEntry>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// SHA-256 digest of a value's canonical operand text, hex-encoded. Shared
/// between the validator's routing table and the sealer's document digest so
/// both compute hashes the same way.
pub fn compute_value_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::Scalar(s) => Some(s.clone()),
        Value::Number(s) => Some(s.clone()),
        Value::Flow(s) => Some(s.clone()),
        Value::Null => Some("null".to_string()),
        _ => None,
    }
}

static TYPE_INT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[0-9]+$").unwrap());
static TYPE_FLOAT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?[0-9]+\.[0-9]+$").unwrap());

fn check_type(type_name: &str, text: &str) -> bool {
    match type_name {
        "int" | "integer" => TYPE_INT.is_match(text),
        "float" | "number" => TYPE_FLOAT.is_match(text) || TYPE_INT.is_match(text),
        "bool" | "boolean" => text == "true" || text == "false",
        "string" => true,
        _ => true,
    }
}

/// Validates `doc` against `schema`, producing constraint errors and the
/// routing table for every field whose holographic pattern named a `§TARGET`.
/// `sealed_at` is an ISO-8601 UTC timestamp supplied by the caller (the
/// pipeline stamps it once, from [`crate::octave::sealer::now_iso8601`]) so
/// this function stays free of wall-clock reads.
pub fn validate_document(doc: &Document, schema: &Schema, sealed_at: &str) -> ValidationReport {
    let mut report = ValidationReport::default();
    let present: std::collections::HashSet<&str> =
        doc.sections.iter().map(Section::key).collect();

    for field in &schema.fields {
        let found = doc.sections.iter().find_map(|s| match s {
            Section::Assignment(a) if a.key == field.name => Some(a),
            _ => None,
        });

        let Some(assignment) = found else {
            if field.required {
                report.errors.push(ValidationError {
                    code: "E_REQUIRED",
                    field: field.name.clone(),
                    message: "required field is absent".to_string(),
                });
            }
            continue;
        };

        let Some(pattern) = &field.pattern else { continue };
        let Some(text) = scalar_text(&assignment.value) else { continue };

        if let Some(values) = schema::enum_values(&pattern.constraints) {
            if !values.iter().any(|v| v == &text) {
                report.errors.push(ValidationError {
                    code: "E_ENUM",
                    field: field.name.clone(),
                    message: format!("'{text}' is not one of {values:?}"),
                });
            }
        }
        if let Some(type_name) = schema::type_name(&pattern.constraints) {
            if !check_type(type_name, &text) {
                report.errors.push(ValidationError {
                    code: "E_TYPE",
                    field: field.name.clone(),
                    message: format!("'{text}' is not a valid {type_name}"),
                });
            }
        }
        if let Some(pat) = schema::regex_pattern(&pattern.constraints) {
            match Regex::new(pat) {
                Ok(re) if !re.is_match(&text) => {
                    report.errors.push(ValidationError {
                        code: "E_REGEX",
                        field: field.name.clone(),
                        message: format!("'{text}' does not match /{pat}/"),
                    });
                }
                Err(e) => {
                    report.errors.push(ValidationError {
                        code: "E_REGEX",
                        field: field.name.clone(),
                        message: format!("invalid pattern /{pat}/: {e}"),
                    });
                }
                _ => {}
            }
        }

        if let Some(target) = &pattern.target {
            report.routing.push(RoutingEntry {
                field: field.name.clone(),
                target: target.clone(),
                value_hash: compute_value_hash(&text),
                sealed_at: sealed_at.to_string(),
            });
        }
    }

    match schema.policy.unknown_fields {
        UnknownFieldsPolicy::Reject => {
            for key in doc.top_level_keys() {
                if key == "POLICY" {
                    continue;
                }
                if !schema.fields.iter().any(|f| f.name == key) {
                    report.errors.push(ValidationError {
                        code: "E_UNKNOWN_FIELD",
                        field: key.clone(),
                        message: "field is not declared in the schema and POLICY.UNKNOWN_FIELDS is reject"
                            .to_string(),
                    });
                }
            }
        }
        UnknownFieldsPolicy::Warn => {
            for key in doc.top_level_keys() {
                if key == "POLICY" {
                    continue;
                }
                if !schema.fields.iter().any(|f| f.name == key) {
                    report.warnings.push(format!(
                        "field '{key}' is not declared in the schema; POLICY.UNKNOWN_FIELDS is warn"
                    ));
                }
            }
        }
        UnknownFieldsPolicy::Allow => {}
    }

    let _ = present;
    report
}

/// A single literal zone's round-trip audit (spec §1 item 7, §6
/// `literal_zone_receipts`): the zone's content is hashed before and after
/// the lex→parse→emit round trip it is audited across. Equal hashes mean
/// the zone survived byte-for-byte.
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralZoneReceipt {
    pub pre_hash: String,
    pub post_hash: String,
}

impl LiteralZoneReceipt {
    pub fn preserved(&self) -> bool {
        self.pre_hash == self.post_hash
    }
}

/// Walks every literal zone in `before` and the corresponding zone in
/// `after` (same document order — the pipeline never reorders top-level
/// content) and hashes each pair's content independently. A document whose
/// zone count changed between the two trees is reported element-wise up to
/// the shorter length; that mismatch itself is a preservation failure and
/// shows up as differing hashes, not a panic.
pub fn collect_literal_zone_receipts(before: &Document, after: &Document) -> Vec<LiteralZoneReceipt> {
    let before_zones = literal_zone_contents(before);
    let after_zones = literal_zone_contents(after);
    before_zones
        .iter()
        .zip(after_zones.iter().chain(std::iter::repeat(&String::new())))
        .map(|(pre, post)| LiteralZoneReceipt {
            pre_hash: compute_value_hash(pre),
            post_hash: compute_value_hash(post),
        })
        .collect()
}

/// Whether `doc` has at least one literal zone anywhere in its tree.
pub fn document_contains_literal_zones(doc: &Document) -> bool {
    !literal_zone_contents(doc).is_empty()
}

fn literal_zone_contents(doc: &Document) -> Vec<String> {
    let mut out = Vec::new();
    for section in &doc.sections {
        collect_zones_from_section(section, &mut out);
    }
    out
}

fn collect_zones_from_section(section: &Section, out: &mut Vec<String>) {
    match section {
        Section::Assignment(a) => collect_zones_from_value(&a.value, out),
        Section::Block(b) => {
            for child in &b.children {
                collect_zones_from_section(child, out);
            }
        }
        Section::Section(s) => {
            for child in &s.children {
                collect_zones_from_section(child, out);
            }
        }
    }
}

fn collect_zones_from_value(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::LiteralZone(z) => out.push(z.content.clone()),
        Value::List(items) => {
            for item in items {
                collect_zones_from_value(item, out);
            }
        }
        Value::InlineMap(pairs) => {
            for (_, v) in pairs {
                collect_zones_from_value(v, out);
            }
        }
        _ => {}
    }
}

/// Aggregate flag used by the JSON tool-response shapes (spec §6): `true`
/// only when every literal zone in a document round-tripped byte-for-byte.
pub fn all_preserved(checks: &[bool]) -> bool {
    checks.iter().all(|&ok| ok)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_value_hash_is_deterministic() {
        assert_eq!(compute_value_hash("abc"), compute_value_hash("abc"));
        assert_ne!(compute_value_hash("abc"), compute_value_hash("abd"));
    }

    #[test]
    fn check_type_recognizes_ints() {
        assert!(check_type("int", "42"));
        assert!(!check_type("int", "4.2"));
    }

    #[test]
    fn all_preserved_requires_every_check() {
        assert!(all_preserved(&[true, true]));
        assert!(!all_preserved(&[true, false]));
    }
}
