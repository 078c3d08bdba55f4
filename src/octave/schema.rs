//! Schema data model and extraction (spec §3, §4.5).

use crate::octave::ast::{Constraint, Document, HolographicPattern, Section, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownFieldsPolicy {
    Reject,
    Warn,
    Allow,
}

impl Default for UnknownFieldsPolicy {
    fn default() -> Self {
        UnknownFieldsPolicy::Warn
    }
}

#[derive(Debug, Clone, Default)]
pub struct Policy {
    pub unknown_fields: UnknownFieldsPolicy,
    pub version: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FieldDefinition {
    pub name: String,
    pub pattern: Option<HolographicPattern>,
    pub raw_value: Value,
    pub required: bool,
}

impl FieldDefinition {
    fn new(name: String, raw_value: Value, pattern: Option<HolographicPattern>) -> Self {
        let required = pattern.as_ref().map(HolographicPattern::is_required).unwrap_or(false);
        Self { name, pattern, raw_value, required }
    }
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub name: String,
    pub version: Option<String>,
    pub fields: Vec<FieldDefinition>,
    pub policy: Policy,
    pub warnings: Vec<String>,
}

impl Schema {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Extracts a [`Schema`] from a document tree: every top-level assignment
/// becomes a field definition; a holographic-pattern value supplies the
/// field's constraints, anything else is treated as a fixed example value
/// with no constraints (and therefore optional).
pub fn extract_schema_from_document(doc: &Document) -> Schema {
    let mut fields = Vec::new();
    let mut warnings = Vec::new();
    let mut policy = Policy::default();

    for section in &doc.sections {
        if let Section::Assignment(a) = section {
            if a.key == "POLICY" {
                if let Value::InlineMap(pairs) = &a.value {
                    for (k, v) in pairs {
                        match (k.as_str(), v) {
                            ("UNKNOWN_FIELDS", Value::Scalar(s)) => {
                                policy.unknown_fields = match s.as_str() {
                                    "reject" | "REJECT" => UnknownFieldsPolicy::Reject,
                                    "allow" | "ALLOW" => UnknownFieldsPolicy::Allow,
                                    _ => UnknownFieldsPolicy::Warn,
                                };
                            }
                            ("VERSION", Value::Scalar(s)) => policy.version = Some(s.clone()),
                            _ => {}
                        }
                    }
                }
                continue;
            }
            let pattern = match &a.value {
                Value::Holographic(p) => Some(p.clone()),
                _ => None,
            };
            if pattern.is_none() && !matches!(a.value, Value::Scalar(_) | Value::Number(_) | Value::Null) {
                warnings.push(format!(
                    "field '{}' has no holographic pattern; extracted as a fixed example with no constraints",
                    a.key
                ));
            }
            fields.push(FieldDefinition::new(a.key.clone(), a.value.clone(), pattern));
        }
    }

    Schema {
        name: doc.name.clone(),
        version: doc.grammar_version.clone(),
        fields,
        policy,
        warnings,
    }
}

pub fn enum_values(constraints: &[Constraint]) -> Option<&Vec<String>> {
    constraints.iter().find_map(|c| match c {
        Constraint::Enum(values) => Some(values),
        _ => None,
    })
}

pub fn type_name(constraints: &[Constraint]) -> Option<&str> {
    constraints.iter().find_map(|c| match c {
        Constraint::Type(t) => Some(t.as_str()),
        _ => None,
    })
}

pub fn regex_pattern(constraints: &[Constraint]) -> Option<&str> {
    constraints.iter().find_map(|c| match c {
        Constraint::Regex(r) => Some(r.as_str()),
        _ => None,
    })
}
