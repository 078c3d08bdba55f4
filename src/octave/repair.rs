//! Repair engine (spec §4.4).
//!
//! Classifies every non-fatal anomaly the lexer and parser logged into one
//! of three tiers and assembles the repair log the `write --fix` pipeline
//! returns. Mirrors the original implementation's `core/repair_log.py`
//! tiering (normalization vs. structural repair vs. forbidden), adapted to
//! this crate's two-pass split: lexer-level text repairs are already
//! collected during tokenization, so part of this module's job is to
//! reclassify them alongside parser-level structural warnings into one
//! ordered log. The other part, [`apply_repairs`], is the REPAIR tier's
//! document-mutating half: gated on `--fix`, it walks the tree and coerces
//! enum case, scalar types, and stray quoting into the form the schema
//! declares, logging each change it makes.
//!
//! Literal zones are never repaired: the lexer hands their content back
//! verbatim (see [`crate::octave::lexer::literal_zone`]), so no entry in
//! this module's output ever touches zone content, and nothing is logged
//! for zones that pass through untouched. Unclosed lists are auto-closed
//! structurally by the parser itself (it has no choice — there is no tree
//! to hand back otherwise), so that repair is already reflected in
//! `doc.warnings` by the time this module sees it; this module just gives
//! it the `Repair` tier.

use crate::octave::ast::{Assignment, Document, Section, Value, Warning, WarningKind};
use crate::octave::lexer::NormalizationRepair;
use crate::octave::schema::{self, FieldDefinition, Schema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RepairTier {
    /// Lossless, meaning-preserving text normalization (alias folding, NFC).
    Normalization,
    /// Structural recovery that changes what the document says (dropped bare
    /// lines, auto-closed lists, duplicate-key overwrite).
    Repair,
    /// Would change semantics in a way this crate refuses to apply
    /// automatically; surfaced but never auto-fixed.
    Forbidden,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RepairEntry {
    pub rule_id: String,
    pub tier: RepairTier,
    pub line: usize,
    pub column: usize,
    pub before: String,
    pub after: String,
    pub safe: bool,
    pub semantics_changed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RepairLog {
    pub entries: Vec<RepairEntry>,
}

impl RepairLog {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn count_by_tier(&self, tier: RepairTier) -> usize {
        self.entries.iter().filter(|e| e.tier == tier).count()
    }
}

/// Builds the repair log from the lexer's normalization repairs and the
/// parser's structural warnings. Both input streams are already emitted in
/// source order, so the merge is a straightforward two-pointer interleave
/// that keeps overall document order.
pub fn build_repair_log(lex_repairs: &[NormalizationRepair], warnings: &[Warning]) -> RepairLog {
    let mut entries: Vec<RepairEntry> = Vec::with_capacity(lex_repairs.len() + warnings.len());

    for r in lex_repairs {
        entries.push(RepairEntry {
            rule_id: "ASCII_ALIAS_FOLD".to_string(),
            tier: RepairTier::Normalization,
            line: r.line,
            column: r.column,
            before: r.original.clone(),
            after: r.repaired.clone(),
            safe: true,
            semantics_changed: false,
        });
    }

    for w in warnings {
        let (rule_id, tier, safe, semantics_changed) = classify_warning(w.kind);
        entries.push(RepairEntry {
            rule_id: rule_id.to_string(),
            tier,
            line: w.line,
            column: w.column,
            before: w.message.clone(),
            after: String::new(),
            safe,
            semantics_changed,
        });
    }

    entries.sort_by_key(|e| (e.line, e.column));
    RepairLog { entries }
}

/// Applies REPAIR-tier mutations to `doc` in place when `fix` is set,
/// returning a log entry for every change made. A no-op, returning no
/// entries, when `fix` is false — `--fix` is what turns this tier on.
pub fn apply_repairs(doc: &mut Document, schema: &Schema, fix: bool) -> Vec<RepairEntry> {
    if !fix {
        return Vec::new();
    }
    let mut entries = Vec::new();
    for section in &mut doc.sections {
        if let Section::Assignment(a) = section {
            if let Some(field) = schema.field(&a.key) {
                repair_assignment(a, field, &mut entries);
            } else {
                quote_trim(a, &mut entries);
            }
        }
    }
    entries
}

fn repair_assignment(a: &mut Assignment, field: &FieldDefinition, entries: &mut Vec<RepairEntry>) {
    quote_trim(a, entries);
    let Some(pattern) = &field.pattern else { return };

    if let Some(values) = schema::enum_values(&pattern.constraints) {
        if let Value::Scalar(s) = &a.value {
            if !values.iter().any(|v| v == s) {
                if let Some(correct) = values.iter().find(|v| v.eq_ignore_ascii_case(s)) {
                    entries.push(entry("ENUM_CASE_FOLD", a, s.clone(), correct.clone()));
                    a.value = Value::Scalar(correct.clone());
                }
            }
        }
    }

    if let Some(type_name) = schema::type_name(&pattern.constraints) {
        coerce_type(a, type_name, entries);
    }
}

/// Strips a pair of literal quote characters that ended up inside the
/// scalar text itself rather than around it (the lexer's own string regex
/// never lets this happen for `"..."` literals; it does for text that was
/// reassembled through `Value::Flow` stringification and then re-quoted
/// downstream).
fn quote_trim(a: &mut Assignment, entries: &mut Vec<RepairEntry>) {
    if let Value::Scalar(s) = &a.value {
        if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
            let trimmed = s[1..s.len() - 1].to_string();
            entries.push(entry("QUOTE_TRIM", a, s.clone(), trimmed.clone()));
            a.value = Value::Scalar(trimmed);
        }
    }
}

/// Coerces a scalar's textual form to the schema-declared type (spec §4.4's
/// coercion repair): a numeric-looking scalar under `TYPE[int/float]`
/// becomes a `Number`; a stray-case boolean under `TYPE[bool]` is
/// lowercased.
fn coerce_type(a: &mut Assignment, type_name: &str, entries: &mut Vec<RepairEntry>) {
    let Value::Scalar(s) = &a.value else { return };
    match type_name {
        "int" | "integer" | "float" | "number" => {
            let looks_numeric = !s.is_empty()
                && s.trim_start_matches('-').chars().all(|c| c.is_ascii_digit() || c == '.')
                && s.chars().any(|c| c.is_ascii_digit());
            if looks_numeric {
                let before = s.clone();
                entries.push(entry("TYPE_COERCION", a, before.clone(), before.clone()));
                a.value = Value::Number(before);
            }
        }
        "bool" | "boolean" => {
            let lower = s.to_ascii_lowercase();
            if (lower == "true" || lower == "false") && *s != lower {
                entries.push(entry("TYPE_COERCION", a, s.clone(), lower.clone()));
                a.value = Value::Scalar(lower);
            }
        }
        _ => {}
    }
}

fn entry(rule_id: &str, a: &Assignment, before: String, after: String) -> RepairEntry {
    RepairEntry {
        rule_id: rule_id.to_string(),
        tier: RepairTier::Repair,
        line: a.location.line,
        column: a.location.column,
        before,
        after,
        safe: true,
        semantics_changed: true,
    }
}

fn classify_warning(kind: WarningKind) -> (&'static str, RepairTier, bool, bool) {
    match kind {
        WarningKind::RepairCandidate => ("W_REPAIR_CANDIDATE", RepairTier::Normalization, true, false),
        WarningKind::UnclosedListAutoClosed => ("W_UNCLOSED_LIST", RepairTier::Repair, true, true),
        WarningKind::UnknownBareLineDropped => ("W_BARE_LINE_DROPPED", RepairTier::Repair, true, true),
        WarningKind::DuplicateKey => ("W_DUPLICATE_KEY", RepairTier::Repair, true, true),
        WarningKind::NumberedKeyCollision => ("W_NUMBERED_KEY_COLLISION", RepairTier::Forbidden, false, true),
        WarningKind::ConstructorMisuse => ("W_CONSTRUCTOR_MISUSE", RepairTier::Forbidden, false, true),
        WarningKind::MalformedHolographic => ("W_MALFORMED_HOLOGRAPHIC", RepairTier::Forbidden, false, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::octave::ast::{Constraint, HolographicPattern, Location, Warning, WarningKind};

    fn assignment(key: &str, value: Value) -> Assignment {
        Assignment {
            key: key.to_string(),
            value,
            leading_comments: vec![],
            trailing_comment: None,
            location: Location::default(),
        }
    }

    fn schema_with_field(name: &str, constraints: Vec<Constraint>) -> Schema {
        Schema {
            name: "TEST".to_string(),
            version: None,
            fields: vec![FieldDefinition {
                name: name.to_string(),
                pattern: Some(HolographicPattern { example: "x".to_string(), constraints, target: None }),
                raw_value: Value::Null,
                required: false,
            }],
            policy: crate::octave::schema::Policy::default(),
            warnings: vec![],
        }
    }

    #[test]
    fn apply_repairs_is_a_noop_without_fix() {
        let mut doc = Document::new("TEST");
        doc.sections.push(Section::Assignment(assignment("STATUS", Value::Scalar("active".to_string()))));
        let schema = schema_with_field("STATUS", vec![Constraint::Enum(vec!["ACTIVE".to_string()])]);
        let entries = apply_repairs(&mut doc, &schema, false);
        assert!(entries.is_empty());
        assert_eq!(doc.sections[0].key(), "STATUS");
        match &doc.sections[0] {
            Section::Assignment(a) => assert_eq!(a.value, Value::Scalar("active".to_string())),
            _ => panic!(),
        }
    }

    #[test]
    fn enum_case_fold_corrects_case_when_fixed() {
        let mut doc = Document::new("TEST");
        doc.sections.push(Section::Assignment(assignment("STATUS", Value::Scalar("active".to_string()))));
        let schema = schema_with_field("STATUS", vec![Constraint::Enum(vec!["ACTIVE".to_string()])]);
        let entries = apply_repairs(&mut doc, &schema, true);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].rule_id, "ENUM_CASE_FOLD");
        match &doc.sections[0] {
            Section::Assignment(a) => assert_eq!(a.value, Value::Scalar("ACTIVE".to_string())),
            _ => panic!(),
        }
    }

    #[test]
    fn type_coercion_turns_numeric_scalar_into_a_number() {
        let mut doc = Document::new("TEST");
        doc.sections.push(Section::Assignment(assignment("COUNT", Value::Scalar("42".to_string()))));
        let schema = schema_with_field("COUNT", vec![Constraint::Type("int".to_string())]);
        apply_repairs(&mut doc, &schema, true);
        match &doc.sections[0] {
            Section::Assignment(a) => assert_eq!(a.value, Value::Number("42".to_string())),
            _ => panic!(),
        }
    }

    #[test]
    fn quote_trim_strips_stray_embedded_quotes() {
        let mut doc = Document::new("TEST");
        doc.sections.push(Section::Assignment(assignment("NOTE", Value::Scalar("\"hi\"".to_string()))));
        let schema = Schema {
            name: "TEST".to_string(),
            version: None,
            fields: vec![],
            policy: crate::octave::schema::Policy::default(),
            warnings: vec![],
        };
        let entries = apply_repairs(&mut doc, &schema, true);
        assert_eq!(entries[0].rule_id, "QUOTE_TRIM");
        match &doc.sections[0] {
            Section::Assignment(a) => assert_eq!(a.value, Value::Scalar("hi".to_string())),
            _ => panic!(),
        }
    }

    #[test]
    fn normalization_repairs_are_always_safe() {
        let lex_repairs = vec![NormalizationRepair {
            kind: "normalization".to_string(),
            original: "&&".to_string(),
            repaired: "∧".to_string(),
            line: 1,
            column: 1,
            message: "folded ASCII alias '&&' to canonical form '∧'".to_string(),
        }];
        let log = build_repair_log(&lex_repairs, &[]);
        assert_eq!(log.entries.len(), 1);
        assert!(log.entries[0].safe);
        assert!(!log.entries[0].semantics_changed);
        assert_eq!(log.entries[0].tier, RepairTier::Normalization);
    }

    #[test]
    fn forbidden_tier_is_never_marked_safe() {
        let warning = Warning {
            kind: WarningKind::NumberedKeyCollision,
            subtype: "list".to_string(),
            line: 3,
            column: 4,
            message: "numbered key collision".to_string(),
        };
        let _ = Location::default();
        let log = build_repair_log(&[], &[warning]);
        assert!(!log.entries[0].safe);
        assert_eq!(log.entries[0].tier, RepairTier::Forbidden);
    }
}
