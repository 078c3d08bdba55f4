//! Projection (spec §4.6).
//!
//! Produces a reduced view of a document for a given audience without
//! mutating the source tree. A projected subtree that is kept is kept
//! whole — projection never reaches inside a `Block` or `Section` it has
//! decided to retain and starts dropping its children one at a time.

use crate::octave::ast::{Document, Section};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMode {
    /// Full document, unchanged.
    Canonical,
    /// Lossless, identical to canonical — authoring tools need the full
    /// document.
    Authoring,
    /// Closed key set `{STATUS, RISKS, DECISIONS}`; anything else is
    /// omitted entirely, never just emptied.
    Executive,
    /// Closed key set `{TESTS, CI, DEPS}`.
    Developer,
}

const EXECUTIVE_KEYS: &[&str] = &["STATUS", "RISKS", "DECISIONS"];
const DEVELOPER_KEYS: &[&str] = &["TESTS", "CI", "DEPS"];

#[derive(Debug, Clone)]
pub struct ProjectionResult {
    pub document: Document,
    pub lossy: bool,
    pub fields_omitted: Vec<String>,
}

pub fn project(doc: &Document, mode: ProjectionMode) -> ProjectionResult {
    match mode {
        // Authoring is lossless, identical to canonical (spec §4.6); it
        // exists as its own mode name for callers, not its own transform.
        ProjectionMode::Canonical | ProjectionMode::Authoring => {
            ProjectionResult { document: doc.clone(), lossy: false, fields_omitted: Vec::new() }
        }
        ProjectionMode::Executive => project_closed_set(doc, EXECUTIVE_KEYS),
        ProjectionMode::Developer => project_closed_set(doc, DEVELOPER_KEYS),
    }
}

/// Keeps only the top-level sections whose key is in `keep_keys`, each kept
/// whole (full subtree, unconditionally); every other top-level section is
/// omitted entirely rather than emptied.
fn project_closed_set(doc: &Document, keep_keys: &[&str]) -> ProjectionResult {
    let mut omitted = Vec::new();
    let mut projected = doc.clone();
    projected.sections = doc
        .sections
        .iter()
        .filter(|s| {
            let keep = keep_keys.contains(&s.key());
            if !keep {
                omitted.push(s.key().to_string());
            }
            keep
        })
        .cloned()
        .collect();
    ProjectionResult { lossy: true, fields_omitted: omitted, document: projected }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::octave::ast::{Block, Location, Section};

    fn block(key: &str, children: Vec<Section>) -> Section {
        Section::Block(Block { key: key.to_string(), children, location: Location::default() })
    }

    #[test]
    fn canonical_projection_is_never_lossy() {
        let doc = Document::new("TEST");
        let result = project(&doc, ProjectionMode::Canonical);
        assert!(!result.lossy);
        assert!(result.fields_omitted.is_empty());
    }

    #[test]
    fn executive_keeps_kept_subtrees_whole_and_omits_everything_else() {
        let mut doc = Document::new("TEST");
        doc.sections.push(block(
            "RISKS",
            vec![
                Section::Assignment(crate::octave::ast::Assignment {
                    key: "SECURITY".to_string(),
                    value: crate::octave::ast::Value::Scalar("HIGH".to_string()),
                    leading_comments: vec![],
                    trailing_comment: None,
                    location: Location::default(),
                }),
                Section::Assignment(crate::octave::ast::Assignment {
                    key: "PERFORMANCE".to_string(),
                    value: crate::octave::ast::Value::Scalar("LOW".to_string()),
                    leading_comments: vec![],
                    trailing_comment: None,
                    location: Location::default(),
                }),
            ],
        ));
        doc.sections.push(block("TESTS", vec![]));
        doc.sections.push(block("CI", vec![]));
        doc.sections.push(block("DEPS", vec![]));

        let result = project(&doc, ProjectionMode::Executive);
        assert!(result.lossy);
        assert_eq!(result.document.sections.len(), 1);
        match &result.document.sections[0] {
            Section::Block(b) => assert_eq!(b.children.len(), 2),
            _ => panic!("expected RISKS to survive as a block"),
        }
        assert!(result.fields_omitted.contains(&"TESTS".to_string()));
        assert!(result.fields_omitted.contains(&"CI".to_string()));
        assert!(result.fields_omitted.contains(&"DEPS".to_string()));
    }

    #[test]
    fn developer_keeps_only_its_closed_set() {
        let mut doc = Document::new("TEST");
        doc.sections.push(block("TESTS", vec![]));
        doc.sections.push(block("RISKS", vec![]));
        let result = project(&doc, ProjectionMode::Developer);
        assert!(result.lossy);
        assert_eq!(result.document.top_level_keys(), vec!["TESTS".to_string()]);
    }

    #[test]
    fn authoring_is_a_lossless_clone() {
        let mut doc = Document::new("TEST");
        doc.sections.push(block("_INTERNAL", vec![]));
        doc.sections.push(block("PUBLIC", vec![]));
        let result = project(&doc, ProjectionMode::Authoring);
        assert!(!result.lossy);
        assert!(result.fields_omitted.is_empty());
        assert_eq!(result.document.sections.len(), 2);
    }
}
