//! Canonical emitter (spec §4.3).
//!
//! Serializes a [`Document`] back to OCTAVE text using only canonical
//! Unicode operator glyphs, two-space indentation, and deterministic key
//! ordering (document order, not sorted — META preserves authoring order
//! via `meta_order`). Emitting the output of a prior emit must reproduce it
//! byte-for-byte; this idempotence property is exercised in
//! `tests/idempotence.rs`.

use std::fmt::Write as _;

use crate::octave::ast::{Assignment, Block, Constraint, Document, HolographicPattern, Section, SectionNode, Value};

/// A collection value is broken onto multiple lines once its single-line
/// rendering would exceed this width, per spec §4.3.
const MAX_LINE_WIDTH: usize = 80;

#[derive(Debug, Clone)]
pub struct FormatOptions {
    pub indent_width: usize,
    /// Canonical emission always uses Unicode operator glyphs; this toggles
    /// whether a document-level `OCTAVE::x.y` grammar sentinel is re-emitted.
    pub emit_grammar_sentinel: bool,
    /// Omits every leading and trailing comment from the emitted text.
    pub strip_comments: bool,
    /// Whether operator glyphs are canonicalized on emission. The parser
    /// already folds every ASCII alias to its canonical glyph before the
    /// AST is built, so a parsed document has no surviving alias form to
    /// canonicalize here; this flag exists for forward compatibility with a
    /// value representation that preserves original operator spelling, and
    /// is a no-op against the current AST.
    pub canonicalize_operators: bool,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            indent_width: 2,
            emit_grammar_sentinel: true,
            strip_comments: false,
            canonicalize_operators: true,
        }
    }
}

pub fn emit_document(doc: &Document, opts: &FormatOptions) -> String {
    let mut out = String::new();
    if opts.emit_grammar_sentinel {
        if let Some(v) = &doc.grammar_version {
            let _ = writeln!(out, "OCTAVE::{v}");
            out.push('\n');
        }
    }
    let _ = writeln!(out, "==={}===", doc.name);

    if !doc.meta.is_empty() {
        out.push_str("META:\n");
        for (key, value) in doc.meta_ordered() {
            let _ = writeln!(out, "{}{key}::{}", indent(1, opts), emit_value(value, opts, 1));
        }
        if doc.has_separator {
            out.push_str("---\n");
        }
    }

    for section in &doc.sections {
        emit_section(section, 0, opts, &mut out);
    }

    out.push_str("===END===\n");
    out
}

fn indent(depth: usize, opts: &FormatOptions) -> String {
    " ".repeat(depth * opts.indent_width)
}

fn emit_section(section: &Section, depth: usize, opts: &FormatOptions, out: &mut String) {
    match section {
        Section::Assignment(a) => emit_assignment(a, depth, opts, out),
        Section::Block(b) => emit_block(b, depth, opts, out),
        Section::Section(s) => emit_section_node(s, depth, opts, out),
    }
}

fn emit_assignment(a: &Assignment, depth: usize, opts: &FormatOptions, out: &mut String) {
    if !opts.strip_comments {
        for c in &a.leading_comments {
            let _ = writeln!(out, "{}//{}", indent(depth, opts), c.text.trim_start_matches("//"));
        }
    }
    // Absent values are never emitted (spec §3 tri-state rule); a value
    // that was never present simply produces no line at all.
    if matches!(a.value, Value::Absent) {
        return;
    }
    let rendered = emit_value(&a.value, opts, depth);
    let trailing = if opts.strip_comments {
        String::new()
    } else {
        a.trailing_comment
            .as_ref()
            .map(|c| format!(" //{}", c.text.trim_start_matches("//")))
            .unwrap_or_default()
    };
    let _ = writeln!(out, "{}{}::{}{}", indent(depth, opts), a.key, rendered, trailing);
}

fn emit_block(b: &Block, depth: usize, opts: &FormatOptions, out: &mut String) {
    let _ = writeln!(out, "{}{}:", indent(depth, opts), b.key);
    for child in &b.children {
        emit_section(child, depth + 1, opts, out);
    }
}

fn emit_section_node(s: &SectionNode, depth: usize, opts: &FormatOptions, out: &mut String) {
    let annotation = s.annotation.as_ref().map(|a| format!("[{a}]")).unwrap_or_default();
    let _ = writeln!(out, "{}§{}::{}{}", indent(depth, opts), s.section_id, s.name, annotation);
    for child in &s.children {
        emit_section(child, depth + 1, opts, out);
    }
}

fn emit_value(v: &Value, opts: &FormatOptions, depth: usize) -> String {
    match v {
        Value::Scalar(s) => quote_if_needed(s),
        Value::Number(n) => n.clone(),
        Value::Null => "null".to_string(),
        Value::Absent => String::new(),
        Value::Variable(v) => v.clone(),
        Value::Flow(s) => s.clone(),
        Value::List(items) => emit_list(items, opts, depth),
        Value::InlineMap(pairs) => emit_inline_map(pairs, opts, depth),
        Value::LiteralZone(z) => emit_literal_zone(z, opts, depth),
        Value::Holographic(p) => emit_holographic(p),
    }
}

fn quote_if_needed(s: &str) -> String {
    let needs_quote = s.is_empty()
        || s.chars().any(|c| c.is_whitespace() || "[]{}::,\"".contains(c))
        || s == "null";
    if needs_quote {
        format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        s.to_string()
    }
}

/// Lists and inline maps go multi-line, one element per line, when any
/// element is itself a list or inline map, or when the single-line
/// rendering would exceed [`MAX_LINE_WIDTH`] (spec §4.3).
fn needs_multiline(items_rendered: &[String], single_line: &str, has_nested: bool) -> bool {
    has_nested || single_line.chars().count() > MAX_LINE_WIDTH || items_rendered.is_empty() && false
}

fn emit_list(items: &[Value], opts: &FormatOptions, depth: usize) -> String {
    let rendered: Vec<String> = items.iter().map(|v| emit_value(v, opts, depth + 1)).collect();
    let single_line = format!("[{}]", rendered.join(","));
    let has_nested = items.iter().any(|v| matches!(v, Value::List(_) | Value::InlineMap(_)));
    if !needs_multiline(&rendered, &single_line, has_nested) {
        return single_line;
    }
    multiline_bracket(&rendered, opts, depth)
}

fn emit_inline_map(pairs: &[(String, Value)], opts: &FormatOptions, depth: usize) -> String {
    let rendered: Vec<String> =
        pairs.iter().map(|(k, v)| format!("{k}::{}", emit_value(v, opts, depth + 1))).collect();
    let single_line = format!("[{}]", rendered.join(","));
    let has_nested = pairs.iter().any(|(_, v)| matches!(v, Value::List(_) | Value::InlineMap(_)));
    if !needs_multiline(&rendered, &single_line, has_nested) {
        return single_line;
    }
    multiline_bracket(&rendered, opts, depth)
}

fn multiline_bracket(rendered: &[String], opts: &FormatOptions, depth: usize) -> String {
    let pad = indent(depth + 1, opts);
    let close_pad = indent(depth, opts);
    let mut out = String::from("[\n");
    for (i, item) in rendered.iter().enumerate() {
        let comma = if i + 1 < rendered.len() { "," } else { "" };
        let _ = writeln!(out, "{pad}{item}{comma}");
    }
    out.push_str(&close_pad);
    out.push(']');
    out
}

/// Re-indents and, if needed, lengthens the fence so it never collides with
/// a run of backticks inside the zone's own content (spec §4.3's fence
/// rescaling rule, grounded on the same concern as Markdown code fences).
fn emit_literal_zone(z: &crate::octave::ast::LiteralZoneValue, opts: &FormatOptions, depth: usize) -> String {
    let longest_run = longest_backtick_run(&z.content);
    let fence_len = z.fence_marker.chars().count().max(longest_run + 1).max(3);
    let fence = "`".repeat(fence_len);
    let pad = indent(depth + 1, opts);
    let info_tag = z.info_tag.as_deref().unwrap_or("");
    let mut body = String::new();
    for line in z.content.split('\n') {
        let _ = writeln!(body, "{pad}{line}");
    }
    format!("\n{pad}{fence}{info_tag}\n{body}{pad}{fence}")
}

fn longest_backtick_run(s: &str) -> usize {
    let mut max = 0;
    let mut cur = 0;
    for c in s.chars() {
        if c == '`' {
            cur += 1;
            max = max.max(cur);
        } else {
            cur = 0;
        }
    }
    max
}

fn emit_holographic(p: &HolographicPattern) -> String {
    let mut parts = vec![quote_if_needed(&p.example)];
    for c in &p.constraints {
        parts.push(emit_constraint(c));
    }
    let chain = parts.join("∧");
    match &p.target {
        Some(t) => format!("[{chain}→§{t}]"),
        None => format!("[{chain}]"),
    }
}

fn emit_constraint(c: &Constraint) -> String {
    match c {
        Constraint::Required => "REQ".to_string(),
        Constraint::Optional => "OPT".to_string(),
        Constraint::Enum(values) => format!("ENUM[{}]", values.join(",")),
        Constraint::Type(t) => format!("TYPE[{t}]"),
        Constraint::Regex(r) => format!("REGEX[\"{r}\"]"),
        Constraint::Named(n) => n.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::octave::ast::{Comment, Location};

    #[test]
    fn absent_value_is_never_emitted() {
        let mut doc = Document::new("TEST");
        doc.sections.push(Section::Assignment(Assignment {
            key: "FIELD".to_string(),
            value: Value::Absent,
            leading_comments: vec![],
            trailing_comment: None,
            location: Location::default(),
        }));
        let out = emit_document(&doc, &FormatOptions::default());
        assert!(!out.contains("FIELD"));
    }

    #[test]
    fn scalar_with_spaces_is_quoted() {
        assert_eq!(quote_if_needed("hello world"), "\"hello world\"");
        assert_eq!(quote_if_needed("plain"), "plain");
    }

    #[test]
    fn trailing_comment_has_a_single_leading_space() {
        let mut doc = Document::new("TEST");
        doc.sections.push(Section::Assignment(Assignment {
            key: "FIELD".to_string(),
            value: Value::Scalar("x".to_string()),
            leading_comments: vec![],
            trailing_comment: Some(Comment { text: "note".to_string() }),
            location: Location::default(),
        }));
        let out = emit_document(&doc, &FormatOptions::default());
        assert!(out.contains("FIELD::x //note"));
        assert!(!out.contains("  //note"));
    }

    #[test]
    fn strip_comments_omits_leading_and_trailing_comments() {
        let mut doc = Document::new("TEST");
        doc.sections.push(Section::Assignment(Assignment {
            key: "FIELD".to_string(),
            value: Value::Scalar("x".to_string()),
            leading_comments: vec![Comment { text: "heads up".to_string() }],
            trailing_comment: Some(Comment { text: "note".to_string() }),
            location: Location::default(),
        }));
        let opts = FormatOptions { strip_comments: true, ..FormatOptions::default() };
        let out = emit_document(&doc, &opts);
        assert!(!out.contains("heads up"));
        assert!(!out.contains("note"));
    }

    #[test]
    fn nested_list_forces_multiline() {
        let items = vec![Value::List(vec![Value::Scalar("a".to_string())]), Value::Number("1".to_string())];
        let rendered = emit_list(&items, &FormatOptions::default(), 0);
        assert!(rendered.contains('\n'));
    }

    #[test]
    fn short_flat_list_stays_single_line() {
        let items = vec![Value::Number("1".to_string()), Value::Number("2".to_string())];
        let rendered = emit_list(&items, &FormatOptions::default(), 0);
        assert_eq!(rendered, "[1,2]");
    }

    #[test]
    fn long_list_wraps_past_line_width() {
        let items: Vec<Value> = (0..20).map(|i| Value::Scalar(format!("item-number-{i}"))).collect();
        let rendered = emit_list(&items, &FormatOptions::default(), 0);
        assert!(rendered.contains('\n'));
    }
}
