//! The canonical operator table.
//!
//! One static table shared by the lexer (alias folding) and the emitter
//! (canonicalization), rather than duplicating glyph literals at both call
//! sites — the same shape as `octave_mcp.OCTAVE_OPERATORS` in the reference
//! implementation this crate was distilled from.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// `(ascii_alias, canonical_unicode)` pairs, checked in order so multi-character
/// aliases (`<->`) are tried before shorter ones that could spuriously prefix-match.
pub static ASCII_ALIASES: Lazy<Vec<(&'static str, &'static str)>> = Lazy::new(|| {
    vec![
        ("<->", "⇌"),
        ("->", "→"),
        ("vs", "⇌"),
        ("~", "⧺"),
        ("+", "⊕"),
        ("&", "∧"),
        ("|", "∨"),
        ("#", "§"),
    ]
});

/// Canonical operator name → glyph, for diagnostics and the emitter.
pub static CANONICAL: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ASSIGN", "::"),
        ("BLOCK", ":"),
        ("CONCAT", "⧺"),
        ("SYNTHESIS", "⊕"),
        ("TENSION", "⇌"),
        ("CONSTRAINT", "∧"),
        ("ALTERNATIVE", "∨"),
        ("FLOW", "→"),
        ("SECTION", "§"),
        ("COMMENT", "//"),
    ])
});

/// All six canonical binary-expression operators, tightest to loosest binding —
/// the order the value grammar's precedence climb walks in (spec §4.2).
pub const EXPRESSION_PRECEDENCE: [&str; 6] = ["⧺", "⊕", "⇌", "∧", "∨", "→"];

pub fn is_canonical_operator_glyph(s: &str) -> bool {
    matches!(s, "⧺" | "⊕" | "⇌" | "∧" | "∨" | "→" | "§" | "::" | ":" | "//")
}
