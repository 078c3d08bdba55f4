//! Unicode NFC normalization and ASCII operator-alias folding.
//!
//! Both run line-by-line, outside literal zones (the lexer's orchestrator in
//! `super` guarantees that). Each fold is logged individually so the audit
//! trail can show exactly which bytes moved.

use crate::octave::operators::ASCII_ALIASES;
use unicode_normalization::UnicodeNormalization;

/// A single lenient repair performed by the lexer before tokenization.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct NormalizationRepair {
    #[serde(rename = "type")]
    pub kind: String,
    pub original: String,
    pub repaired: String,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl NormalizationRepair {
    fn alias_fold(original: &str, repaired: &str, line: usize, column: usize) -> Self {
        Self {
            kind: "normalization".to_string(),
            original: original.to_string(),
            repaired: repaired.to_string(),
            line,
            column,
            message: format!("folded ASCII alias '{original}' to canonical form '{repaired}'"),
        }
    }
}

/// Applies NFC normalization to a line. NFC never changes the number of
/// "user visible" characters that matter for column tracking in well-formed
/// UTF-8 text composed of already-decomposable sequences, but we still
/// recompute columns from the normalized string — callers must not assume
/// `normalize(line).len() == line.len()`.
pub fn normalize_nfc(line: &str) -> String {
    line.nfc().collect::<String>()
}

/// Folds every ASCII operator alias in `line` to its canonical Unicode form,
/// longest alias first so `<->` is not mistaken for `-` followed by `>`.
/// Folding skips regions already inside a double-quoted string so operator
/// characters in user text are left untouched.
pub fn fold_aliases(line: &str, line_no: usize) -> (String, Vec<NormalizationRepair>) {
    let mut out = String::with_capacity(line.len());
    let mut repairs = Vec::new();
    let mut in_string = false;
    let mut escape = false;
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if escape {
                escape = false;
            } else if c == '\\' {
                escape = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }
        if c == '"' {
            in_string = true;
            out.push(c);
            i += 1;
            continue;
        }
        let rest: String = chars[i..].iter().collect();
        let mut matched = false;
        for (alias, canonical) in ASCII_ALIASES.iter() {
            if rest.starts_with(alias) && word_boundary_ok(alias, &chars, i) {
                let column = out.chars().count() + 1;
                out.push_str(canonical);
                repairs.push(NormalizationRepair::alias_fold(alias, canonical, line_no, column));
                i += alias.chars().count();
                matched = true;
                break;
            }
        }
        if !matched {
            out.push(c);
            i += 1;
        }
    }
    (out, repairs)
}

/// `vs` and bare-word aliases must sit on word boundaries so identifiers like
/// `VSCODE` are never partially folded.
fn word_boundary_ok(alias: &str, chars: &[char], start: usize) -> bool {
    let is_word_alias = alias.chars().next().map(|c| c.is_alphabetic()).unwrap_or(false);
    if !is_word_alias {
        return true;
    }
    let before_ok = start == 0 || !chars[start - 1].is_alphanumeric();
    let end = start + alias.chars().count();
    let after_ok = end >= chars.len() || !chars[end].is_alphanumeric();
    before_ok && after_ok
}
