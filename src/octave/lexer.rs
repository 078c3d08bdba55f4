//! Lexer (spec §4.1).
//!
//! Orchestrates, in order: literal-zone fence scanning, Unicode NFC
//! normalization, ASCII operator-alias folding, lenient `NAME{qualifier}`
//! rewriting, core tokenization (via [`logos`]), and indentation-driven
//! Indent/Dedent injection. Mirrors the reference toolchain's split between
//! "base tokenization" and the transformation passes layered on top of it.

pub mod literal_zone;
pub mod normalization;
pub mod strings;

use crate::octave::token::{CoreToken, Token, TokenKind};
use logos::Logos;
use once_cell::sync::Lazy;
use regex::Regex;

pub use normalization::NormalizationRepair;

/// Strict mode rejects anomalies that lenient mode repairs and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LexMode {
    Lenient,
    Strict,
}

/// A non-fatal repair candidate logged by the lexer (spec §4.1 item 4).
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LexWarning {
    pub code: &'static str,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

/// Fatal lexer error. Carries a stable code, source location, and an
/// actionable remedy, per spec §4.1/§7.
#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub code: &'static str,
    pub line: usize,
    pub column: usize,
    pub message: String,
    pub remedy: String,
}

impl LexError {
    pub fn new(
        code: &'static str,
        line: usize,
        column: usize,
        message: impl Into<String>,
        remedy: impl Into<String>,
    ) -> Self {
        Self { code, line, column, message: message.into(), remedy: remedy.into() }
    }
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at line {}, column {}: {} (remedy: {})",
            self.code, self.line, self.column, self.message, self.remedy
        )
    }
}

impl std::error::Error for LexError {}

pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub repairs: Vec<NormalizationRepair>,
    pub warnings: Vec<LexWarning>,
}

static QUALIFIER_BRACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\{([^{}]*)\}").unwrap());

/// Tokenizes a complete OCTAVE source document.
pub fn tokenize(source: &str, mode: LexMode) -> Result<LexOutput, LexError> {
    let lines: Vec<&str> = source.split('\n').collect();
    let scan = literal_zone::scan(&lines)?;

    // Map 1-indexed open line -> zone, for O(1) lookup while walking lines.
    let mut zone_by_open: std::collections::HashMap<usize, &literal_zone::LiteralZone> =
        std::collections::HashMap::new();
    for z in &scan.zones {
        zone_by_open.insert(z.open_line, z);
    }

    let mut tokens = Vec::new();
    let mut repairs = Vec::new();
    let mut warnings = Vec::new();
    let mut indent_stack: Vec<usize> = vec![0];

    let mut i = 0usize; // 0-indexed line cursor
    while i < lines.len() {
        let line_no = i + 1;
        let raw_line = lines[i];

        if let Some(zone) = zone_by_open.get(&line_no) {
            let indent = zone.indent;
            adjust_indent(&mut indent_stack, indent, line_no, &mut tokens);
            tokens.push(Token::new(
                TokenKind::FenceOpen { fence_len: zone.fence_len, info_tag: zone.info_tag.clone() },
                line_no,
                indent + 1,
            ));
            tokens.push(Token::new(
                TokenKind::LiteralContent(zone.content.clone()),
                zone.open_line + 1,
                1,
            ));
            tokens.push(Token::new(TokenKind::FenceClose, zone.close_line, 1));
            tokens.push(Token::new(TokenKind::Newline, zone.close_line, 1));
            i = zone.close_line; // close_line is 1-indexed; this is the next 0-indexed line
            continue;
        }

        if raw_line.trim().is_empty() {
            tokens.push(Token::new(TokenKind::Newline, line_no, 1));
            i += 1;
            continue;
        }

        if raw_line.contains('\t') {
            let col = raw_line.find('\t').unwrap() + 1;
            return Err(LexError::new(
                "E005",
                line_no,
                col,
                "tab character outside a literal zone",
                "replace tabs with spaces; OCTAVE indentation is space-based",
            ));
        }

        let indent = raw_line.len() - raw_line.trim_start_matches(' ').len();
        let trimmed_is_comment = raw_line.trim_start().starts_with("//");
        if !trimmed_is_comment {
            adjust_indent(&mut indent_stack, indent, line_no, &mut tokens);
        }

        // Triple-quoted string spans can consume additional lines; handle
        // them before normalizing/alias-folding the line, since their body
        // must be preserved byte-for-byte.
        if let Some(col) = raw_line.find("\"\"\"") {
            let char_col = raw_line[..col].chars().count();
            let following: Vec<&str> = lines[i + 1..].iter().copied().collect();
            if let Some((span, extra_lines)) =
                strings::try_scan_one(raw_line, line_no, char_col, &following)?
            {
                emit_line_prefix(&raw_line[..col], line_no, mode, &mut tokens, &mut repairs, &mut warnings)?;
                tokens.push(Token::new(TokenKind::String(span.content.clone()), line_no, char_col + 1));
                tokens.push(Token::new(TokenKind::Newline, span.end_line, 1));
                i += extra_lines + 1;
                continue;
            }
        }

        emit_line_prefix(raw_line, line_no, mode, &mut tokens, &mut repairs, &mut warnings)?;
        tokens.push(Token::new(TokenKind::Newline, line_no, raw_line.chars().count() + 1));
        i += 1;
    }

    while indent_stack.len() > 1 {
        indent_stack.pop();
        tokens.push(Token::new(TokenKind::Dedent, lines.len() + 1, 1));
    }
    tokens.push(Token::new(TokenKind::Eof, lines.len() + 1, 1));

    Ok(LexOutput { tokens, repairs, warnings })
}

fn adjust_indent(stack: &mut Vec<usize>, indent: usize, line_no: usize, tokens: &mut Vec<Token>) {
    let top = *stack.last().unwrap();
    if indent > top {
        stack.push(indent);
        tokens.push(Token::new(TokenKind::Indent, line_no, indent + 1));
    } else {
        while *stack.last().unwrap() > indent {
            stack.pop();
            tokens.push(Token::new(TokenKind::Dedent, line_no, indent + 1));
        }
    }
}

/// Normalizes, alias-folds, and core-tokenizes one line's worth of text,
/// pushing resulting tokens in order. Does not push the trailing newline.
fn emit_line_prefix(
    text: &str,
    line_no: usize,
    mode: LexMode,
    tokens: &mut Vec<Token>,
    repairs: &mut Vec<NormalizationRepair>,
    warnings: &mut Vec<LexWarning>,
) -> Result<(), LexError> {
    let normalized = normalization::normalize_nfc(text);
    let (folded, mut line_repairs) = normalization::fold_aliases(&normalized, line_no);
    repairs.append(&mut line_repairs);

    let rewritten = if mode == LexMode::Lenient {
        rewrite_qualifier_braces(&folded, line_no, warnings)
    } else if let Some(pos) = folded.find('{') {
        let col = folded[..pos].chars().count() + 1;
        return Err(LexError::new(
            "E005",
            line_no,
            col,
            "unexpected '{' — qualifier-brace syntax NAME{qualifier} is only accepted in lenient mode",
            "use NAME<qualifier> or rerun in lenient mode",
        ));
    } else {
        folded
    };

    let mut lexer = CoreToken::lexer(&rewritten);
    while let Some(result) = lexer.next() {
        let span = lexer.span();
        let column = rewritten[..span.start].chars().count() + 1;
        match result {
            Ok(CoreToken::BareDollar) => {
                return Err(LexError::new(
                    "E005",
                    line_no,
                    column,
                    "bare '$' is not a valid variable reference",
                    "write $NAME or $NAME:type",
                ));
            }
            Ok(core) => {
                if let Some(kind) = core_to_kind(core) {
                    tokens.push(Token::new(kind, line_no, column));
                }
            }
            Err(_) => {
                // Unrecognized character; caller surfaces this as a fatal
                // error once the first such token is encountered downstream
                // by the parser, which has richer context for the remedy.
                tokens.push(Token::new(
                    TokenKind::Identifier(lexer.slice().to_string()),
                    line_no,
                    column,
                ));
            }
        }
    }
    Ok(())
}

fn core_to_kind(core: CoreToken) -> Option<TokenKind> {
    Some(match core {
        CoreToken::Envelope => TokenKind::EnvelopeMarker,
        CoreToken::Separator => TokenKind::Separator,
        CoreToken::Assign => TokenKind::Assign,
        CoreToken::Block => TokenKind::BlockColon,
        CoreToken::Comma => TokenKind::Comma,
        CoreToken::ListOpen => TokenKind::ListOpen,
        CoreToken::ListClose => TokenKind::ListClose,
        CoreToken::Section => TokenKind::SectionMarker,
        CoreToken::Comment(s) => TokenKind::Comment(s),
        CoreToken::Concat => TokenKind::Concat,
        CoreToken::Synthesis => TokenKind::Synthesis,
        CoreToken::Tension => TokenKind::Tension,
        CoreToken::Constraint => TokenKind::Constraint,
        CoreToken::Alternative => TokenKind::Alternative,
        CoreToken::Flow => TokenKind::Flow,
        CoreToken::Variable(s) => TokenKind::Variable(s),
        CoreToken::BareDollar => TokenKind::Variable(String::new()),
        CoreToken::SectionId(s) => TokenKind::SectionId(s),
        CoreToken::Number(s) => TokenKind::Number(s),
        CoreToken::Identifier(s) => TokenKind::Identifier(s),
        CoreToken::Str(s) => TokenKind::String(s),
        CoreToken::Newline => return None,
    })
}

/// Lenient `NAME{qualifier}` repair (spec §4.1 item 4): the qualifier brace
/// is not part of the core grammar and carries no machine-readable meaning,
/// so lenient mode drops it rather than rewriting it into syntax `CoreToken`
/// has no token for (there is no `<`/`>` operator token; inventing one here
/// would just relocate the same problem one pass downstream). Strict mode
/// never calls this; `tokenize` instead leaves the braces intact so the
/// parser's identifier scan trips `E005` on the unexpected `{`.
fn rewrite_qualifier_braces(line: &str, line_no: usize, warnings: &mut Vec<LexWarning>) -> String {
    if !QUALIFIER_BRACE.is_match(line) {
        return line.to_string();
    }
    let mut column_of_match = None;
    let rewritten = QUALIFIER_BRACE
        .replace_all(line, |caps: &regex::Captures| {
            if column_of_match.is_none() {
                column_of_match = Some(caps.get(0).unwrap().start() + 1);
            }
            caps[1].to_string()
        })
        .to_string();
    warnings.push(LexWarning {
        code: "W_REPAIR_CANDIDATE",
        line: line_no,
        column: column_of_match.unwrap_or(1),
        message: "dropped unsupported qualifier brace '{...}'".to_string(),
    });
    rewritten
}
