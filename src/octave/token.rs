//! Core token types shared by the lexer and parser.
//!
//! OCTAVE tokens are produced in two passes, mirroring the reference toolchain's
//! split between "base tokenization" (logos, character/word level) and the
//! hand-written transformations layered on top (indentation, literal zones,
//! alias folding). See [`crate::octave::lexer`] for the orchestration.
//!
//! Synthetic tokens (`Indent`, `Dedent`) carry no source text; they are produced
//! by the indentation transformation, not by [`CoreToken::lexer`].

use logos::Logos;

/// Character/word level tokens produced directly from normalized, alias-folded
/// source text. Comments and literal-zone content are handled outside this
/// enum (see [`crate::octave::lexer::literal_zone`] and
/// [`crate::octave::lexer::strings`]) since both require look-behind/look-ahead
/// that does not fit a single regex.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t]+")]
pub enum CoreToken {
    #[token("===")]
    Envelope,

    #[token("---")]
    Separator,

    #[token("::")]
    Assign,

    #[token(":")]
    Block,

    #[token(",")]
    Comma,

    #[token("[")]
    ListOpen,

    #[token("]")]
    ListClose,

    #[token("§")]
    Section,

    #[regex(r"//[^\n]*", |lex| lex.slice()[2..].to_owned())]
    Comment(String),

    // Canonical operators, longest-match order matters for `::`/`:` above.
    #[token("⧺")]
    Concat,
    #[token("⊕")]
    Synthesis,
    #[token("⇌")]
    Tension,
    #[token("∧")]
    Constraint,
    #[token("∨")]
    Alternative,
    #[token("→")]
    Flow,

    #[regex(r"\$[A-Za-z_][A-Za-z0-9_]*(:[A-Za-z_][A-Za-z0-9_]*)?", |lex| lex.slice().to_owned())]
    Variable(String),

    /// Single-line double-quoted string, escapes resolved here.
    #[regex(r#""(?:[^"\\\n]|\\.)*""#, |lex| unescape(lex.slice()))]
    Str(String),

    #[regex(r"\$")]
    BareDollar,

    #[regex(r"[0-9]+[a-zA-Z]", |lex| lex.slice().to_owned())]
    SectionId(String),

    #[regex(r"-?[0-9]+(\.[0-9]+)?", |lex| lex.slice().to_owned())]
    Number(String),

    // Uppercase-led identifiers; `META` is reserved and checked by the parser.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_owned())]
    Identifier(String),

    #[regex(r"\r?\n")]
    Newline,
}

/// Resolves `\\`, `\"`, `\n`, `\t` escapes in a quoted slice (including the
/// surrounding quotes) and strips the quotes.
fn unescape(slice: &str) -> String {
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('"') => out.push('"'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// A token plus its source location, as consumed by the parser.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
    /// Set when the lexer folded an ASCII alias into this token's canonical
    /// Unicode form; carries the original text for diagnostics/receipts.
    pub original_form: Option<String>,
}

impl Token {
    pub fn new(kind: TokenKind, line: usize, column: usize) -> Self {
        Self { kind, line, column, original_form: None }
    }

    pub fn with_original(mut self, original: impl Into<String>) -> Self {
        self.original_form = Some(original.into());
        self
    }
}

/// The token kinds the parser operates on, after the lexer has folded core
/// tokens, injected structural Indent/Dedent markers, and extracted literal
/// zones and quoted strings.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    EnvelopeMarker,
    Identifier(String),
    String(String),
    Number(String),
    Assign,
    BlockColon,
    Newline,
    Indent,
    Dedent,
    ListOpen,
    ListClose,
    Comma,
    SectionMarker,
    SectionId(String),
    Comment(String),
    FenceOpen { fence_len: usize, info_tag: Option<String> },
    LiteralContent(String),
    FenceClose,
    Separator,
    Variable(String),
    Concat,
    Synthesis,
    Tension,
    Constraint,
    Alternative,
    Flow,
    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::EnvelopeMarker => write!(f, "==="),
            TokenKind::Identifier(s) => write!(f, "{s}"),
            TokenKind::String(s) => write!(f, "{s:?}"),
            TokenKind::Number(s) => write!(f, "{s}"),
            TokenKind::Assign => write!(f, "::"),
            TokenKind::BlockColon => write!(f, ":"),
            TokenKind::Newline => write!(f, "\\n"),
            TokenKind::Indent => write!(f, "<indent>"),
            TokenKind::Dedent => write!(f, "<dedent>"),
            TokenKind::ListOpen => write!(f, "["),
            TokenKind::ListClose => write!(f, "]"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::SectionMarker => write!(f, "§"),
            TokenKind::SectionId(s) => write!(f, "{s}"),
            TokenKind::Comment(s) => write!(f, "//{s}"),
            TokenKind::FenceOpen { fence_len, .. } => write!(f, "{}", "`".repeat(*fence_len)),
            TokenKind::LiteralContent(_) => write!(f, "<literal>"),
            TokenKind::FenceClose => write!(f, "<fence-close>"),
            TokenKind::Separator => write!(f, "---"),
            TokenKind::Variable(s) => write!(f, "{s}"),
            TokenKind::Concat => write!(f, "⧺"),
            TokenKind::Synthesis => write!(f, "⊕"),
            TokenKind::Tension => write!(f, "⇌"),
            TokenKind::Constraint => write!(f, "∧"),
            TokenKind::Alternative => write!(f, "∨"),
            TokenKind::Flow => write!(f, "→"),
            TokenKind::Eof => write!(f, "<eof>"),
        }
    }
}
