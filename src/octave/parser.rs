//! Parser (spec §4.2).
//!
//! A hand-written recursive-descent parser over the token vector produced by
//! [`crate::octave::lexer`]. The reference toolchain offers both a
//! combinator-based ("reference") and a hand-rolled state-machine
//! ("linebased") parser for its format; OCTAVE's grammar is driven by
//! indentation and a six-level operator precedence climb, which a small
//! explicit-cursor descent expresses more directly than a combinator
//! pipeline, so this crate follows the latter style.

pub mod value;

use crate::octave::ast::*;
use crate::octave::token::{Token, TokenKind};
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub struct ParserError {
    pub code: &'static str,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParserError {
    fn new(code: &'static str, line: usize, column: usize, message: impl Into<String>) -> Self {
        Self { code, line, column, message: message.into() }
    }
}

impl std::fmt::Display for ParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at line {}, column {}: {}", self.code, self.line, self.column, self.message)
    }
}

impl std::error::Error for ParserError {}

static SEMVER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]+(\.[0-9]+){0,2}(-[0-9A-Za-z.]+)?$").unwrap());

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    pub warnings: Vec<Warning>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0, warnings: Vec::new() }
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        let idx = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    fn skip_blank_lines(&mut self) {
        while matches!(self.peek(), TokenKind::Newline) {
            self.advance();
        }
    }

    fn warn(&mut self, kind: WarningKind, subtype: &str, message: impl Into<String>) {
        let tok = self.current();
        self.warnings.push(Warning {
            kind,
            subtype: subtype.to_string(),
            line: tok.line,
            column: tok.column,
            message: message.into(),
        });
    }

    pub fn parse_document(mut self) -> Result<Document, ParserError> {
        self.skip_blank_lines();
        let grammar_version = self.try_parse_grammar_sentinel()?;
        self.skip_blank_lines();

        let name = if matches!(self.peek(), TokenKind::EnvelopeMarker) {
            self.advance();
            let name = self.expect_identifier("envelope name")?;
            self.expect(TokenKind::EnvelopeMarker, "envelope open marker")?;
            self.skip_newlines();
            name
        } else {
            "INFERRED".to_string()
        };

        let mut doc = Document::new(name);
        doc.grammar_version = grammar_version;

        let (meta, meta_order, has_separator, leading) = self.try_parse_meta_block()?;
        doc.meta = meta;
        doc.meta_order = meta_order;
        doc.has_separator = has_separator;

        let mut sections = leading;
        sections.extend(self.parse_sections(0)?);
        doc.sections = sections;

        self.skip_blank_lines();
        if matches!(self.peek(), TokenKind::EnvelopeMarker) {
            self.advance();
            let closing = self.expect_identifier("envelope close marker")?;
            if closing != "END" {
                return Err(ParserError::new(
                    "E_PARSE",
                    self.current().line,
                    self.current().column,
                    format!("expected envelope close 'END', found '{closing}'"),
                ));
            }
            self.expect(TokenKind::EnvelopeMarker, "envelope close marker")?;
        }

        doc.warnings = self.warnings;
        Ok(doc)
    }

    fn try_parse_grammar_sentinel(&mut self) -> Result<Option<String>, ParserError> {
        if matches!(self.peek(), TokenKind::Identifier(s) if s == "OCTAVE")
            && matches!(self.peek_at(1), TokenKind::Assign)
        {
            self.advance();
            self.advance();
            let version = self.expect_value_text("grammar version")?;
            if !SEMVER_RE.is_match(&version) {
                return Err(ParserError::new(
                    "E_TOKENIZE",
                    self.current().line,
                    self.current().column,
                    format!("malformed grammar sentinel version '{version}'"),
                ));
            }
            self.skip_newlines();
            return Ok(Some(version));
        }
        Ok(None)
    }

    /// Consumes a leading `META:` block if present. Returns the meta map, its
    /// key order, whether an explicit `---` separator followed, and any
    /// sections parsed before META ended without one (lenient recovery).
    fn try_parse_meta_block(
        &mut self,
    ) -> Result<(std::collections::BTreeMap<String, Value>, Vec<String>, bool, Vec<Section>), ParserError>
    {
        self.skip_blank_lines();
        let mut meta = std::collections::BTreeMap::new();
        let mut order = Vec::new();
        let mut has_separator = false;

        let is_meta = matches!(self.peek(), TokenKind::Identifier(s) if s == "META")
            && matches!(self.peek_at(1), TokenKind::BlockColon);
        if !is_meta {
            return Ok((meta, order, has_separator, Vec::new()));
        }
        self.advance();
        self.advance();
        self.skip_newlines();
        self.expect(TokenKind::Indent, "META block body")?;

        loop {
            self.skip_blank_lines();
            if matches!(self.peek(), TokenKind::Dedent | TokenKind::Eof) {
                break;
            }
            if self.try_consume_separator() {
                has_separator = true;
                break;
            }
            let leading_comments = self.consume_leading_comments();
            if matches!(self.peek(), TokenKind::Dedent | TokenKind::Eof) {
                break;
            }
            let assignment = self.parse_assignment(leading_comments)?;
            if meta.contains_key(&assignment.key) {
                self.warn(
                    WarningKind::DuplicateKey,
                    "meta",
                    format!("duplicate META key '{}', last value wins", assignment.key),
                );
            } else {
                order.push(assignment.key.clone());
            }
            meta.insert(assignment.key.clone(), assignment.value);
        }
        if matches!(self.peek(), TokenKind::Dedent) {
            self.advance();
        }
        self.try_consume_separator();
        Ok((meta, order, has_separator, Vec::new()))
    }

    fn try_consume_separator(&mut self) -> bool {
        if matches!(self.peek(), TokenKind::Separator) {
            self.advance();
            self.skip_newlines();
            true
        } else {
            false
        }
    }

    /// Parses sibling sections at the current indentation depth until a
    /// Dedent or Eof is reached. A dropped unrecognized bare line yields no
    /// section for this iteration; the loop re-checks the terminal tokens
    /// itself on the next pass rather than recursing into a fresh call, so
    /// a bare line immediately followed by end-of-document or a dedent is
    /// handled by this loop's own guard instead of falling into the
    /// unconditional "unexpected token" error arm of a nested call.
    fn parse_sections(&mut self, _depth: usize) -> Result<Vec<Section>, ParserError> {
        let mut sections = Vec::new();
        loop {
            self.skip_blank_lines();
            if matches!(self.peek(), TokenKind::Dedent | TokenKind::Eof | TokenKind::EnvelopeMarker) {
                break;
            }
            let leading_comments = self.consume_leading_comments();
            if matches!(self.peek(), TokenKind::Dedent | TokenKind::Eof | TokenKind::EnvelopeMarker) {
                break;
            }
            if let Some(section) = self.try_parse_section_item(leading_comments)? {
                sections.push(section);
            }
        }
        Ok(sections)
    }

    fn consume_leading_comments(&mut self) -> Vec<Comment> {
        let mut comments = Vec::new();
        loop {
            self.skip_blank_lines();
            if let TokenKind::Comment(text) = self.peek().clone() {
                comments.push(Comment { text });
                self.advance();
                self.skip_newlines();
            } else {
                break;
            }
        }
        comments
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), TokenKind::Newline) {
            self.advance();
        }
    }

    /// Parses one section at the current position, or `Ok(None)` when the
    /// current line is an unrecognized bare line that was dropped (the
    /// caller's loop is responsible for re-checking terminal tokens and
    /// trying again).
    fn try_parse_section_item(&mut self, leading_comments: Vec<Comment>) -> Result<Option<Section>, ParserError> {
        if matches!(self.peek(), TokenKind::SectionMarker) {
            return Ok(Some(self.parse_section_node()?));
        }
        match self.peek().clone() {
            TokenKind::Identifier(key) => {
                if matches!(self.peek_at(1), TokenKind::BlockColon) {
                    Ok(Some(self.parse_block(key)?))
                } else if matches!(self.peek_at(1), TokenKind::Assign) {
                    Ok(Some(Section::Assignment(self.parse_assignment(leading_comments)?)))
                } else {
                    self.warn(
                        WarningKind::UnknownBareLineDropped,
                        "bare-line",
                        format!("dropped unrecognized bare line starting with '{key}'"),
                    );
                    self.skip_to_next_line();
                    Ok(None)
                }
            }
            other => Err(ParserError::new(
                "E_PARSE",
                self.current().line,
                self.current().column,
                format!("unexpected token {other} in section position"),
            )),
        }
    }

    fn skip_to_next_line(&mut self) {
        while !matches!(self.peek(), TokenKind::Newline | TokenKind::Eof | TokenKind::Dedent) {
            self.advance();
        }
        self.skip_newlines();
    }

    fn parse_block(&mut self, key: String) -> Result<Section, ParserError> {
        let loc = self.loc();
        self.advance(); // key
        self.advance(); // ':'
        self.skip_newlines();
        let mut children = Vec::new();
        if matches!(self.peek(), TokenKind::Indent) {
            self.advance();
            children = self.parse_sections(0)?;
            if matches!(self.peek(), TokenKind::Dedent) {
                self.advance();
            }
        }
        Ok(Section::Block(Block { key, children, location: loc }))
    }

    fn parse_section_node(&mut self) -> Result<Section, ParserError> {
        let loc = self.loc();
        self.advance(); // §
        let section_id = match self.peek().clone() {
            TokenKind::SectionId(s) => {
                self.advance();
                s
            }
            TokenKind::Number(s) => {
                self.advance();
                s
            }
            other => {
                return Err(ParserError::new(
                    "E_PARSE",
                    self.current().line,
                    self.current().column,
                    format!("expected section id after '§', found {other}"),
                ))
            }
        };
        self.expect(TokenKind::Assign, "section assign")?;
        let name = self.expect_identifier("section name")?;
        let annotation = self.try_parse_annotation()?;
        self.skip_newlines();
        let mut children = Vec::new();
        if matches!(self.peek(), TokenKind::Indent) {
            self.advance();
            children = self.parse_sections(0)?;
            if matches!(self.peek(), TokenKind::Dedent) {
                self.advance();
            }
        }
        Ok(Section::Section(SectionNode { section_id, name, annotation, children, location: loc }))
    }

    fn try_parse_annotation(&mut self) -> Result<Option<String>, ParserError> {
        if matches!(self.peek(), TokenKind::ListOpen) {
            self.advance();
            let mut text = String::new();
            while !matches!(self.peek(), TokenKind::ListClose | TokenKind::Eof) {
                text.push_str(&self.advance().kind.to_string());
            }
            self.expect(TokenKind::ListClose, "annotation close")?;
            return Ok(Some(text));
        }
        Ok(None)
    }

    fn parse_assignment(&mut self, leading_comments: Vec<Comment>) -> Result<Assignment, ParserError> {
        let loc = self.loc();
        let key = self.expect_identifier("assignment key")?;
        self.expect(TokenKind::Assign, "assignment operator")?;
        let value = value::parse_value(self)?;
        let trailing_comment = if let TokenKind::Comment(text) = self.peek().clone() {
            self.advance();
            Some(Comment { text })
        } else {
            None
        };
        self.skip_newlines();
        Ok(Assignment { key, value, leading_comments, trailing_comment, location: loc })
    }

    fn loc(&self) -> Location {
        let t = self.current();
        Location { line: t.line, column: t.column }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParserError> {
        if std::mem::discriminant(self.peek()) == std::mem::discriminant(&kind) {
            Ok(self.advance())
        } else {
            Err(ParserError::new(
                "E_PARSE",
                self.current().line,
                self.current().column,
                format!("expected {what}, found {}", self.peek()),
            ))
        }
    }

    fn expect_identifier(&mut self, what: &str) -> Result<String, ParserError> {
        match self.peek().clone() {
            TokenKind::Identifier(s) => {
                self.advance();
                Ok(s)
            }
            other => Err(ParserError::new(
                "E_PARSE",
                self.current().line,
                self.current().column,
                format!("expected {what}, found {other}"),
            )),
        }
    }

    fn expect_value_text(&mut self, what: &str) -> Result<String, ParserError> {
        match self.peek().clone() {
            TokenKind::Identifier(s) | TokenKind::String(s) | TokenKind::Number(s) => {
                self.advance();
                Ok(s)
            }
            other => Err(ParserError::new(
                "E_PARSE",
                self.current().line,
                self.current().column,
                format!("expected {what}, found {other}"),
            )),
        }
    }
}

/// Parses a full document from tokens produced by the lexer.
pub fn parse(tokens: Vec<Token>) -> Result<Document, ParserError> {
    Parser::new(tokens).parse_document()
}
