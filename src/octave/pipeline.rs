//! Pipeline orchestration (spec §2).
//!
//! Wires every stage together in fixed order: lex, parse, extract schema,
//! validate, repair-log assembly, canonical emit, project, seal. Each stage
//! error converts into a single [`PipelineError`] via `From`, so callers
//! (the CLI and the JSON tool-response layer) handle one error type instead
//! of threading five through every call site.

use crate::octave::ast::Document;
use crate::octave::emitter::{self, FormatOptions};
use crate::octave::lexer::{self, LexError, LexMode, LexOutput};
use crate::octave::parser::{self, ParserError};
use crate::octave::projector::{self, ProjectionMode, ProjectionResult};
use crate::octave::repair::{self, RepairLog};
use crate::octave::schema::{self, Schema};
use crate::octave::sealer::{self, Seal, SealError};
use crate::octave::validator::{self, LiteralZoneReceipt, ValidationReport};

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineError {
    Lex(LexError),
    Parse(ParserError),
    Seal(SealError),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Lex(e) => write!(f, "{e}"),
            PipelineError::Parse(e) => write!(f, "{e}"),
            PipelineError::Seal(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<LexError> for PipelineError {
    fn from(e: LexError) -> Self {
        PipelineError::Lex(e)
    }
}

impl From<ParserError> for PipelineError {
    fn from(e: ParserError) -> Self {
        PipelineError::Parse(e)
    }
}

impl From<SealError> for PipelineError {
    fn from(e: SealError) -> Self {
        PipelineError::Seal(e)
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub lex_mode: LexMode,
    pub format: FormatOptions,
    pub projection: ProjectionMode,
    /// Gates [`repair::apply_repairs`]: when false (the default), the
    /// pipeline only logs repair candidates, it never mutates the tree.
    pub fix: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            lex_mode: LexMode::Lenient,
            format: FormatOptions::default(),
            projection: ProjectionMode::Canonical,
            fix: false,
        }
    }
}

/// The full result of running a document through every stage.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub document: Document,
    pub schema: Schema,
    pub validation: ValidationReport,
    pub repairs: RepairLog,
    pub canonical_text: String,
    pub projection: ProjectionResult,
    pub seal: Seal,
    pub contains_literal_zones: bool,
    pub literal_zone_receipts: Vec<LiteralZoneReceipt>,
}

pub fn run(source: &str, config: &PipelineConfig, sealed_at: &str) -> Result<PipelineOutput, PipelineError> {
    let LexOutput { tokens, repairs: lex_repairs, .. } = lexer::tokenize(source, config.lex_mode)?;
    let mut document = parser::parse(tokens)?;

    let schema = schema::extract_schema_from_document(&document);
    let mut repairs = repair::build_repair_log(&lex_repairs, &document.warnings);
    let applied = repair::apply_repairs(&mut document, &schema, config.fix);
    if !applied.is_empty() {
        repairs.entries.extend(applied);
        repairs.entries.sort_by_key(|e| (e.line, e.column));
    }

    let validation = validator::validate_document(&document, &schema, sealed_at);

    let canonical_text = emitter::emit_document(&document, &config.format);
    let projection = projector::project(&document, config.projection);
    let seal = sealer::seal_document(&document, &config.format, sealed_at)?;

    // Re-lex/re-parse the canonical emission to audit every literal zone's
    // content hash across the round trip (spec §1 item 7, §6).
    let reemitted = lexer::tokenize(&canonical_text, LexMode::Strict)
        .ok()
        .and_then(|out| parser::parse(out.tokens).ok());
    let literal_zone_receipts = match &reemitted {
        Some(after) => validator::collect_literal_zone_receipts(&document, after),
        None => Vec::new(),
    };
    let contains_literal_zones = validator::document_contains_literal_zones(&document);

    Ok(PipelineOutput {
        document,
        schema,
        validation,
        repairs,
        canonical_text,
        projection,
        seal,
        contains_literal_zones,
        literal_zone_receipts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_meta_document_round_trips() {
        let source = "===TEST===\nFIELD::\"value\"\n===END===\n";
        let config = PipelineConfig::default();
        let output = run(source, &config, "2026-08-01T00:00:00Z").expect("pipeline should succeed");
        assert_eq!(output.document.name, "TEST");
        assert!(output.validation.is_valid());
    }
}
