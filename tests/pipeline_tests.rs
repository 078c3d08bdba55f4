//! End-to-end pipeline scenarios, mirroring spec §8's worked examples.

use octave::octave::lexer::LexMode;
use octave::octave::pipeline::{self, PipelineConfig};
use rstest::rstest;

const SEALED_AT: &str = "2026-08-01T00:00:00Z";

#[rstest]
#[case::minimal("===DOC===\nNAME::\"Ada\"\n===END===\n")]
#[case::with_meta("===DOC===\nMETA:\n  OCTAVE::1.0\n---\nNAME::\"Ada\"\n===END===\n")]
fn documents_parse_and_validate_cleanly(#[case] source: &str) {
    let config = PipelineConfig::default();
    let output = pipeline::run(source, &config, SEALED_AT).expect("pipeline run should succeed");
    assert_eq!(output.document.name, "DOC");
    assert!(output.validation.is_valid());
}

#[test]
fn required_field_absence_is_reported() {
    let source = "===DOC===\nNAME::[\"Ada\"∧REQ]\n===END===\n";
    let config = PipelineConfig::default();
    let first = pipeline::run(source, &config, SEALED_AT).unwrap();
    assert!(first.validation.is_valid());

    let missing = "===DOC===\nOTHER::\"x\"\n===END===\n";
    // `missing` has no NAME field at all; extracting a schema from a
    // document that never defines NAME produces no REQ constraint to check,
    // so validate the first document's own schema against the second body
    // by re-parsing just enough to exercise the required-field path
    // directly through the schema already extracted above.
    let lexed = octave::octave::lexer::tokenize(missing, LexMode::Lenient).unwrap();
    let doc = octave::octave::parser::parse(lexed.tokens).unwrap();
    let report = octave::octave::validator::validate_document(&doc, &first.schema, SEALED_AT);
    assert!(!report.is_valid());
    assert!(report.errors.iter().any(|e| e.code == "E_REQUIRED"));
}

#[test]
fn enum_violation_is_reported() {
    let source = "===DOC===\nSTATUS::[\"open\"∧ENUM[open,closed]]\n===END===\n";
    let config = PipelineConfig::default();
    let output = pipeline::run(source, &config, SEALED_AT).unwrap();
    let schema = output.schema.clone();

    let bad = "===DOC===\nSTATUS::\"pending\"\n===END===\n";
    let lexed = octave::octave::lexer::tokenize(bad, LexMode::Lenient).unwrap();
    let doc = octave::octave::parser::parse(lexed.tokens).unwrap();
    let report = octave::octave::validator::validate_document(&doc, &schema, SEALED_AT);
    assert!(report.errors.iter().any(|e| e.code == "E_ENUM"));
}

#[test]
fn routing_target_is_hashed_per_field() {
    let source = "===DOC===\nEMAIL::[\"a@b.com\"∧REQ→§CONTACTS]\n===END===\n";
    let config = PipelineConfig::default();
    let output = pipeline::run(source, &config, SEALED_AT).unwrap();
    assert_eq!(output.validation.routing.len(), 1);
    assert_eq!(output.validation.routing[0].target, "CONTACTS");
    assert_eq!(output.validation.routing[0].sealed_at, SEALED_AT);
}

#[test]
fn literal_zone_content_is_tokenized_verbatim_without_alias_folding() {
    let source = "```\nraw & <-> text\n```\n";
    let lexed = octave::octave::lexer::tokenize(source, LexMode::Lenient).expect("fence scan should succeed");
    let literal = lexed
        .tokens
        .iter()
        .find_map(|t| match &t.kind {
            octave::octave::token::TokenKind::LiteralContent(c) => Some(c.clone()),
            _ => None,
        })
        .expect("a literal content token should be present");
    assert_eq!(literal, "raw & <-> text");
}

#[test]
fn strict_mode_rejects_qualifier_braces() {
    let source = "===DOC===\nFIELD{note}::\"x\"\n===END===\n";
    let config = PipelineConfig { lex_mode: LexMode::Strict, ..PipelineConfig::default() };
    let result = pipeline::run(source, &config, SEALED_AT);
    assert!(result.is_err());
}

#[test]
fn lenient_mode_rewrites_qualifier_braces() {
    let source = "===DOC===\nFIELD{note}::\"x\"\n===END===\n";
    let config = PipelineConfig { lex_mode: LexMode::Lenient, ..PipelineConfig::default() };
    let result = pipeline::run(source, &config, SEALED_AT);
    assert!(result.is_ok());
}

#[test]
fn fix_flag_corrects_case_mismatched_enum_values_in_the_output() {
    // STATUS's own value carries the holographic pattern, so it both
    // declares the enum and supplies the instance that must be checked
    // against it; a document that *also* assigns a mismatched-case scalar
    // under the same key would be a duplicate-key case this grammar
    // doesn't express, so the coercion is exercised directly against a
    // schema extracted from a sibling document instead (mirrors
    // `enum_violation_is_reported` above).
    let schema_source = "===DOC===\nSTATUS::[\"open\"∧ENUM[OPEN,CLOSED]]\n===END===\n";
    let schema_doc = pipeline::run(schema_source, &PipelineConfig::default(), SEALED_AT).unwrap();

    let data_source = "===DOC===\nSTATUS::\"open\"\n===END===\n";
    let lexed = octave::octave::lexer::tokenize(data_source, LexMode::Lenient).unwrap();
    let mut doc = octave::octave::parser::parse(lexed.tokens).unwrap();

    let fixed = octave::octave::repair::apply_repairs(&mut doc, &schema_doc.schema, true);
    assert_eq!(fixed.len(), 1);
    assert_eq!(fixed[0].rule_id, "ENUM_CASE_FOLD");
    match &doc.sections[0] {
        octave::octave::ast::Section::Assignment(a) => {
            assert_eq!(a.value, octave::octave::ast::Value::Scalar("OPEN".to_string()))
        }
        _ => panic!("expected STATUS to remain an assignment"),
    }
}
