//! JSON tool-response shapes (spec §6).
//!
//! These are the wire shapes an external caller (MCP tool, HTTP handler —
//! neither lives in this crate) would serialize a [`PipelineOutput`] into.
//! Kept separate from the pipeline itself so the pipeline's native types
//! never need `serde` derives sized for an external contract.

use serde::Serialize;

use crate::octave::pipeline::PipelineOutput;
use crate::octave::projector::ProjectionMode;
use crate::octave::repair::RepairTier;
use crate::octave::validator::all_preserved;

#[derive(Debug, Clone, Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub errors: Vec<ValidationErrorJson>,
    pub warnings: Vec<String>,
    pub routing: Vec<RoutingEntryJson>,
    pub repairs: Vec<RepairEntryJson>,
    pub contains_literal_zones: bool,
    pub literal_zone_receipts: Vec<LiteralZoneReceiptJson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LiteralZoneReceiptJson {
    pub pre_hash: String,
    pub post_hash: String,
    pub preserved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationErrorJson {
    pub code: String,
    pub field: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoutingEntryJson {
    pub field: String,
    pub target: String,
    pub value_hash: String,
    pub sealed_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepairEntryJson {
    pub rule_id: String,
    pub tier: String,
    pub line: usize,
    pub column: usize,
    pub before: String,
    pub after: String,
    pub safe: bool,
    pub semantics_changed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct WriteResponse {
    pub canonical_text: String,
    pub digest: String,
    pub idempotent: bool,
    pub contains_literal_zones: bool,
    pub literal_zones_preserved: bool,
    pub literal_zone_receipts: Vec<LiteralZoneReceiptJson>,
    pub repairs: Vec<RepairEntryJson>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EjectResponse {
    pub mode: String,
    pub lossy: bool,
    pub fields_omitted: Vec<String>,
    pub text: String,
}

fn tier_name(tier: RepairTier) -> &'static str {
    match tier {
        RepairTier::Normalization => "normalization",
        RepairTier::Repair => "repair",
        RepairTier::Forbidden => "forbidden",
    }
}

fn mode_name(mode: ProjectionMode) -> &'static str {
    match mode {
        ProjectionMode::Canonical => "canonical",
        ProjectionMode::Authoring => "authoring",
        ProjectionMode::Executive => "executive",
        ProjectionMode::Developer => "developer",
    }
}

fn repair_entries_json(output: &PipelineOutput) -> Vec<RepairEntryJson> {
    output
        .repairs
        .entries
        .iter()
        .map(|e| RepairEntryJson {
            rule_id: e.rule_id.clone(),
            tier: tier_name(e.tier).to_string(),
            line: e.line,
            column: e.column,
            before: e.before.clone(),
            after: e.after.clone(),
            safe: e.safe,
            semantics_changed: e.semantics_changed,
        })
        .collect()
}

fn literal_zone_receipts_json(output: &PipelineOutput) -> Vec<LiteralZoneReceiptJson> {
    output
        .literal_zone_receipts
        .iter()
        .map(|r| LiteralZoneReceiptJson {
            pre_hash: r.pre_hash.clone(),
            post_hash: r.post_hash.clone(),
            preserved: r.preserved(),
        })
        .collect()
}

pub fn validate_response(output: &PipelineOutput) -> ValidateResponse {
    ValidateResponse {
        valid: output.validation.is_valid(),
        errors: output
            .validation
            .errors
            .iter()
            .map(|e| ValidationErrorJson { code: e.code.to_string(), field: e.field.clone(), message: e.message.clone() })
            .collect(),
        warnings: output.validation.warnings.clone(),
        routing: output
            .validation
            .routing
            .iter()
            .map(|r| RoutingEntryJson {
                field: r.field.clone(),
                target: r.target.clone(),
                value_hash: r.value_hash.clone(),
                sealed_at: r.sealed_at.clone(),
            })
            .collect(),
        repairs: repair_entries_json(output),
        contains_literal_zones: output.contains_literal_zones,
        literal_zone_receipts: literal_zone_receipts_json(output),
    }
}

pub fn write_response(output: &PipelineOutput) -> WriteResponse {
    let checks: Vec<bool> = output.literal_zone_receipts.iter().map(|r| r.preserved()).collect();
    WriteResponse {
        canonical_text: output.canonical_text.clone(),
        digest: output.seal.digest.clone(),
        idempotent: output.seal.idempotent,
        contains_literal_zones: output.contains_literal_zones,
        literal_zones_preserved: all_preserved(&checks),
        literal_zone_receipts: literal_zone_receipts_json(output),
        repairs: repair_entries_json(output),
    }
}

pub fn eject_response(output: &PipelineOutput, mode: ProjectionMode) -> EjectResponse {
    EjectResponse {
        mode: mode_name(mode).to_string(),
        lossy: output.projection.lossy,
        fields_omitted: output.projection.fields_omitted.clone(),
        text: crate::octave::emitter::emit_document(
            &output.projection.document,
            &crate::octave::emitter::FormatOptions::default(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::octave::pipeline::{self, PipelineConfig};

    #[test]
    fn validate_response_reports_valid_for_clean_document() {
        let source = "===TEST===\nFIELD::\"value\"\n===END===\n";
        let output = pipeline::run(source, &PipelineConfig::default(), "2026-08-01T00:00:00Z").unwrap();
        let resp = validate_response(&output);
        assert!(resp.valid);
        assert!(resp.errors.is_empty());
    }
}
