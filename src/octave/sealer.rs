//! Sealing and idempotence verification (spec §4.7).
//!
//! A seal is the SHA-256 digest of a document's canonical emission, plus the
//! UTC timestamp it was taken. Sealing also re-parses and re-emits the
//! canonical text once more to confirm idempotence before trusting the
//! digest — a seal over a non-idempotent emission would be meaningless.

use chrono::Utc;

use crate::octave::ast::Document;
use crate::octave::emitter::{self, FormatOptions};
use crate::octave::lexer::{self, LexMode};
use crate::octave::parser;
use crate::octave::validator::compute_value_hash;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Seal {
    pub digest: String,
    pub sealed_at: String,
    pub idempotent: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SealError {
    pub message: String,
}

impl std::fmt::Display for SealError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "seal failed: {}", self.message)
    }
}

impl std::error::Error for SealError {}

pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339()
}

/// Seals `doc` by emitting it canonically, hashing the result, then
/// re-lexing/re-parsing/re-emitting that text to confirm it emits
/// byte-for-byte identical output (the idempotence property spec §4.3
/// requires of the emitter).
pub fn seal_document(doc: &Document, opts: &FormatOptions, sealed_at: &str) -> Result<Seal, SealError> {
    let first = emitter::emit_document(doc, opts);
    let digest = compute_value_hash(&first);

    let idempotent = reseal_once(&first, opts).map(|second| second == first).unwrap_or(false);

    Ok(Seal { digest, sealed_at: sealed_at.to_string(), idempotent })
}

fn reseal_once(text: &str, opts: &FormatOptions) -> Result<String, SealError> {
    let lexed = lexer::tokenize(text, LexMode::Strict).map_err(|e| SealError { message: e.to_string() })?;
    let doc = parser::parse(lexed.tokens).map_err(|e| SealError { message: e.to_string() })?;
    Ok(emitter::emit_document(&doc, opts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::octave::ast::Document;

    #[test]
    fn seal_is_deterministic_for_the_same_document() {
        let doc = Document::new("TEST");
        let opts = FormatOptions::default();
        let a = seal_document(&doc, &opts, "2026-08-01T00:00:00Z").unwrap();
        let b = seal_document(&doc, &opts, "2026-08-01T00:00:00Z").unwrap();
        assert_eq!(a.digest, b.digest);
    }
}
