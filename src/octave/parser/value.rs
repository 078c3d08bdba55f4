//! Value grammar (spec §4.2).
//!
//! Precedence, loosest to tightest: flow (`→`) › alternative (`∨`) ›
//! constraint (`∧`) › tension (`⇌`) › synthesis (`⊕`) › concat (`⧺`) ›
//! primaries. Every level that sees no operator simply returns its child's
//! value unchanged; a level that consumes at least one operator collapses
//! the whole chain into a single stringified [`Value::Flow`], per spec §3's
//! "flow expression" value kind.
//!
//! The "bracket annotation" post-value step (spec's redesign note on GH#261)
//! is centralized in [`finish_value`], which every value-producing path —
//! primaries, and each precedence level's final result — routes through.

use super::{Parser, ParserError};
use crate::octave::ast::{Constraint, HolographicPattern, LiteralZoneValue, Value, WarningKind};
use crate::octave::token::TokenKind;

pub fn parse_value(p: &mut Parser) -> Result<Value, ParserError> {
    let v = parse_flow(p)?;
    finish_value(p, v)
}

macro_rules! precedence_level {
    ($name:ident, $next:ident, $tok:pat, $glyph:expr) => {
        fn $name(p: &mut Parser) -> Result<Value, ParserError> {
            let mut lhs = $next(p)?;
            let mut chain_text: Option<String> = None;
            while matches!(p.peek(), $tok) {
                p.advance();
                let rhs = $next(p)?;
                let lhs_text = chain_text.take().unwrap_or_else(|| operand_text(&lhs));
                chain_text = Some(format!("{}{}{}", lhs_text, $glyph, operand_text(&rhs)));
                lhs = rhs;
            }
            Ok(match chain_text {
                Some(text) => Value::Flow(text),
                None => lhs,
            })
        }
    };
}

precedence_level!(parse_alternative, parse_constraint, TokenKind::Alternative, "∨");
precedence_level!(parse_constraint, parse_tension, TokenKind::Constraint, "∧");
precedence_level!(parse_tension, parse_synthesis, TokenKind::Tension, "⇌");
precedence_level!(parse_synthesis, parse_concat, TokenKind::Synthesis, "⊕");
precedence_level!(parse_concat, parse_primary, TokenKind::Concat, "⧺");

fn parse_flow(p: &mut Parser) -> Result<Value, ParserError> {
    let mut lhs = parse_alternative(p)?;
    let mut chain_text: Option<String> = None;
    while matches!(p.peek(), TokenKind::Flow) {
        p.advance();
        // `→§TARGET` inside a holographic pattern is handled by the caller
        // that assembled the pattern; a bare flow chain's RHS is an ordinary
        // operand.
        let rhs = parse_alternative(p)?;
        let lhs_text = chain_text.take().unwrap_or_else(|| operand_text(&lhs));
        chain_text = Some(format!("{lhs_text}→{}", operand_text(&rhs)));
        lhs = rhs;
    }
    Ok(match chain_text {
        Some(text) => Value::Flow(text),
        None => lhs,
    })
}

/// Renders a value as it would appear as an operand inside a larger flow
/// chain's stringified text.
fn operand_text(v: &Value) -> String {
    match v {
        Value::Scalar(s) => s.clone(),
        Value::Number(s) => s.clone(),
        Value::Null => "null".to_string(),
        Value::Absent => String::new(),
        Value::Variable(s) => s.clone(),
        Value::Flow(s) => s.clone(),
        Value::List(items) => {
            format!("[{}]", items.iter().map(operand_text).collect::<Vec<_>>().join(","))
        }
        Value::InlineMap(pairs) => format!(
            "[{}]",
            pairs.iter().map(|(k, v)| format!("{k}::{}", operand_text(v))).collect::<Vec<_>>().join(",")
        ),
        Value::LiteralZone(z) => z.content.clone(),
        Value::Holographic(_) => String::new(),
    }
}

fn parse_primary(p: &mut Parser) -> Result<Value, ParserError> {
    let v = match p.peek().clone() {
        TokenKind::String(s) => {
            p.advance();
            Value::Scalar(s)
        }
        TokenKind::Number(n) => {
            p.advance();
            Value::Number(n)
        }
        TokenKind::Variable(v) => {
            p.advance();
            Value::Variable(v)
        }
        TokenKind::Identifier(name) => {
            p.advance();
            if name == "null" {
                Value::Null
            } else if matches!(p.peek(), TokenKind::ListOpen) {
                parse_named_args(p, &name)?
            } else {
                Value::Scalar(name)
            }
        }
        TokenKind::ListOpen => parse_list_or_holographic(p)?,
        // `§TARGET` as a flow operand (a holographic pattern's routing
        // target); distinct from a top-level `§ID::NAME` section header,
        // which `Parser::parse_section_node` handles separately.
        TokenKind::SectionMarker => {
            p.advance();
            let target = match p.peek().clone() {
                TokenKind::Identifier(s) => {
                    p.advance();
                    s
                }
                TokenKind::SectionId(s) => {
                    p.advance();
                    s
                }
                other => {
                    return Err(ParserError::new(
                        "E_PARSE",
                        p.loc().line,
                        p.loc().column,
                        format!("expected routing target after '§', found {other}"),
                    ))
                }
            };
            Value::Scalar(format!("§{target}"))
        }
        TokenKind::FenceOpen { fence_len, info_tag } => {
            p.advance();
            let content = match p.peek().clone() {
                TokenKind::LiteralContent(c) => {
                    p.advance();
                    c
                }
                _ => String::new(),
            };
            p.expect(TokenKind::FenceClose, "literal zone close")?;
            Value::LiteralZone(LiteralZoneValue {
                content,
                info_tag,
                fence_marker: "`".repeat(fence_len),
            })
        }
        other => {
            return Err(ParserError::new(
                "E_PARSE",
                p.loc().line,
                p.loc().column,
                format!("unexpected token {other} in value position"),
            ))
        }
    };
    Ok(v)
}

/// `NAME[args]` — used both for holographic-pattern constraints
/// (`ENUM[A,B]`, `CONST[C]`) and ordinary constructor calls (`REGEX["..."]`).
fn parse_named_args(p: &mut Parser, name: &str) -> Result<Value, ParserError> {
    p.expect(TokenKind::ListOpen, "'['")?;
    let mut args = Vec::new();
    while !matches!(p.peek(), TokenKind::ListClose) {
        args.push(parse_value(p)?);
        if matches!(p.peek(), TokenKind::Comma) {
            p.advance();
        } else {
            break;
        }
    }
    p.expect(TokenKind::ListClose, "']'")?;
    Ok(Value::Flow(format!(
        "{name}[{}]",
        args.iter().map(operand_text).collect::<Vec<_>>().join(",")
    )))
}

/// Consumes zero or more trailing `[...]` bracket-annotation groups
/// immediately following a value, discarding their content (spec §4.2).
fn finish_value(p: &mut Parser, v: Value) -> Result<Value, ParserError> {
    while matches!(p.peek(), TokenKind::ListOpen) {
        p.advance();
        let mut depth = 1;
        while depth > 0 {
            match p.peek() {
                TokenKind::ListOpen => depth += 1,
                TokenKind::ListClose => depth -= 1,
                TokenKind::Eof => break,
                _ => {}
            }
            p.advance();
        }
        // annotation content discarded; value itself is unchanged
    }
    Ok(v)
}

fn parse_list_or_holographic(p: &mut Parser) -> Result<Value, ParserError> {
    p.expect(TokenKind::ListOpen, "'['")?;
    let mut items = Vec::new();
    let mut first_item_head_is_string = false;
    loop {
        while matches!(p.peek(), TokenKind::Comment(_)) {
            p.advance();
        }
        if matches!(p.peek(), TokenKind::ListClose | TokenKind::Eof) {
            break;
        }
        if items.is_empty() {
            first_item_head_is_string = matches!(p.peek(), TokenKind::String(_));
        }
        items.push(parse_list_item(p)?);
        while matches!(p.peek(), TokenKind::Comment(_)) {
            p.advance();
        }
        match p.peek() {
            TokenKind::Comma => {
                p.advance();
            }
            TokenKind::Newline => {
                p.advance();
            }
            _ => break,
        }
    }
    if matches!(p.peek(), TokenKind::ListClose) {
        p.advance();
    } else {
        p.warn(
            WarningKind::UnclosedListAutoClosed,
            "list",
            "unclosed list at end of input, auto-closed".to_string(),
        );
    }

    if items.len() == 1 {
        if let Some(pattern) = try_as_holographic(p, &items[0], first_item_head_is_string) {
            return Ok(Value::Holographic(pattern));
        }
    }
    Ok(Value::List(items))
}

/// A numbered-key inline map item (`1::"A"`) is kept as a single-pair
/// `InlineMap`, never flattened (spec §4.2, GH#246).
fn parse_list_item(p: &mut Parser) -> Result<Value, ParserError> {
    if let TokenKind::Number(n) = p.peek().clone() {
        if matches!(p.peek_at(1), TokenKind::Assign) {
            p.advance();
            p.advance();
            let v = parse_value(p)?;
            return Ok(Value::InlineMap(vec![(n, v)]));
        }
    }
    if matches!(p.peek(), TokenKind::ListOpen) {
        return parse_inline_map_or_list(p);
    }
    parse_value(p)
}

fn parse_inline_map_or_list(p: &mut Parser) -> Result<Value, ParserError> {
    // Disambiguate `[k::v, ...]` (inline map) from `[a, b]` (nested list) by
    // lookahead: an inline map's first element is `IDENT::`.
    let is_map = matches!(p.peek(), TokenKind::Identifier(_)) || matches!(p.peek(), TokenKind::Number(_));
    let is_map = is_map && matches!(p.peek_at(1), TokenKind::Assign);
    if !is_map {
        return parse_list_or_holographic(p);
    }
    p.expect(TokenKind::ListOpen, "'['")?;
    let mut pairs = Vec::new();
    loop {
        if matches!(p.peek(), TokenKind::ListClose | TokenKind::Eof) {
            break;
        }
        let key = match p.peek().clone() {
            TokenKind::Identifier(s) => s,
            TokenKind::Number(s) => s,
            other => {
                return Err(ParserError::new(
                    "E_PARSE",
                    p.loc().line,
                    p.loc().column,
                    format!("expected inline map key, found {other}"),
                ))
            }
        };
        p.advance();
        p.expect(TokenKind::Assign, "'::'")?;
        let value = parse_value(p)?;
        if !value.is_atomic() {
            return Err(ParserError::new(
                "E_NESTED_INLINE_MAP",
                p.loc().line,
                p.loc().column,
                "inline map values must be atomic; nested inline maps are not allowed",
            ));
        }
        pairs.push((key, value));
        if matches!(p.peek(), TokenKind::Comma) {
            p.advance();
        } else {
            break;
        }
    }
    p.expect(TokenKind::ListClose, "']'")?;
    Ok(Value::InlineMap(pairs))
}

/// Recognizes `["example"∧REQ∧ENUM[...]→§TARGET]` once the single-element
/// list has already been parsed as a `Value::Flow` chain. `head_is_string`
/// is captured by the caller via lookahead before the chain was parsed,
/// since by this point `operand_text` has already stripped the quotes off
/// a scalar and a textual quote check can never fire.
fn try_as_holographic(p: &mut Parser, item: &Value, head_is_string: bool) -> Option<HolographicPattern> {
    let text = match item {
        Value::Flow(s) => s.clone(),
        _ => return None,
    };
    let (chain, target) = match text.split_once('→') {
        Some((chain, target)) if target.starts_with('§') => {
            (chain.to_string(), Some(target.trim_start_matches('§').to_string()))
        }
        _ => (text.clone(), None),
    };
    let mut parts = chain.split('∧');
    let example = parts.next()?.to_string();
    if !head_is_string {
        p.warn(
            WarningKind::MalformedHolographic,
            "holographic",
            format!("holographic pattern head '{example}' is not a string literal"),
        );
        return None;
    }
    let mut constraints = Vec::new();
    for part in parts {
        constraints.push(parse_constraint_term(part));
    }
    if constraints.is_empty() {
        return None;
    }
    Some(HolographicPattern { example, constraints, target })
}

fn parse_constraint_term(term: &str) -> Constraint {
    if term == "REQ" {
        return Constraint::Required;
    }
    if term == "OPT" {
        return Constraint::Optional;
    }
    if let Some(rest) = term.strip_prefix("ENUM[") {
        let inner = rest.trim_end_matches(']');
        return Constraint::Enum(inner.split(',').map(|s| s.trim().to_string()).collect());
    }
    if let Some(rest) = term.strip_prefix("TYPE[") {
        return Constraint::Type(rest.trim_end_matches(']').to_string());
    }
    if let Some(rest) = term.strip_prefix("REGEX[") {
        return Constraint::Regex(rest.trim_end_matches(']').trim_matches('"').to_string());
    }
    Constraint::Named(term.to_string())
}
