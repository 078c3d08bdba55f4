//! Literal-zone fence detection (spec §4.1 item 1, invariant §3.4).
//!
//! Runs before normalization: content between matching fences is never
//! Unicode-normalized, never alias-folded, never trimmed. The scanner finds
//! fence boundaries only; it does not interpret the content between them.

use crate::octave::lexer::LexError;

/// A literal zone's raw extent, in line numbers (1-indexed, inclusive of the
/// fence lines themselves).
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralZone {
    pub open_line: usize,
    pub close_line: usize,
    pub fence_len: usize,
    pub info_tag: Option<String>,
    pub indent: usize,
    /// Verbatim bytes between the fences, not including the fence lines.
    pub content: String,
}

/// Result of scanning one source document for fences: the zones found, plus
/// the original lines with zone bodies (but not the fence lines) replaced by
/// `None` so the rest of the lexer can skip over them while preserving line
/// numbering for diagnostics.
pub struct FenceScan {
    pub zones: Vec<LiteralZone>,
}

fn backtick_run_len(trimmed: &str) -> usize {
    trimmed.chars().take_while(|&c| c == '`').count()
}

/// Scans `lines` (already split on `\n`, no trailing newlines) for fenced
/// literal zones. A fence-open line is any line whose first non-whitespace
/// content is a run of 3+ backticks. The closing fence must have a backtick
/// run at least as long as the opening run, followed only by whitespace.
pub fn scan(lines: &[&str]) -> Result<FenceScan, LexError> {
    let mut zones = Vec::new();
    let mut i = 0usize;
    while i < lines.len() {
        let line = lines[i];
        let indent = line.len() - line.trim_start_matches(' ').len();
        let trimmed = line.trim_start();
        let run = backtick_run_len(trimmed);
        if run >= 3 {
            let info_tag = trimmed[run..].trim().to_string();
            let info_tag = if info_tag.is_empty() { None } else { Some(info_tag) };
            let open_line = i + 1;
            let fence_len = run;
            let mut j = i + 1;
            let mut content_lines = Vec::new();
            let mut closed = false;
            while j < lines.len() {
                let candidate = lines[j];
                let candidate_trimmed = candidate.trim_start();
                let candidate_run = backtick_run_len(candidate_trimmed);
                if candidate_run >= fence_len {
                    let after: &str = &candidate_trimmed[candidate_run..];
                    if after.trim().is_empty() {
                        closed = true;
                        break;
                    } else {
                        return Err(LexError::new(
                            "E007",
                            open_line,
                            indent + 1,
                            format!(
                                "nested literal zone: line {} opens a {}-backtick fence inside an open zone",
                                j + 1,
                                candidate_run
                            ),
                            "close the outer fence before starting a new one, or use a longer backtick run for the outer fence",
                        ));
                    }
                }
                content_lines.push(candidate);
                j += 1;
            }
            if !closed {
                return Err(LexError::new(
                    "E006",
                    open_line,
                    indent + 1,
                    "unterminated literal zone: no closing fence found before end of input",
                    "add a closing fence with at least as many backticks as the opening fence",
                ));
            }
            zones.push(LiteralZone {
                open_line,
                close_line: j + 1,
                fence_len,
                info_tag,
                indent,
                content: content_lines.join("\n"),
            });
            i = j + 1;
        } else {
            i += 1;
        }
    }
    Ok(FenceScan { zones })
}
