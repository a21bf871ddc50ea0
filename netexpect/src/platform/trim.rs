//! Structural output trimming.
//!
//! Raw output holds the echo of what was typed, the command output, and the
//! prompt or mode markers that completed the read. Trimming cuts by the
//! positions of the echo and the completion match rather than by fixed line
//! counts, so short outputs trim correctly instead of underflowing.

use memchr::{memchr, memrchr};

use super::CliMode;
use crate::channel::Anchor;

/// Normalize line endings and drop stray carriage returns.
pub fn normalize_newlines(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "")
}

/// Cut the command output out of `raw`.
///
/// * `framed` - the lines that were written; `framed[0]` is the echo to find.
/// * `prompt` - the session prompt, used to drop prompt lines in
///   configuration mode.
///
/// Returns `None` when the completion match cannot be found after the echo.
/// An echo immediately followed by the completion match yields an empty
/// string.
pub fn structural_trim(
    raw: &str,
    framed: &[String],
    prompt: &str,
    anchor: &Anchor,
    mode: CliMode,
) -> Option<String> {
    let text = normalize_newlines(raw);
    let bytes = text.as_bytes();
    let echo = framed.first().map(|s| s.trim()).unwrap_or("");

    let mut body_start = match (echo.is_empty(), text.find(echo)) {
        (false, Some(pos)) => line_end(&text, pos),
        // No echo (terminal echo disabled, or empty input): trim from the top
        _ => 0,
    };

    let completion = match mode {
        CliMode::Operational => anchor
            .completion(bytes)
            .map(|r| r.start)
            .filter(|&start| start >= body_start)
            .or_else(|| anchor.pattern().find_at(bytes, body_start).map(|m| m.start())),
        CliMode::Configuration => anchor
            .completion(bytes)
            .map(|r| r.start)
            .filter(|&start| start >= body_start),
    }?;

    if mode == CliMode::Operational {
        // Earlier counted matches after the echo are a redrawn prompt; the
        // echo may follow it again.
        let redrawn = anchor
            .pattern()
            .find_iter(&bytes[..completion])
            .map(|m| m.end())
            .filter(|&end| end > body_start)
            .last();
        if let Some(end) = redrawn {
            body_start = line_end(&text, end);
            let next_line = text[body_start..completion].lines().next().unwrap_or("");
            if !echo.is_empty() && next_line.contains(echo) {
                body_start = line_end(&text, body_start);
            }
        }
    }

    let body_end = memrchr(b'\n', &bytes[..completion]).map(|nl| nl + 1).unwrap_or(0);
    let body = if body_end > body_start {
        &text[body_start..body_end]
    } else {
        ""
    };

    let trimmed = match mode {
        CliMode::Operational => body.to_string(),
        CliMode::Configuration => body
            .lines()
            .filter(|line| !is_session_chrome(line, framed, prompt, anchor))
            .collect::<Vec<_>>()
            .join("\n"),
    };

    Some(trimmed.trim_end_matches('\n').to_string())
}

fn line_end(text: &str, pos: usize) -> usize {
    memchr(b'\n', &text.as_bytes()[pos..])
        .map(|nl| pos + nl + 1)
        .unwrap_or(text.len())
}

fn is_session_chrome(line: &str, framed: &[String], prompt: &str, anchor: &Anchor) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || framed.iter().any(|f| f.trim() == trimmed)
        || (!prompt.is_empty() && trimmed.contains(prompt))
        || anchor.pattern().is_match(trimmed.as_bytes())
}
