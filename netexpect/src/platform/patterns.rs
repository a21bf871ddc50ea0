//! Compiled pattern table.
//!
//! Every vendor regex is compiled once, on first use, into a read-only
//! process-wide table keyed by device type and pattern role. Nothing
//! mutates the table after initialisation, so concurrent sessions share it
//! without locking.

use std::collections::HashMap;

use log::error;
use once_cell::sync::Lazy;
use regex::bytes::Regex;

use super::{CliMode, DeviceType};
use crate::channel::Anchor;

/// Role a pattern plays for a device type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternKind {
    /// Prompt discovery; capture group 1 is the prompt.
    Prompt,
    /// Marks the end of the login banner during connect.
    Terminator,
    /// Appended to the escaped prompt to build a completion anchor.
    PromptSuffix(CliMode),
    /// Standalone completion marker, matched alongside or instead of the prompt.
    Marker(CliMode),
}

const SRL_RUNNING_CONTEXT: &str = r"--\{[^}\r\n]*running[^}\r\n]*\}--";
const JUNOS_CONFIG_MARKER: &str = r"\[edit[^\]\r\n]*\]|commit complete";
const IOSXR_CONFIG_SUFFIX: &str = r"(?:\([^)\r\n]*\))?#";

fn sources() -> Vec<((DeviceType, PatternKind), &'static str)> {
    use CliMode::{Configuration, Operational};
    use DeviceType::*;
    use PatternKind::*;

    vec![
        (
            (CiscoIosxr, Prompt),
            r"(?m)(RP/\d+/(?:RP|RSP)?\d+/CPU\d+:[\w\-\.]+)(?:\([\w\-\./:]+\))?#\s*$",
        ),
        ((CiscoIosxr, Terminator), r"#\s*$"),
        ((CiscoIosxr, PromptSuffix(Operational)), "#"),
        ((CiscoIosxr, PromptSuffix(Configuration)), IOSXR_CONFIG_SUFFIX),
        ((JuniperJunos, Prompt), r"(?m)([\w\-\.]+@[\w\-\.]+)>\s*$"),
        ((JuniperJunos, Terminator), r">\s*$"),
        ((JuniperJunos, PromptSuffix(Operational)), ">"),
        ((JuniperJunos, PromptSuffix(Configuration)), ">"),
        ((JuniperJunos, Marker(Configuration)), JUNOS_CONFIG_MARKER),
        ((NokiaSros, Prompt), r"(?m)^\*?([ABCD]:[\w\-\.@]+)[#%$]\s*$"),
        ((NokiaSros, Terminator), r"[#%$]\s*$"),
        ((NokiaSros, PromptSuffix(Operational)), r"\S*?[#%$]"),
        ((NokiaSros, PromptSuffix(Configuration)), r"\S*?[#%$]"),
        (
            (NokiaSrl, Prompt),
            r"(?m)^(?:--\{[^}\r\n]*\}--\[[^\]\r\n]*\]--[ \t]*\r?\n)?\*?([ABCD]:[\w\-\.@]+)#\s*$",
        ),
        ((NokiaSrl, Terminator), r"#\s*$"),
        ((NokiaSrl, Marker(Operational)), SRL_RUNNING_CONTEXT),
        ((NokiaSrl, Marker(Configuration)), SRL_RUNNING_CONTEXT),
    ]
}

static PATTERNS: Lazy<HashMap<(DeviceType, PatternKind), Regex>> = Lazy::new(|| {
    sources()
        .into_iter()
        .filter_map(|(key, source)| match Regex::new(source) {
            Ok(re) => Some((key, re)),
            Err(e) => {
                error!("built-in pattern {:?} failed to compile: {}", key, e);
                None
            }
        })
        .collect()
});

/// Look up a compiled pattern.
pub fn pattern(device: DeviceType, kind: PatternKind) -> Option<&'static Regex> {
    PATTERNS.get(&(device, kind))
}

/// Build the completion anchor for `device` in `mode` around a discovered
/// prompt.
///
/// The anchor is the escaped prompt followed by the mode's prompt suffix,
/// the mode's marker, or both as alternatives, depending on which entries
/// the table holds for the device.
pub fn completion_anchor(
    device: DeviceType,
    mode: CliMode,
    prompt: &str,
    occurrences: usize,
) -> Result<Anchor, regex::Error> {
    let marker = pattern(device, PatternKind::Marker(mode)).map(|re| re.as_str());
    let suffix = pattern(device, PatternKind::PromptSuffix(mode)).map(|re| re.as_str());

    let prompt_part = suffix.map(|s| format!("{}{}", regex::escape(prompt), s));
    let source = match (marker, prompt_part) {
        (Some(m), Some(p)) => format!("(?:{m})|(?:{p})"),
        (Some(m), None) => m.to_string(),
        (None, Some(p)) => p,
        (None, None) => regex::escape(prompt),
    };

    Anchor::compile(&source, occurrences)
}
