//! Nokia SR OS platform definition.
//!
//! Covers both CLI engines. The prompt is captured without its `#`, so the
//! same anchor matches the classic exec prompt, classic configuration
//! contexts and the MD-CLI prompt.
//!
//! # Prompt Examples
//!
//! ```text
//! A:router#                            # Classic exec
//! *A:router>config#                    # Classic config with unsaved changes
//! A:router>config>router>bgp#          # Classic config deeper context
//!
//! [/]                                  # MD-CLI exec (line 1)
//! A:admin@router#                      # MD-CLI exec (line 2)
//! *(ex)[/configure router "Base"]      # MD-CLI config with path (line 1)
//! A:admin@router#                      # MD-CLI config (line 2)
//! ```

use std::sync::Arc;

use crate::channel::Anchor;
use crate::platform::{CliMode, DeviceType, PlatformDefinition, VendorBehavior, completion_anchor};

/// Platform name for Nokia SR OS.
pub const PLATFORM_NAME: &str = "nokia_sros";

/// Create the Nokia SR OS platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(PLATFORM_NAME, DeviceType::NokiaSros)
        .with_failure_pattern("MINOR:")
        .with_failure_pattern("MAJOR:")
        .with_failure_pattern("CRITICAL:")
        .with_failure_pattern("Error:")
        .with_on_open_command("environment no more")
        .with_on_open_command("environment more false")
        .with_terminal_type("vt100")
        .with_terminal_size(511, 24)
        .with_behavior(Arc::new(SrosBehavior))
}

/// Nokia SR OS-specific behavior.
pub struct SrosBehavior;

impl VendorBehavior for SrosBehavior {
    fn frame_configuration(&self, commands: &[&str]) -> Option<Vec<String>> {
        let mut framed = Vec::with_capacity(commands.len() + 3);
        framed.push("configure exclusive".to_string());
        framed.extend(commands.iter().map(|c| c.to_string()));
        framed.push("commit".to_string());
        framed.push("exit".to_string());
        Some(framed)
    }

    fn operational_anchor(&self, prompt: &str) -> Result<Anchor, regex::Error> {
        completion_anchor(DeviceType::NokiaSros, CliMode::Operational, prompt, 1)
    }

    fn configuration_anchor(&self, prompt: &str, framed: &[String]) -> Result<Anchor, regex::Error> {
        // Each framed line is answered by exactly one prompt
        completion_anchor(
            DeviceType::NokiaSros,
            CliMode::Configuration,
            prompt,
            framed.len(),
        )
    }

    fn post_process_output(&self, output: &str, mode: CliMode) -> String {
        let mut lines: Vec<&str> = match mode {
            CliMode::Operational => output.lines().collect(),
            CliMode::Configuration => output.lines().filter(|l| !is_context_line(l)).collect(),
        };
        while lines.last().is_some_and(|l| l.trim().is_empty() || is_context_line(l)) {
            lines.pop();
        }
        lines.join("\n")
    }
}

/// MD-CLI context line such as `[/]`, `(ex)[/]` or `*(ex)[/configure router "Base"]`.
fn is_context_line(line: &str) -> bool {
    let line = line.trim().trim_start_matches('*');
    let line = match line.strip_prefix('(') {
        Some(rest) => match rest.find(')') {
            Some(close) => &rest[close + 1..],
            None => return false,
        },
        None => line,
    };
    line.starts_with("[/") && line.ends_with(']')
}
