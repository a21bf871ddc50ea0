//! Juniper JUNOS platform definition.
//!
//! # Prompt Examples
//!
//! ```text
//! user@router>              # operational mode
//! user@router#              # configuration mode
//! {master:0}                # routing-engine indicator (separate line)
//! user@router>              # operational prompt on next line
//! [edit]                    # configuration context marker
//! user@router#
//! ```
//!
//! # Completion
//!
//! Operational commands are sent with `| no-more` and complete on the
//! `user@host>` prompt. A configuration batch is framed as
//!
//! ```text
//! configure
//! <commands...>
//! commit and-quit
//! ```
//!
//! and completes once the `[edit]`/`commit complete`/exec-prompt marker has
//! been seen once per framed line plus once more for `commit complete`:
//! four times for a single command.

use std::sync::Arc;

use crate::channel::Anchor;
use crate::platform::{CliMode, DeviceType, PlatformDefinition, VendorBehavior, completion_anchor};

/// Platform name for Juniper JUNOS.
pub const PLATFORM_NAME: &str = "juniper_junos";

const NO_MORE: &str = "| no-more";

/// Create the Juniper JUNOS platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(PLATFORM_NAME, DeviceType::JuniperJunos)
        .with_failure_pattern("unknown command")
        .with_failure_pattern("syntax error")
        .with_failure_pattern("error:")
        .with_failure_pattern("missing argument")
        .with_failure_pattern("is ambiguous")
        .with_failure_pattern("No valid completions")
        .with_failure_pattern("invalid numeric value")
        .with_on_open_command("set cli screen-length 0")
        .with_terminal_type("xterm")
        .with_terminal_size(511, 24)
        .with_behavior(Arc::new(JuniperBehavior))
}

/// Juniper JUNOS-specific behavior.
pub struct JuniperBehavior;

impl VendorBehavior for JuniperBehavior {
    fn frame_operational(&self, command: &str) -> Vec<String> {
        if command.contains(NO_MORE) {
            vec![command.to_string()]
        } else {
            vec![format!("{command} {NO_MORE}")]
        }
    }

    fn frame_configuration(&self, commands: &[&str]) -> Option<Vec<String>> {
        let mut framed = Vec::with_capacity(commands.len() + 2);
        framed.push("configure".to_string());
        framed.extend(commands.iter().map(|c| c.to_string()));
        framed.push("commit and-quit".to_string());
        Some(framed)
    }

    fn operational_anchor(&self, prompt: &str) -> Result<Anchor, regex::Error> {
        completion_anchor(DeviceType::JuniperJunos, CliMode::Operational, prompt, 1)
    }

    fn configuration_anchor(&self, prompt: &str, framed: &[String]) -> Result<Anchor, regex::Error> {
        // One marker per framed line, plus "commit complete"
        completion_anchor(
            DeviceType::JuniperJunos,
            CliMode::Configuration,
            prompt,
            framed.len() + 1,
        )
    }

    fn post_process_output(&self, output: &str, mode: CliMode) -> String {
        output
            .lines()
            .filter(|line| !is_routing_engine_indicator(line))
            .filter(|line| match mode {
                CliMode::Operational => true,
                CliMode::Configuration => {
                    let line = line.trim();
                    !(line.starts_with("[edit")
                        || line == "Entering configuration mode"
                        || line == "Exiting configuration mode")
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `{master:0}`, `{backup}`, `{primary:node1}`...
fn is_routing_engine_indicator(line: &str) -> bool {
    let line = line.trim();
    line.len() > 2
        && line.starts_with('{')
        && line.ends_with('}')
        && line[1..line.len() - 1]
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == ':')
}
