//! Nokia SR Linux platform definition.
//!
//! # Prompt Examples
//!
//! ```text
//! --{ running }--[  ]--                          # context toolbar
//! A:srl1#                                        # prompt
//! --{ + candidate shared default }--[ interface ethernet-1/1 ]--
//! A:srl1#
//! ```
//!
//! The prompt line is identical in every mode, so completion is detected on
//! the `running` toolbar instead. Pressing enter redraws the toolbar above
//! the echoed command, so each read waits for the second toolbar.

use std::sync::Arc;

use crate::channel::Anchor;
use crate::platform::{CliMode, DeviceType, PlatformDefinition, VendorBehavior, completion_anchor};

/// Platform name for Nokia SR Linux.
pub const PLATFORM_NAME: &str = "nokia_srl";

const TOOLBAR_OCCURRENCES: usize = 2;

/// Create the Nokia SR Linux platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(PLATFORM_NAME, DeviceType::NokiaSrl)
        .with_failure_pattern("Error:")
        .with_failure_pattern("Parsing error")
        .with_terminal_type("xterm")
        .with_terminal_size(511, 24)
        .with_behavior(Arc::new(SrlBehavior))
}

/// Nokia SR Linux-specific behavior.
pub struct SrlBehavior;

impl VendorBehavior for SrlBehavior {
    fn frame_configuration(&self, commands: &[&str]) -> Option<Vec<String>> {
        let mut framed = Vec::with_capacity(commands.len() + 2);
        framed.push("enter candidate".to_string());
        framed.extend(commands.iter().map(|c| c.to_string()));
        framed.push("commit now".to_string());
        Some(framed)
    }

    fn operational_anchor(&self, prompt: &str) -> Result<Anchor, regex::Error> {
        completion_anchor(
            DeviceType::NokiaSrl,
            CliMode::Operational,
            prompt,
            TOOLBAR_OCCURRENCES,
        )
    }

    fn configuration_anchor(&self, prompt: &str, _framed: &[String]) -> Result<Anchor, regex::Error> {
        completion_anchor(
            DeviceType::NokiaSrl,
            CliMode::Configuration,
            prompt,
            TOOLBAR_OCCURRENCES,
        )
    }

    fn post_process_output(&self, output: &str, _mode: CliMode) -> String {
        output
            .lines()
            .filter(|line| !is_toolbar(line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// `--{ ... }--[ ... ]--`
fn is_toolbar(line: &str) -> bool {
    let line = line.trim();
    line.starts_with("--{") && line.ends_with("]--") && line.contains("}--[")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_srl_platform() {
        let platform = platform();
        assert_eq!(platform.name, "nokia_srl");
        assert!(platform.on_open_commands.is_empty());
        assert_eq!(platform.detect_failure("Parsing error: Unknown token 'foo'"), Some("Parsing error"));
        assert!(platform.validate().is_ok());
    }

    #[test]
    fn test_operational_waits_for_second_toolbar() {
        let anchor = SrlBehavior.operational_anchor("A:srl1").unwrap();
        assert_eq!(anchor.occurrences(), 2);

        let partial = b"--{ running }--[  ]--\r\nA:srl1# show version\r\nHostname : srl1\r\n";
        assert!(!anchor.is_satisfied(partial));

        let full = b"--{ running }--[  ]--\r\nA:srl1# show version\r\nHostname : srl1\r\n\r\n--{ running }--[  ]--\r\nA:srl1# ";
        assert!(anchor.is_satisfied(full));
    }

    #[test]
    fn test_operational_output_trimmed() {
        let framed = SrlBehavior.frame_operational("show version");
        let anchor = SrlBehavior.operational_anchor("A:srl1").unwrap();
        let raw = "show version\r\n--{ running }--[  ]--\r\nA:srl1# show version\r\n\
                   ---------------------------------------\r\n\
                   Hostname          : srl1\r\n\
                   Software Version  : v23.10.1\r\n\
                   ---------------------------------------\r\n\
                   \r\n--{ running }--[  ]--\r\nA:srl1# ";

        let out = SrlBehavior
            .trim_output(raw, &framed, "A:srl1", &anchor, CliMode::Operational)
            .unwrap();
        assert!(out.starts_with("------"));
        assert!(out.contains("Software Version  : v23.10.1"));
        assert!(!out.contains("running"));
    }

    #[test]
    fn test_configuration_completes_after_commit() {
        let framed = SrlBehavior
            .frame_configuration(&["set / system information location lab"])
            .unwrap();
        assert_eq!(
            framed,
            vec!["enter candidate", "set / system information location lab", "commit now"]
        );

        let anchor = SrlBehavior.configuration_anchor("A:srl1", &framed).unwrap();
        let raw = "enter candidate\r\n--{ running }--[  ]--\r\nA:srl1# enter candidate\r\n\
                   --{ candidate shared default }--[  ]--\r\nA:srl1# set / system information location lab\r\n\
                   --{ * candidate shared default }--[  ]--\r\nA:srl1# commit now\r\n\
                   All changes have been committed. Leaving candidate mode.\r\n\
                   --{ + running }--[  ]--\r\nA:srl1# ";
        assert!(anchor.is_satisfied(raw.as_bytes()));

        let out = SrlBehavior
            .trim_output(raw, &framed, "A:srl1", &anchor, CliMode::Configuration)
            .unwrap();
        assert_eq!(out, "All changes have been committed. Leaving candidate mode.");
    }

    #[test]
    fn test_toolbar_detection() {
        assert!(is_toolbar("--{ running }--[  ]--"));
        assert!(is_toolbar("--{ + candidate shared default }--[ interface ethernet-1/1 ]--"));
        assert!(!is_toolbar("---------------------------------------"));
    }
}
