//! Cisco IOS-XR platform definition.
//!
//! # Prompt Examples
//!
//! ```text
//! RP/0/RP0/CPU0:R1#                 # exec
//! RP/0/RSP0/CPU0:pe1(config)#       # configuration
//! RP/0/RP0/CPU0:R1(config-if)#      # configuration submode
//! ```
//!
//! The stored prompt is the part before any `(config...)` suffix and the
//! trailing `#`, so one prompt serves both modes.

use std::sync::Arc;

use crate::channel::Anchor;
use crate::platform::{CliMode, DeviceType, PlatformDefinition, VendorBehavior, completion_anchor};

/// Platform name for Cisco IOS-XR.
pub const PLATFORM_NAME: &str = "cisco_iosxr";

/// Create the Cisco IOS-XR platform definition.
pub fn platform() -> PlatformDefinition {
    PlatformDefinition::new(PLATFORM_NAME, DeviceType::CiscoIosxr)
        .with_failure_pattern("% Invalid input detected")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Failed to commit")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_terminal_type("xterm")
        .with_terminal_size(511, 24)
        .with_behavior(Arc::new(IosxrBehavior))
}

/// Cisco IOS-XR-specific behavior.
pub struct IosxrBehavior;

impl VendorBehavior for IosxrBehavior {
    fn frame_configuration(&self, commands: &[&str]) -> Option<Vec<String>> {
        let mut framed = Vec::with_capacity(commands.len() + 3);
        framed.push("configure".to_string());
        framed.extend(commands.iter().map(|c| c.to_string()));
        framed.push("commit".to_string());
        framed.push("end".to_string());
        Some(framed)
    }

    fn operational_anchor(&self, prompt: &str) -> Result<Anchor, regex::Error> {
        completion_anchor(DeviceType::CiscoIosxr, CliMode::Operational, prompt, 1)
    }

    fn configuration_anchor(&self, prompt: &str, framed: &[String]) -> Result<Anchor, regex::Error> {
        // Every framed line, `end` included, is answered by one prompt
        completion_anchor(
            DeviceType::CiscoIosxr,
            CliMode::Configuration,
            prompt,
            framed.len(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPT: &str = "RP/0/RP0/CPU0:R1";

    #[test]
    fn test_iosxr_platform() {
        let platform = platform();
        assert_eq!(platform.name, "cisco_iosxr");
        assert_eq!(
            platform.on_open_commands,
            vec!["terminal length 0", "terminal width 511"]
        );
        assert_eq!(platform.terminal_type, "xterm");
        assert!(platform.validate().is_ok());
    }

    #[test]
    fn test_configuration_framing() {
        let framed = IosxrBehavior.frame_configuration(&["hostname R1"]).unwrap();
        assert_eq!(framed, vec!["configure", "hostname R1", "commit", "end"]);

        let anchor = IosxrBehavior.configuration_anchor(PROMPT, &framed).unwrap();
        assert_eq!(anchor.occurrences(), 4);
    }

    #[test]
    fn test_operational_anchor_ignores_other_hosts() {
        let anchor = IosxrBehavior.operational_anchor(PROMPT).unwrap();
        assert!(anchor.is_satisfied(b"RP/0/RP0/CPU0:R1#"));
        assert!(!anchor.is_satisfied(b"RP/0/RP0/CPU0:R11#"));
        assert!(!anchor.is_satisfied(b"RP/0/RP0/CPU0:R1(config)#"));
    }

    #[test]
    fn test_configuration_output_trimmed() {
        let framed = IosxrBehavior
            .frame_configuration(&["interface Loopback0 description test"])
            .unwrap();
        let anchor = IosxrBehavior.configuration_anchor(PROMPT, &framed).unwrap();
        let raw = "configure\r\n\
                   Mon Jan  1 10:00:00.000 UTC\r\n\
                   RP/0/RP0/CPU0:R1(config)#interface Loopback0 description test\r\n\
                   RP/0/RP0/CPU0:R1(config)#commit\r\n\
                   Mon Jan  1 10:00:01.000 UTC\r\n\
                   RP/0/RP0/CPU0:R1(config)#end\r\n\
                   RP/0/RP0/CPU0:R1#";

        assert!(anchor.is_satisfied(raw.as_bytes()));
        let out = IosxrBehavior
            .trim_output(raw, &framed, PROMPT, &anchor, CliMode::Configuration)
            .unwrap();
        assert_eq!(out, "Mon Jan  1 10:00:00.000 UTC\nMon Jan  1 10:00:01.000 UTC");
    }

    #[test]
    fn test_operational_output_trimmed() {
        let framed = IosxrBehavior.frame_operational("show clock");
        let anchor = IosxrBehavior.operational_anchor(PROMPT).unwrap();
        let raw = "show clock\r\nMon Jan  1 10:00:00.000 UTC\r\n10:00:00.000 UTC Mon Jan 1 2024\r\nRP/0/RP0/CPU0:R1#";

        let out = IosxrBehavior
            .trim_output(raw, &framed, PROMPT, &anchor, CliMode::Operational)
            .unwrap();
        assert_eq!(out, "Mon Jan  1 10:00:00.000 UTC\n10:00:00.000 UTC Mon Jan 1 2024");
    }
}
