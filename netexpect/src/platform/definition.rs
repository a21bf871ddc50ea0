//! Platform definition for vendor-specific configurations.

use std::fmt;
use std::sync::Arc;

use regex::bytes::Regex;

use super::patterns::{PatternKind, pattern};
use super::{CliMode, DefaultBehavior, DeviceType, VendorBehavior};
use crate::channel::Anchor;
use crate::error::PlatformError;

/// Platform definition containing all vendor-specific configuration.
///
/// Data lives here; framing, anchor and trimming rules live in the
/// [`VendorBehavior`] strategy attached to it.
#[derive(Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "cisco_iosxr", "juniper_junos").
    pub name: String,

    /// Device type this definition targets.
    pub device_type: DeviceType,

    /// Overrides the built-in prompt discovery regex (group 1 is the prompt).
    pub prompt_pattern: Option<Regex>,

    /// Overrides the built-in end-of-banner regex.
    pub terminator_pattern: Option<Regex>,

    /// Patterns that indicate command failure.
    pub failed_when_contains: Vec<String>,

    /// Commands to run when connection is established.
    pub on_open_commands: Vec<String>,

    /// Commands to run before connection is closed.
    pub on_close_commands: Vec<String>,

    /// Terminal type requested with the PTY.
    pub terminal_type: String,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,

    /// Vendor-specific behavior.
    pub behavior: Arc<dyn VendorBehavior>,
}

impl PlatformDefinition {
    /// Create a new platform definition for a device type.
    pub fn new(name: impl Into<String>, device_type: DeviceType) -> Self {
        Self {
            name: name.into(),
            device_type,
            prompt_pattern: None,
            terminator_pattern: None,
            failed_when_contains: vec![],
            on_open_commands: vec![],
            on_close_commands: vec![],
            terminal_type: "xterm".to_string(),
            terminal_width: 511,
            terminal_height: 24,
            behavior: Arc::new(DefaultBehavior),
        }
    }

    /// Replace the prompt discovery regex.
    pub fn with_prompt_pattern(mut self, source: &str) -> Result<Self, regex::Error> {
        self.prompt_pattern = Some(Regex::new(source)?);
        Ok(self)
    }

    /// Replace the end-of-banner regex.
    pub fn with_terminator_pattern(mut self, source: &str) -> Result<Self, regex::Error> {
        self.terminator_pattern = Some(Regex::new(source)?);
        Ok(self)
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Add an on_close command.
    pub fn with_on_close_command(mut self, command: impl Into<String>) -> Self {
        self.on_close_commands.push(command.into());
        self
    }

    /// Set the PTY terminal type.
    pub fn with_terminal_type(mut self, terminal_type: impl Into<String>) -> Self {
        self.terminal_type = terminal_type.into();
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Set vendor behavior.
    pub fn with_behavior(mut self, behavior: Arc<dyn VendorBehavior>) -> Self {
        self.behavior = behavior;
        self
    }

    /// Prompt discovery regex.
    pub fn prompt_regex(&self) -> Result<&Regex, PlatformError> {
        self.lookup(self.prompt_pattern.as_ref(), PatternKind::Prompt)
    }

    /// End-of-banner regex used while connecting.
    pub fn terminator_regex(&self) -> Result<&Regex, PlatformError> {
        self.lookup(self.terminator_pattern.as_ref(), PatternKind::Terminator)
    }

    fn lookup<'a>(
        &'a self,
        custom: Option<&'a Regex>,
        kind: PatternKind,
    ) -> Result<&'a Regex, PlatformError> {
        custom
            .or_else(|| pattern(self.device_type, kind))
            .ok_or_else(|| PlatformError::InvalidDefinition {
                message: format!("{} has no {:?} pattern", self.name, kind),
            })
    }

    /// Extract the prompt from discovery output.
    pub fn find_prompt(&self, output: &[u8]) -> Result<Option<String>, PlatformError> {
        let re = self.prompt_regex()?;
        Ok(re
            .captures_iter(output)
            .last()
            .and_then(|caps| caps.get(1).or_else(|| caps.get(0)))
            .map(|m| String::from_utf8_lossy(m.as_bytes()).trim().to_string()))
    }

    /// Frame a command for the given mode.
    pub fn frame(&self, commands: &[&str], mode: CliMode) -> Option<Vec<String>> {
        match mode {
            CliMode::Operational => Some(
                commands
                    .iter()
                    .flat_map(|c| self.behavior.frame_operational(c))
                    .collect(),
            ),
            CliMode::Configuration => self.behavior.frame_configuration(commands),
        }
    }

    /// Completion anchor for a framed batch.
    pub fn anchor(&self, prompt: &str, framed: &[String], mode: CliMode) -> Result<Anchor, regex::Error> {
        match mode {
            CliMode::Operational => self.behavior.operational_anchor(prompt),
            CliMode::Configuration => self.behavior.configuration_anchor(prompt, framed),
        }
    }

    /// First failure pattern contained in `output`, if any.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .find(|p| output.contains(p.as_str()))
            .map(String::as_str)
    }

    /// Check that the definition is usable.
    pub fn validate(&self) -> Result<(), PlatformError> {
        if self.name.is_empty() {
            return Err(PlatformError::InvalidDefinition {
                message: "platform name is empty".into(),
            });
        }
        self.prompt_regex()?;
        self.terminator_regex()?;
        Ok(())
    }
}

impl fmt::Debug for PlatformDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformDefinition")
            .field("name", &self.name)
            .field("device_type", &self.device_type)
            .field("prompt_pattern", &self.prompt_pattern.as_ref().map(|r| r.as_str()))
            .field("failed_when_contains", &self.failed_when_contains)
            .field("on_open_commands", &self.on_open_commands)
            .field("on_close_commands", &self.on_close_commands)
            .field("terminal_type", &self.terminal_type)
            .field("terminal_width", &self.terminal_width)
            .field("terminal_height", &self.terminal_height)
            .field("behavior", &"<VendorBehavior>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_patterns_resolve() {
        let platform = PlatformDefinition::new("sros", DeviceType::NokiaSros);
        assert!(platform.validate().is_ok());
        assert_eq!(
            platform.find_prompt(b"banner\r\nA:pe1# ").unwrap().as_deref(),
            Some("A:pe1")
        );
    }

    #[test]
    fn test_custom_prompt_overrides_builtin() {
        let platform = PlatformDefinition::new("lab", DeviceType::NokiaSros)
            .with_prompt_pattern(r"(lab-\d+)\$")
            .unwrap();
        assert_eq!(
            platform.find_prompt(b"lab-7$ ").unwrap().as_deref(),
            Some("lab-7")
        );
        assert!(platform.find_prompt(b"nothing here").unwrap().is_none());
    }

    #[test]
    fn test_detect_failure() {
        let platform = PlatformDefinition::new("sros", DeviceType::NokiaSros)
            .with_failure_pattern("MINOR:")
            .with_failure_pattern("Error:");

        assert_eq!(
            platform.detect_failure("MINOR: CLI Command not allowed"),
            Some("MINOR:")
        );
        assert_eq!(platform.detect_failure("all good"), None);
    }

    #[test]
    fn test_default_behavior_has_no_configuration_mode() {
        let platform = PlatformDefinition::new("plain", DeviceType::NokiaSros);
        assert!(platform.frame(&["show"], CliMode::Configuration).is_none());
        assert_eq!(
            platform.frame(&["show version"], CliMode::Operational),
            Some(vec!["show version".to_string()])
        );
    }

    #[test]
    fn test_empty_name_is_invalid() {
        let platform = PlatformDefinition::new("", DeviceType::JuniperJunos);
        assert!(platform.validate().is_err());
    }
}
