//! Platform definitions for multi-vendor support.
//!
//! This module defines vendor-specific configurations including prompt
//! grammars, completion anchors, command framing and output trimming.

mod definition;
mod patterns;
mod registry;
pub mod trim;
pub mod vendors;

pub use definition::PlatformDefinition;
pub use patterns::{PatternKind, completion_anchor, pattern};
pub use registry::PlatformRegistry;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::channel::Anchor;
use crate::error::PlatformError;

/// Supported device types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceType {
    /// Cisco IOS-XR (`RP/0/RP0/CPU0:host#`).
    CiscoIosxr,
    /// Juniper JUNOS (`user@host>`).
    JuniperJunos,
    /// Nokia SR OS, classic or MD-CLI (`A:host#`).
    NokiaSros,
    /// Nokia SR Linux (`--{ running }--[  ]--` context line, then `A:host#`).
    NokiaSrl,
}

impl DeviceType {
    /// All device types, in registry order.
    pub const ALL: [DeviceType; 4] = [
        DeviceType::CiscoIosxr,
        DeviceType::JuniperJunos,
        DeviceType::NokiaSros,
        DeviceType::NokiaSrl,
    ];

    /// Registry name for this device type.
    pub fn name(&self) -> &'static str {
        match self {
            DeviceType::CiscoIosxr => "cisco_iosxr",
            DeviceType::JuniperJunos => "juniper_junos",
            DeviceType::NokiaSros => "nokia_sros",
            DeviceType::NokiaSrl => "nokia_srl",
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DeviceType {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DeviceType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| PlatformError::UnknownPlatform {
                name: s.to_string(),
            })
    }
}

/// CLI mode a command is executed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CliMode {
    /// Read-only / exec mode.
    #[serde(alias = "running")]
    Operational,
    /// Candidate configuration, committed at the end of the batch.
    #[serde(alias = "candidate")]
    Configuration,
}

impl fmt::Display for CliMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliMode::Operational => f.write_str("operational"),
            CliMode::Configuration => f.write_str("configuration"),
        }
    }
}

impl FromStr for CliMode {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "operational" | "running" => Ok(CliMode::Operational),
            "configuration" | "candidate" => Ok(CliMode::Configuration),
            other => Err(PlatformError::InvalidDefinition {
                message: format!("unknown CLI mode '{other}'"),
            }),
        }
    }
}

/// Vendor-specific framing, anchor and trimming rules.
///
/// Implementations are pure: they never touch the session, so each rule can
/// be tested on its own.
pub trait VendorBehavior: Send + Sync {
    /// Lines written for an operational command.
    fn frame_operational(&self, command: &str) -> Vec<String> {
        vec![command.to_string()]
    }

    /// Lines written for a configuration batch, or `None` if the platform
    /// has no configuration mode.
    fn frame_configuration(&self, _commands: &[&str]) -> Option<Vec<String>> {
        None
    }

    /// Completion anchor for an operational command.
    fn operational_anchor(&self, prompt: &str) -> Result<Anchor, regex::Error> {
        Anchor::literal(prompt)
    }

    /// Completion anchor for a framed configuration batch.
    ///
    /// The default expects the prompt once per framed line.
    fn configuration_anchor(
        &self,
        prompt: &str,
        framed: &[String],
    ) -> Result<Anchor, regex::Error> {
        Ok(Anchor::new(
            Anchor::literal(prompt)?.pattern().clone(),
            framed.len(),
        ))
    }

    /// Cut the command output out of the raw read.
    ///
    /// Returns `None` if the completion match is missing after the echo.
    fn trim_output(
        &self,
        raw: &str,
        framed: &[String],
        prompt: &str,
        anchor: &Anchor,
        mode: CliMode,
    ) -> Option<String> {
        trim::structural_trim(raw, framed, prompt, anchor, mode)
            .map(|trimmed| {
                self.post_process_output(&trimmed, mode)
                    .trim_end_matches('\n')
                    .to_string()
            })
    }

    /// Vendor cleanup applied after the structural trim.
    fn post_process_output(&self, output: &str, _mode: CliMode) -> String {
        output.to_string()
    }
}

/// Default vendor behavior implementation.
pub struct DefaultBehavior;

impl VendorBehavior for DefaultBehavior {}
