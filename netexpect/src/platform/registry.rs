//! Platform registry for looking up platform definitions.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use super::definition::PlatformDefinition;
use super::{DeviceType, vendors};
use crate::error::PlatformError;

/// Built-in platforms, created on first use and never mutated.
static BUILTIN: Lazy<PlatformRegistry> = Lazy::new(PlatformRegistry::with_builtins);

/// Registry for platform definitions, in registration order.
#[derive(Debug, Default, Clone)]
pub struct PlatformRegistry {
    platforms: IndexMap<String, PlatformDefinition>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            platforms: IndexMap::new(),
        }
    }

    /// A registry pre-loaded with every built-in vendor.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for platform in [
            vendors::cisco_iosxr::platform(),
            vendors::juniper::platform(),
            vendors::nokia_sros::platform(),
            vendors::nokia_srl::platform(),
        ] {
            registry.platforms.insert(platform.name.clone(), platform);
        }
        registry
    }

    /// The shared read-only registry of built-in platforms.
    pub fn builtin() -> &'static PlatformRegistry {
        &BUILTIN
    }

    /// Register a platform definition.
    pub fn register(&mut self, platform: PlatformDefinition) -> Result<(), PlatformError> {
        if self.platforms.contains_key(&platform.name) {
            return Err(PlatformError::AlreadyRegistered {
                name: platform.name.clone(),
            });
        }
        platform.validate()?;
        self.platforms.insert(platform.name.clone(), platform);
        Ok(())
    }

    /// Get a platform by name.
    pub fn get(&self, name: &str) -> Option<&PlatformDefinition> {
        self.platforms.get(name)
    }

    /// Get the first platform registered for a device type.
    pub fn for_device(&self, device: DeviceType) -> Option<&PlatformDefinition> {
        self.platforms.values().find(|p| p.device_type == device)
    }

    /// Look up a platform by name, failing with `UnknownPlatform`.
    pub fn require(&self, name: &str) -> Result<&PlatformDefinition, PlatformError> {
        self.get(name).ok_or_else(|| PlatformError::UnknownPlatform {
            name: name.to_string(),
        })
    }

    /// Check if a platform is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.platforms.contains_key(name)
    }

    /// List all registered platform names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.platforms.keys().map(String::as_str)
    }
}
