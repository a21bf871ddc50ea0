//! Cisco IOS-XR platform support.

mod copy_config;
mod platform;

pub use copy_config::copy_running_config;
pub use platform::{IosxrBehavior, PLATFORM_NAME, platform};
