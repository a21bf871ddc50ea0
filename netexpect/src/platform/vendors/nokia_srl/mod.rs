//! Nokia SR Linux platform support.

mod platform;

pub use platform::{PLATFORM_NAME, SrlBehavior, platform};
