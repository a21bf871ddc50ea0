//! Nokia SR OS platform support.

mod platform;

pub use platform::{PLATFORM_NAME, SrosBehavior, platform};
