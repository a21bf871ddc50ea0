//! Channel layer for pattern matching and PTY operations.
//!
//! This module handles the interactive session: control-sequence
//! stripping, completion anchors and the timed read loop.

mod buffer;
mod pty;
pub mod sanitize;

pub use buffer::{Anchor, PatternBuffer};
pub use pty::{PtyChannel, PtyConfig};
pub use sanitize::{Sanitizer, sanitize, sanitize_str};
