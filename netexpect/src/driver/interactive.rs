//! Interactive command support for prompts that require user input.
//!
//! Some device commands stop and ask before they finish:
//! - `copy running-config <file>` asks for the destination and whether to overwrite
//! - `reload` asks "Proceed with reload? [confirm]"
//! - `file delete` asks "Delete ... (y/n)"
//!
//! `send_interactive` handles these by sending a sequence of inputs, each
//! waiting for a specific pattern before proceeding.

use std::time::Duration;

use regex::bytes::Regex;

use crate::error::{ChannelError, Result};

/// Shown in place of hidden inputs.
pub(crate) const MASK: &str = "********";

/// An event in an interactive command sequence.
///
/// # Example
///
/// ```rust
/// use netexpect::driver::InteractiveEvent;
///
/// # fn main() -> Result<(), netexpect::Error> {
/// let events = vec![
///     InteractiveEvent::new("copy running-config disk0:r1.cfg", r"\]\?\s*$")?,
///     InteractiveEvent::new("", r"#\s*$")?,
/// ];
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct InteractiveEvent {
    /// The input to send (command or response).
    pub input: String,

    /// Pattern to wait for after sending input.
    pub pattern: Regex,

    /// Whether this input should be hidden in logs and results.
    pub hidden: bool,

    /// Optional timeout override for this specific event.
    pub timeout: Option<Duration>,
}

impl InteractiveEvent {
    /// Create a new interactive event.
    ///
    /// Fails with [`ChannelError::InvalidPattern`] if `pattern` is not a
    /// valid regex.
    pub fn new(input: impl Into<String>, pattern: &str) -> Result<Self> {
        Ok(Self {
            input: input.into(),
            pattern: Regex::new(pattern).map_err(ChannelError::InvalidPattern)?,
            hidden: false,
            timeout: None,
        })
    }

    /// Create an event for hidden input (like passwords).
    pub fn hidden(input: impl Into<String>, pattern: &str) -> Result<Self> {
        Ok(Self::new(input, pattern)?.with_hidden(true))
    }

    /// Set a custom timeout for this event.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Mark this event's input as hidden.
    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// The input as it may appear in logs and results.
    pub fn display_input(&self) -> &str {
        if self.hidden { MASK } else { &self.input }
    }
}

/// Result of an interactive command sequence.
#[derive(Debug, Clone)]
pub struct InteractiveResult {
    /// Results from each step in the sequence.
    pub steps: Vec<InteractiveStep>,

    /// Total time for the entire sequence.
    pub elapsed: Duration,

    /// Whether any step failed.
    pub failed: bool,
}

impl InteractiveResult {
    /// Create a new interactive result.
    pub fn new(steps: Vec<InteractiveStep>, elapsed: Duration) -> Self {
        let failed = steps.iter().any(|s| s.failed);
        Self {
            steps,
            elapsed,
            failed,
        }
    }

    /// Get the final output (from the last step).
    pub fn final_output(&self) -> Option<&str> {
        self.steps.last().map(|s| s.output.as_str())
    }

    /// Get all outputs concatenated.
    pub fn full_output(&self) -> String {
        self.steps.iter().map(|s| s.output.as_str()).collect()
    }

    /// First failure message in the sequence.
    pub fn failure_message(&self) -> Option<&str> {
        self.steps.iter().find_map(|s| s.failure_message.as_deref())
    }
}

/// Result of a single step in an interactive sequence.
#[derive(Debug, Clone)]
pub struct InteractiveStep {
    /// The input that was sent (masked if hidden).
    pub input: String,

    /// The output received after sending input.
    pub output: String,

    /// Time taken for this step.
    pub elapsed: Duration,

    /// Whether this step failed.
    pub failed: bool,

    /// Failure message if failed.
    pub failure_message: Option<String>,
}

impl InteractiveStep {
    /// Create a successful step.
    pub fn success(input: impl Into<String>, output: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            elapsed,
            failed: false,
            failure_message: None,
        }
    }

    /// Create a failed step.
    pub fn failed(
        input: impl Into<String>,
        output: impl Into<String>,
        elapsed: Duration,
        message: impl Into<String>,
    ) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            elapsed,
            failed: true,
            failure_message: Some(message.into()),
        }
    }
}

/// Builder for creating interactive command sequences.
///
/// Patterns are compiled by [`build`](InteractiveBuilder::build), which
/// reports the first invalid one.
///
/// # Example
///
/// ```rust
/// use netexpect::driver::InteractiveBuilder;
/// use std::time::Duration;
///
/// # fn main() -> Result<(), netexpect::Error> {
/// let events = InteractiveBuilder::new()
///     .send("file delete /var/tmp/old.cfg")
///     .expect(r"\(yes\)|\(y/n\)")
///     .send("yes")
///     .expect(r">\s*$")
///     .with_timeout(Duration::from_secs(60))
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct InteractiveBuilder {
    steps: Vec<PendingEvent>,
    default_timeout: Option<Duration>,
}

#[derive(Debug)]
struct PendingEvent {
    input: String,
    pattern: String,
    hidden: bool,
    timeout: Option<Duration>,
}

impl InteractiveBuilder {
    /// Create a new interactive builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an input to send.
    ///
    /// Must be followed by `expect()` to specify what to wait for.
    pub fn send(self, input: impl Into<String>) -> InteractiveBuilderWithInput {
        InteractiveBuilderWithInput {
            builder: self,
            input: input.into(),
            hidden: false,
            timeout: None,
        }
    }

    /// Add a hidden input (like a password).
    pub fn send_hidden(self, input: impl Into<String>) -> InteractiveBuilderWithInput {
        InteractiveBuilderWithInput {
            builder: self,
            input: input.into(),
            hidden: true,
            timeout: None,
        }
    }

    /// Set the default timeout for all events.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    /// Compile the sequence.
    pub fn build(self) -> Result<Vec<InteractiveEvent>> {
        let default_timeout = self.default_timeout;
        self.steps
            .into_iter()
            .map(|step| {
                let mut event = InteractiveEvent::new(step.input, &step.pattern)?.with_hidden(step.hidden);
                if let Some(timeout) = step.timeout.or(default_timeout) {
                    event = event.with_timeout(timeout);
                }
                Ok(event)
            })
            .collect()
    }
}

/// Intermediate state for the builder after `send()` is called.
#[derive(Debug)]
pub struct InteractiveBuilderWithInput {
    builder: InteractiveBuilder,
    input: String,
    hidden: bool,
    timeout: Option<Duration>,
}

impl InteractiveBuilderWithInput {
    /// Specify the pattern to wait for after sending the input.
    pub fn expect(mut self, pattern: &str) -> InteractiveBuilder {
        self.builder.steps.push(PendingEvent {
            input: self.input,
            pattern: pattern.to_string(),
            hidden: self.hidden,
            timeout: self.timeout,
        });
        self.builder
    }

    /// Set a custom timeout for this specific event.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
