//! High-level driver for device interaction.
//!
//! The driver layer provides the main API: connect, discover the prompt,
//! send framed commands and cut their output, and move files.

mod builder;
mod generic;
mod interactive;
pub(crate) mod response;

pub use builder::DriverBuilder;
pub use generic::GenericDriver;
pub use interactive::{InteractiveBuilder, InteractiveEvent, InteractiveResult, InteractiveStep};
pub use response::Response;

use std::future::Future;
use std::time::Duration;

use crate::error::Result;
use crate::platform::CliMode;

/// Trait for device drivers.
pub trait Driver: Send + Sync {
    /// Open the shell, discover the prompt and prepare the session.
    fn connect(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Close the session. Safe to call when already disconnected.
    fn disconnect(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send an operational command with the default timeout.
    fn send_command(&mut self, command: &str) -> impl Future<Output = Result<Response>> + Send;

    /// Send a command in the given CLI mode with an explicit timeout.
    ///
    /// In configuration mode the command is wrapped in the platform's
    /// enter/commit framing.
    fn send_command_with(
        &mut self,
        command: &str,
        mode: CliMode,
        timeout: Duration,
    ) -> impl Future<Output = Result<Response>> + Send;

    /// Send multiple operational commands sequentially.
    fn send_commands(
        &mut self,
        commands: &[&str],
    ) -> impl Future<Output = Result<Vec<Response>>> + Send {
        async move {
            let mut responses = Vec::with_capacity(commands.len());
            for cmd in commands {
                responses.push(self.send_command(cmd).await?);
            }
            Ok(responses)
        }
    }

    /// Send a batch of configuration commands as one commit.
    ///
    /// The whole framed batch is written before any output is read.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use netexpect::driver::Driver;
    ///
    /// # async fn example(driver: &mut impl Driver) -> Result<(), netexpect::Error> {
    /// let response = driver
    ///     .send_config_set(&[
    ///         "set interfaces ge-0/0/0 description uplink",
    ///         "set interfaces ge-0/0/0 mtu 9192",
    ///     ])
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    fn send_config_set(&mut self, commands: &[&str]) -> impl Future<Output = Result<Response>> + Send;

    /// Send an interactive command sequence.
    ///
    /// This handles commands that ask for confirmation or extra input, such
    /// as `copy` or `reload`.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use netexpect::driver::{Driver, InteractiveEvent};
    ///
    /// # async fn example(driver: &mut impl Driver) -> Result<(), netexpect::Error> {
    /// let events = vec![
    ///     InteractiveEvent::new("reload", r"Proceed.*\[confirm\]")?,
    ///     InteractiveEvent::new("y", r"#")?,
    /// ];
    /// let result = driver.send_interactive(&events).await?;
    /// # Ok(())
    /// # }
    /// ```
    fn send_interactive(
        &mut self,
        events: &[InteractiveEvent],
    ) -> impl Future<Output = Result<InteractiveResult>> + Send;

    /// Check if the driver holds an open session.
    fn is_connected(&self) -> bool;

    /// The prompt discovered at connect time.
    fn prompt(&self) -> Option<&str>;
}
