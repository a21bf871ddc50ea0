//! Shell transport layer.
//!
//! The expect engine only ever sees a [`ShellTransport`]: an interactive,
//! PTY-backed byte stream. [`SshConnector`] produces one over russh;
//! [`StreamTransport`] wraps any in-memory or socket stream, which is how
//! the test suite drives scripted devices.

pub mod config;
mod known_hosts;
mod ssh;
mod stream;

pub use config::{AuthMethod, HostKeyVerification, SshConfig};
pub(crate) use known_hosts::HostKeyCheck;
pub use ssh::{SshConnector, SshShell};
pub use stream::{StreamConnector, StreamTransport};

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

/// An open interactive shell.
///
/// `read` must be cancel-safe: dropping the future before it resolves must
/// not lose data that was already received. The expect engine relies on this
/// when a read races against cancellation.
#[async_trait]
pub trait ShellTransport: Send {
    /// Read the next chunk of output. `Ok(None)` means the remote side
    /// closed the shell.
    async fn read(&mut self) -> Result<Option<Bytes>>;

    /// Write raw bytes to the shell's stdin.
    async fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Close the shell and the session under it.
    async fn close(&mut self) -> Result<()>;
}

/// Opens shells for a driver.
#[async_trait]
pub trait ShellConnector: Send + Sync {
    /// Connect, authenticate and start a PTY shell with the given terminal type.
    async fn connect(
        &self,
        config: &SshConfig,
        terminal_type: &str,
    ) -> Result<Box<dyn ShellTransport>>;
}
