//! # netexpect
//!
//! Async expect-style CLI automation for network devices over SSH.
//!
//! netexpect drives the interactive CLI of routers and switches the way an
//! operator would: it types commands into a PTY shell, watches the
//! terminal output for the prompt or mode markers that signal completion,
//! and cuts the command output out of what the terminal echoed. Files move
//! over SFTP with an SCP fallback.
//!
//! ## Features
//!
//! - Async SSH shells via russh, with any tokio stream usable instead
//! - Cisco IOS-XR, Juniper Junos, Nokia SR OS and Nokia SR Linux
//! - Operational and configuration (commit-framed) command modes
//! - Completion by anchor counting, with real cancellation on timeout
//! - Tiered file transfer: SFTP streaming, SFTP buffered, SCP
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use netexpect::{Driver, GenericDriver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netexpect::Error> {
//!     let mut driver = GenericDriver::juniper_junos("192.168.1.1", "admin", "secret", 22);
//!     driver.connect().await?;
//!
//!     let response = driver.send_command("show system uptime").await?;
//!     println!("{}", response.result);
//!
//!     driver
//!         .send_config_set(&["set system host-name edge-1"])
//!         .await?;
//!     driver.retrieve_file("/config/juniper.conf.gz", "edge-1.conf.gz").await?;
//!
//!     driver.disconnect().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod platform;
pub mod transfer;
pub mod transport;

// Re-export main types for convenience
pub use driver::{
    Driver, DriverBuilder, GenericDriver, InteractiveBuilder, InteractiveEvent, InteractiveResult,
    Response,
};
pub use error::{Error, Result};
pub use platform::{CliMode, DeviceType, PlatformDefinition, PlatformRegistry};
pub use transfer::{FileTransfer, Tier};
pub use transport::{AuthMethod, SshConfig};
