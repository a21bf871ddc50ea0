//! Builder for creating device drivers.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use super::generic::{DEFAULT_COMMAND_TIMEOUT, GenericDriver};
use crate::error::{DriverError, Result};
use crate::platform::{DeviceType, PlatformDefinition, PlatformRegistry};
use crate::transfer::FileTransfer;
use crate::transport::config::{DEFAULT_CONNECT_TIMEOUT, DEFAULT_PORT};
use crate::transport::{AuthMethod, HostKeyVerification, ShellConnector, SshConfig};

/// Builder for constructing device drivers.
///
/// # Example
///
/// ```rust,no_run
/// use netexpect::driver::{Driver, DriverBuilder};
/// use netexpect::platform::DeviceType;
///
/// # async fn example() -> Result<(), netexpect::Error> {
/// let mut driver = DriverBuilder::new("192.168.1.1")
///     .username("admin")
///     .password("secret")
///     .device_type(DeviceType::JuniperJunos)
///     .build()?;
/// driver.connect().await?;
/// # Ok(())
/// # }
/// ```
pub struct DriverBuilder {
    host: String,
    port: u16,
    username: Option<String>,
    auth: AuthMethod,
    platform_name: Option<String>,
    custom_platform: Option<PlatformDefinition>,
    registry: Option<PlatformRegistry>,
    timeout: Duration,
    connect_timeout: Duration,
    terminal_size: Option<(u32, u32)>,
    host_key_verification: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
    legacy_ciphers: bool,
    connector: Option<Arc<dyn ShellConnector>>,
    transfer: Option<FileTransfer>,
}

impl DriverBuilder {
    /// Create a new driver builder for the specified host.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            username: None,
            auth: AuthMethod::None,
            platform_name: None,
            custom_platform: None,
            registry: None,
            timeout: DEFAULT_COMMAND_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            terminal_size: None,
            host_key_verification: HostKeyVerification::AcceptNew,
            known_hosts_path: None,
            legacy_ciphers: true,
            connector: None,
            transfer: None,
        }
    }

    /// Set the SSH port (default: 22).
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the username for authentication.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Set password authentication (with keyboard-interactive fallback).
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::password(password);
        self
    }

    /// Set keyboard-interactive authentication only.
    pub fn keyboard_interactive(mut self, password: impl Into<String>) -> Self {
        self.auth = AuthMethod::KeyboardInteractive(SecretString::from(password.into()));
        self
    }

    /// Set private key authentication.
    pub fn private_key(mut self, key_path: impl Into<PathBuf>) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: None,
        };
        self
    }

    /// Set private key authentication with passphrase.
    pub fn private_key_with_passphrase(
        mut self,
        key_path: impl Into<PathBuf>,
        passphrase: impl Into<String>,
    ) -> Self {
        self.auth = AuthMethod::PrivateKey {
            path: key_path.into(),
            passphrase: Some(SecretString::from(passphrase.into())),
        };
        self
    }

    /// Set the platform by name (e.g. "juniper_junos", "nokia_srl").
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform_name = Some(platform.into());
        self
    }

    /// Set the platform by device type.
    pub fn device_type(self, device: DeviceType) -> Self {
        self.platform(device.name())
    }

    /// Set a custom platform definition.
    pub fn custom_platform(mut self, platform: PlatformDefinition) -> Self {
        self.custom_platform = Some(platform);
        self
    }

    /// Resolve platform names against this registry instead of the built-in one.
    pub fn registry(mut self, registry: PlatformRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set the default command timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the time allowed to connect and authenticate.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set terminal dimensions (defaults to the platform's).
    pub fn terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_size = Some((width, height));
        self
    }

    /// Set host key verification mode (default: `AcceptNew`).
    pub fn host_key_verification(mut self, mode: HostKeyVerification) -> Self {
        self.host_key_verification = mode;
        self
    }

    /// Set a custom known_hosts file path.
    pub fn known_hosts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.known_hosts_path = Some(path.into());
        self
    }

    /// Offer CBC ciphers to the server (default: on).
    pub fn legacy_ciphers(mut self, enabled: bool) -> Self {
        self.legacy_ciphers = enabled;
        self
    }

    /// Open shells through `connector` instead of SSH.
    pub fn connector(mut self, connector: Arc<dyn ShellConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Use a custom file transfer chain.
    pub fn transfer(mut self, transfer: FileTransfer) -> Self {
        self.transfer = Some(transfer);
        self
    }

    /// Build the driver.
    ///
    /// This creates the driver but does not connect. Call `connect()` on the
    /// returned driver to open the session.
    pub fn build(self) -> Result<GenericDriver> {
        let username = self.username.ok_or_else(|| DriverError::InvalidConfig {
            message: "username is required".to_string(),
        })?;

        let platform = match (self.custom_platform, self.platform_name) {
            (Some(custom), _) => {
                custom.validate()?;
                custom
            }
            (None, Some(name)) => match &self.registry {
                Some(registry) => registry.require(&name)?.clone(),
                None => PlatformRegistry::builtin().require(&name)?.clone(),
            },
            (None, None) => {
                return Err(DriverError::InvalidConfig {
                    message: "platform must be specified".to_string(),
                }
                .into());
            }
        };

        let (terminal_width, terminal_height) = self
            .terminal_size
            .unwrap_or((platform.terminal_width, platform.terminal_height));

        let ssh_config = SshConfig {
            host: self.host,
            port: self.port,
            username,
            auth: self.auth,
            timeout: self.connect_timeout,
            terminal_width,
            terminal_height,
            host_key_verification: self.host_key_verification,
            known_hosts_path: self.known_hosts_path,
            legacy_ciphers: self.legacy_ciphers,
        };

        let mut driver = GenericDriver::new(ssh_config, platform);
        driver.set_timeout(self.timeout);
        if let Some(connector) = self.connector {
            driver = driver.with_connector(connector);
        }
        if let Some(transfer) = self.transfer {
            driver = driver.with_transfer(transfer);
        }
        Ok(driver)
    }
}
