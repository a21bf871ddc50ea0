//! Generic driver implementation that works with any platform.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::Driver;
use super::interactive::{InteractiveEvent, InteractiveResult, InteractiveStep};
use super::response::Response;
use crate::channel::{Anchor, PtyChannel, PtyConfig};
use crate::error::{ChannelError, DriverError, Result};
use crate::platform::vendors::{cisco_iosxr, juniper, nokia_srl, nokia_sros};
use crate::platform::{CliMode, PlatformDefinition};
use crate::transfer::{FileTransfer, Tier, TransferRequest};
use crate::transport::{ShellConnector, SshConfig, SshConnector};

/// Default completion timeout for commands.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(6);

/// Generic driver that works with any platform definition.
///
/// This is the device: it owns one shell session and the prompt
/// discovered on it, and handles
/// - prompt discovery and session preparation on connect
/// - command framing and completion detection per CLI mode
/// - output trimming and failure detection
/// - file transfer through the fallback chain
///
/// Commands on one driver run strictly one at a time (every command takes
/// `&mut self`). Separate drivers share nothing and may run concurrently.
pub struct GenericDriver {
    /// SSH configuration.
    ssh_config: SshConfig,

    /// Platform definition.
    platform: PlatformDefinition,

    /// Opens the shell on connect.
    connector: Arc<dyn ShellConnector>,

    /// Expect engine (None when disconnected).
    channel: Option<PtyChannel>,

    /// Prompt discovered at connect time.
    prompt: Option<String>,

    /// Default timeout for commands.
    timeout: Duration,

    /// File transfer chain.
    transfer: FileTransfer,
}

impl GenericDriver {
    /// Create a new generic driver that connects over SSH.
    pub fn new(ssh_config: SshConfig, platform: PlatformDefinition) -> Self {
        let transfer = FileTransfer::over_ssh(&ssh_config);
        Self {
            ssh_config,
            platform,
            connector: Arc::new(SshConnector),
            channel: None,
            prompt: None,
            timeout: DEFAULT_COMMAND_TIMEOUT,
            transfer,
        }
    }

    fn for_platform(
        platform: PlatformDefinition,
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        port: u16,
    ) -> Self {
        let mut config = SshConfig::new(host, username, password);
        config.port = port;
        config.terminal_width = platform.terminal_width;
        config.terminal_height = platform.terminal_height;
        Self::new(config, platform)
    }

    /// Cisco IOS-XR device.
    pub fn cisco_iosxr(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        port: u16,
    ) -> Self {
        Self::for_platform(cisco_iosxr::platform(), host, username, password, port)
    }

    /// Juniper Junos device.
    pub fn juniper_junos(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        port: u16,
    ) -> Self {
        Self::for_platform(juniper::platform(), host, username, password, port)
    }

    /// Nokia SR OS device.
    pub fn nokia_sros(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        port: u16,
    ) -> Self {
        Self::for_platform(nokia_sros::platform(), host, username, password, port)
    }

    /// Nokia SR Linux device.
    pub fn nokia_srl(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        port: u16,
    ) -> Self {
        Self::for_platform(nokia_srl::platform(), host, username, password, port)
    }

    /// Replace the shell connector (e.g. a [`StreamConnector`](crate::transport::StreamConnector)).
    pub fn with_connector(mut self, connector: Arc<dyn ShellConnector>) -> Self {
        self.connector = connector;
        self
    }

    /// Replace the file transfer chain.
    pub fn with_transfer(mut self, transfer: FileTransfer) -> Self {
        self.transfer = transfer;
        self
    }

    /// Get a reference to the platform definition.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// Get the SSH configuration.
    pub fn ssh_config(&self) -> &SshConfig {
        &self.ssh_config
    }

    /// Get the default command timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Set the default command timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
        if let Some(channel) = self.channel.as_mut() {
            channel.set_timeout(timeout);
        }
    }

    /// Get the file transfer chain.
    pub fn transfer(&self) -> &FileTransfer {
        &self.transfer
    }

    fn session(&self) -> Result<(&PtyChannel, &str)> {
        match (self.channel.as_ref(), self.prompt.as_deref()) {
            (Some(channel), Some(prompt)) => Ok((channel, prompt)),
            _ => Err(DriverError::NotConnected.into()),
        }
    }

    /// Send framed lines and cut the output once the anchor completes.
    async fn execute(
        &self,
        label: &str,
        framed: Vec<String>,
        mode: CliMode,
        timeout: Duration,
    ) -> Result<Response> {
        let (channel, prompt) = self.session()?;
        let anchor = self
            .platform
            .anchor(prompt, &framed, mode)
            .map_err(ChannelError::InvalidPattern)?;

        debug!("sending {:?} in {} mode", framed, mode);
        let start = Instant::now();
        channel.send_lines(&framed).await?;
        let raw = channel.read_until_anchor(&anchor, timeout).await?;
        let elapsed = start.elapsed();

        let result = self
            .platform
            .behavior
            .trim_output(&raw, &framed, prompt, &anchor, mode)
            .ok_or_else(|| DriverError::MalformedOutput {
                command: label.to_string(),
            })?;

        let response = Response::new(label, mode, result, raw, prompt, elapsed);
        match self.platform.detect_failure(&response.result) {
            Some(pattern) => {
                warn!("'{}' failed: output contains {:?}", label, pattern);
                let pattern = pattern.to_string();
                Ok(response.with_failure(pattern))
            }
            None => Ok(response),
        }
    }

    /// Send the platform's session-preparation commands, unframed.
    /// Failures are logged and never abort the connection.
    async fn prepare_session(&self) {
        let Ok((channel, prompt)) = self.session() else {
            return;
        };
        let anchor = match self.platform.behavior.operational_anchor(prompt) {
            Ok(anchor) => anchor,
            Err(e) => {
                warn!("no operational anchor for session preparation: {}", e);
                return;
            }
        };

        for command in &self.platform.on_open_commands {
            debug!("session preparation: {}", command);
            let outcome = match channel.send(command).await {
                Ok(()) => channel.read_until_anchor(&anchor, self.timeout).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(output) => {
                    if let Some(pattern) = self.platform.detect_failure(&output) {
                        warn!("session preparation '{}' rejected ({:?})", command, pattern);
                    }
                }
                Err(e) => warn!("session preparation '{}' failed: {}", command, e),
            }
        }
    }

    /// Read the login banner up to the first prompt and extract the prompt.
    ///
    /// Banners often contain terminator characters of their own (an MOTD
    /// framed in `#`), so reading continues until the accumulated output
    /// holds a prompt or the timeout expires.
    async fn discover_prompt(&self, channel: &PtyChannel) -> Result<String> {
        let terminator = Anchor::new(self.platform.terminator_regex()?.clone(), 1);
        let deadline = Instant::now() + self.timeout;
        let mut banner = String::new();

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match channel.read_until_anchor(&terminator, remaining).await {
                Ok(chunk) => banner.push_str(&chunk),
                Err(e) if e.is_timeout() && !banner.is_empty() => {
                    return Err(DriverError::PromptNotFound { output: banner }.into());
                }
                Err(e) => return Err(e),
            }
            if let Some(prompt) = self.platform.find_prompt(banner.as_bytes())? {
                return Ok(prompt);
            }
            debug!("terminator matched without a prompt, reading on");
        }
    }

    fn require_connected(&self) -> Result<()> {
        self.session().map(|_| ())
    }

    /// Copy `remote` from the device to `local`, falling back across tiers.
    pub async fn retrieve_file(&self, remote: impl AsRef<Path>, local: impl AsRef<Path>) -> Result<u64> {
        self.require_connected()?;
        self.transfer.download(remote, local).await
    }

    /// Copy `local` to `remote` on the device, falling back across tiers.
    pub async fn file_transfer(&self, local: impl AsRef<Path>, remote: impl AsRef<Path>) -> Result<u64> {
        self.require_connected()?;
        self.transfer.upload(local, remote).await
    }

    /// Copy `remote` to `local` using only `tier`.
    pub async fn retrieve_file_with(
        &self,
        tier: Tier,
        remote: impl AsRef<Path>,
        local: impl AsRef<Path>,
    ) -> Result<u64> {
        self.require_connected()?;
        self.transfer
            .run_with(tier, TransferRequest::download(remote.as_ref(), local.as_ref()))
            .await
    }

    /// Copy `local` to `remote` using only `tier`.
    pub async fn file_transfer_with(
        &self,
        tier: Tier,
        local: impl AsRef<Path>,
        remote: impl AsRef<Path>,
    ) -> Result<u64> {
        self.require_connected()?;
        self.transfer
            .run_with(tier, TransferRequest::upload(local.as_ref(), remote.as_ref()))
            .await
    }
}

impl Driver for GenericDriver {
    async fn connect(&mut self) -> Result<()> {
        if self.channel.is_some() {
            return Err(DriverError::AlreadyConnected.into());
        }

        info!(
            "connecting to {} as {} ({})",
            self.ssh_config.socket_addr(),
            self.ssh_config.username,
            self.platform.name
        );
        let transport = self
            .connector
            .connect(&self.ssh_config, &self.platform.terminal_type)
            .await?;
        let mut channel = PtyChannel::new(
            transport,
            PtyConfig {
                timeout: self.timeout,
                ..Default::default()
            },
        );

        let discovered = self.discover_prompt(&channel).await;

        let prompt = match discovered {
            Ok(prompt) => prompt,
            Err(e) => {
                if let Err(close_err) = channel.close().await {
                    debug!("closing after failed discovery: {}", close_err);
                }
                return Err(e);
            }
        };

        info!("{}: prompt is {:?}", self.ssh_config.host, prompt);
        self.channel = Some(channel);
        self.prompt = Some(prompt);

        self.prepare_session().await;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.prompt = None;
        let Some(mut channel) = self.channel.take() else {
            return Ok(());
        };

        for command in &self.platform.on_close_commands {
            if let Err(e) = channel.send(command).await {
                warn!("on-close command '{}' failed: {}", command, e);
            }
        }
        info!("disconnecting from {}", self.ssh_config.socket_addr());
        channel.close().await
    }

    async fn send_command(&mut self, command: &str) -> Result<Response> {
        let timeout = self.timeout;
        self.send_command_with(command, CliMode::Operational, timeout)
            .await
    }

    async fn send_command_with(
        &mut self,
        command: &str,
        mode: CliMode,
        timeout: Duration,
    ) -> Result<Response> {
        let framed = self
            .platform
            .frame(&[command], mode)
            .ok_or_else(|| DriverError::UnsupportedMode {
                platform: self.platform.name.clone(),
                mode: mode.to_string(),
            })?;
        self.execute(command, framed, mode, timeout).await
    }

    async fn send_config_set(&mut self, commands: &[&str]) -> Result<Response> {
        let mode = CliMode::Configuration;
        let framed = self
            .platform
            .frame(commands, mode)
            .ok_or_else(|| DriverError::UnsupportedMode {
                platform: self.platform.name.clone(),
                mode: mode.to_string(),
            })?;
        self.execute(&commands.join("; "), framed, mode, self.timeout)
            .await
    }

    async fn send_interactive(&mut self, events: &[InteractiveEvent]) -> Result<InteractiveResult> {
        let (channel, _) = self.session()?;
        let start = Instant::now();
        let mut steps = Vec::with_capacity(events.len());

        for event in events {
            let shown = event.display_input();
            debug!("interactive: sending {:?}, expecting {:?}", shown, event.pattern.as_str());

            let step_start = Instant::now();
            channel.send(&event.input).await?;
            let anchor = Anchor::new(event.pattern.clone(), 1);
            let output = channel
                .read_until_anchor(&anchor, event.timeout.unwrap_or(self.timeout))
                .await?;

            let step = match self.platform.detect_failure(&output) {
                Some(pattern) => InteractiveStep::failed(shown, output.as_str(), step_start.elapsed(), pattern),
                None => InteractiveStep::success(shown, output.as_str(), step_start.elapsed()),
            };
            steps.push(step);
        }

        Ok(InteractiveResult::new(steps, start.elapsed()))
    }

    fn is_connected(&self) -> bool {
        self.channel.as_ref().is_some_and(PtyChannel::is_open)
    }

    fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_vendor_constructors() {
        let driver = GenericDriver::juniper_junos("192.0.2.10", "admin", "admin@123", 830);
        assert_eq!(driver.platform().name, "juniper_junos");
        assert_eq!(driver.ssh_config().port, 830);
        assert_eq!(driver.timeout(), DEFAULT_COMMAND_TIMEOUT);
        assert!(!driver.is_connected());
        assert!(driver.prompt().is_none());

        let driver = GenericDriver::nokia_srl("192.0.2.11", "admin", "NokiaSrl1!", 22);
        assert_eq!(driver.platform().name, "nokia_srl");
    }

    #[tokio::test]
    async fn test_commands_require_connection() {
        let mut driver = GenericDriver::cisco_iosxr("192.0.2.1", "cisco", "cisco", 22);

        let err = driver.send_command("show version").await.unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::NotConnected)));

        let err = driver.send_config_set(&["hostname R1"]).await.unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::NotConnected)));

        let err = driver.retrieve_file("disk0:/r1.cfg", "/tmp/r1.cfg").await.unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::NotConnected)));

        let err = driver
            .file_transfer_with(Tier::SecureCopy, "/tmp/r1.cfg", "disk0:/r1.cfg")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Driver(DriverError::NotConnected)));
    }

    #[tokio::test]
    async fn test_disconnect_is_idempotent() {
        let mut driver = GenericDriver::nokia_sros("192.0.2.1", "admin", "admin", 22);
        driver.disconnect().await.unwrap();
        driver.disconnect().await.unwrap();
    }
}
