//! SSH shell transport using russh.

use std::borrow::Cow;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, trace};
use russh::client::{self, Handle, KeyboardInteractiveAuthResponse, Msg};
use russh::keys::{PrivateKeyWithHashAlg, PublicKey, load_secret_key};
use russh::{Channel, ChannelMsg, Preferred, cipher};
use secrecy::ExposeSecret;

use super::config::{AuthMethod, SshConfig};
use super::known_hosts::HostKeyCheck;
use super::{ShellConnector, ShellTransport};
use crate::error::{ChannelError, Result, TransportError};

/// Modern ciphers followed by the CBC modes older devices insist on.
const LEGACY_CIPHERS: &[cipher::Name] = &[
    cipher::CHACHA20_POLY1305,
    cipher::AES_256_GCM,
    cipher::AES_256_CTR,
    cipher::AES_192_CTR,
    cipher::AES_128_CTR,
    cipher::AES_256_CBC,
    cipher::AES_192_CBC,
    cipher::AES_128_CBC,
];

/// Upper bound on keyboard-interactive info-request rounds.
const MAX_KBD_ROUNDS: usize = 5;

/// Opens PTY shells over SSH.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshConnector;

#[async_trait]
impl ShellConnector for SshConnector {
    async fn connect(
        &self,
        config: &SshConfig,
        terminal_type: &str,
    ) -> Result<Box<dyn ShellTransport>> {
        let shell = tokio::time::timeout(config.timeout, SshShell::open(config, terminal_type))
            .await
            .map_err(|_| TransportError::Timeout(config.timeout))??;
        Ok(Box::new(shell))
    }
}

/// An interactive PTY shell on an authenticated SSH session.
pub struct SshShell {
    session: Handle<SshHandler>,
    channel: Channel<Msg>,
}

impl SshShell {
    /// Connect, authenticate and request a PTY shell.
    pub async fn open(config: &SshConfig, terminal_type: &str) -> Result<Self> {
        let mut ssh_config = client::Config {
            inactivity_timeout: None,
            ..Default::default()
        };
        if config.legacy_ciphers {
            ssh_config.preferred = Preferred {
                cipher: Cow::Borrowed(LEGACY_CIPHERS),
                ..Default::default()
            };
        }

        let host_key_error: Arc<Mutex<Option<TransportError>>> = Arc::new(Mutex::new(None));

        let handler = SshHandler {
            host_key: HostKeyCheck::new(config),
            host_key_error: host_key_error.clone(),
        };

        debug!("connecting to {}", config.socket_addr());
        let mut session = client::connect(
            Arc::new(ssh_config),
            (config.host.as_str(), config.port),
            handler,
        )
        .await
        .map_err(|e| {
            // Prefer the detailed host-key error over russh's generic one
            match host_key_error.lock().ok().and_then(|mut slot| slot.take()) {
                Some(hk_err) => hk_err,
                None => TransportError::Ssh(e),
            }
        })?;

        authenticate(&mut session, config).await?;

        let channel = session
            .channel_open_session()
            .await
            .map_err(|e| TransportError::ShellOpenFailed(e.to_string()))?;

        channel
            .request_pty(
                true,
                terminal_type,
                config.terminal_width,
                config.terminal_height,
                0,
                0,
                &[],
            )
            .await
            .map_err(|e| TransportError::ShellOpenFailed(e.to_string()))?;

        channel
            .request_shell(true)
            .await
            .map_err(|e| TransportError::ShellOpenFailed(e.to_string()))?;

        debug!(
            "shell open on {} ({}, {}x{})",
            config.socket_addr(),
            terminal_type,
            config.terminal_width,
            config.terminal_height
        );

        Ok(Self { session, channel })
    }
}

#[async_trait]
impl ShellTransport for SshShell {
    async fn read(&mut self) -> Result<Option<Bytes>> {
        loop {
            match self.channel.wait().await {
                Some(ChannelMsg::Data { data }) => return Ok(Some(Bytes::copy_from_slice(&data))),
                Some(ChannelMsg::ExtendedData { data, .. }) => {
                    return Ok(Some(Bytes::copy_from_slice(&data)));
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => return Ok(None),
                Some(other) => trace!("ignoring channel message: {:?}", other),
            }
        }
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.channel.data(data).await.map_err(ChannelError::Ssh)?;
        Ok(data.len())
    }

    async fn close(&mut self) -> Result<()> {
        if let Err(e) = self.channel.eof().await {
            trace!("eof on close failed: {}", e);
        }
        self.session
            .disconnect(russh::Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::Ssh)?;
        Ok(())
    }
}

/// Authenticate with the server.
async fn authenticate(session: &mut Handle<SshHandler>, config: &SshConfig) -> Result<()> {
    let user = config.username.as_str();
    let success = match &config.auth {
        AuthMethod::None => session
            .authenticate_none(user)
            .await
            .map_err(TransportError::Ssh)?
            .success(),
        AuthMethod::Password(password) => {
            let accepted = session
                .authenticate_password(user, password.expose_secret())
                .await
                .map_err(TransportError::Ssh)?
                .success();
            if accepted {
                true
            } else {
                debug!("password auth refused for {}, trying keyboard-interactive", user);
                keyboard_interactive(session, user, password.expose_secret()).await?
            }
        }
        AuthMethod::KeyboardInteractive(secret) => {
            keyboard_interactive(session, user, secret.expose_secret()).await?
        }
        AuthMethod::PrivateKey { path, passphrase } => {
            let key = load_secret_key(path, passphrase.as_ref().map(|p| p.expose_secret()))
                .map_err(|e| TransportError::Key(e.to_string()))?;

            // Get the best RSA hash algorithm supported by the server
            let hash_alg = session
                .best_supported_rsa_hash()
                .await
                .map_err(TransportError::Ssh)?
                .flatten();

            session
                .authenticate_publickey(user, PrivateKeyWithHashAlg::new(Arc::new(key), hash_alg))
                .await
                .map_err(TransportError::Ssh)?
                .success()
        }
    };

    if !success {
        return Err(TransportError::AuthenticationFailed {
            user: config.username.clone(),
        }
        .into());
    }

    Ok(())
}

/// Answer every keyboard-interactive prompt with the secret.
async fn keyboard_interactive(
    session: &mut Handle<SshHandler>,
    user: &str,
    secret: &str,
) -> Result<bool> {
    let mut response = session
        .authenticate_keyboard_interactive_start(user, None::<String>)
        .await
        .map_err(TransportError::Ssh)?;

    for _ in 0..MAX_KBD_ROUNDS {
        match response {
            KeyboardInteractiveAuthResponse::Success => return Ok(true),
            KeyboardInteractiveAuthResponse::InfoRequest { prompts, .. } => {
                let answers = prompts.iter().map(|_| secret.to_string()).collect();
                response = session
                    .authenticate_keyboard_interactive_respond(answers)
                    .await
                    .map_err(TransportError::Ssh)?;
            }
            _ => return Ok(false),
        }
    }

    Ok(false)
}

/// SSH client handler for russh.
struct SshHandler {
    host_key: HostKeyCheck,
    host_key_error: Arc<Mutex<Option<TransportError>>>,
}

impl SshHandler {
    fn reject(&self, error: TransportError) -> bool {
        if let Ok(mut slot) = self.host_key_error.lock() {
            *slot = Some(error);
        }
        false
    }
}

impl client::Handler for SshHandler {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> std::result::Result<bool, Self::Error> {
        let accepted = match self.host_key.verify(server_public_key) {
            Ok(()) => true,
            Err(e) => self.reject(e),
        };
        Ok(accepted)
    }
}
