//! Blocking libssh2 sessions for the file-transfer tiers.

use std::net::{TcpStream, ToSocketAddrs};

use log::debug;
use secrecy::ExposeSecret;
use ssh2::{KeyboardInteractivePrompt, MethodType, Prompt, Session};

use crate::error::TransferError;
use crate::transport::{AuthMethod, HostKeyCheck, SshConfig};

const LEGACY_CRYPT: &str = "aes128-ctr,aes192-ctr,aes256-ctr,aes128-gcm@openssh.com,\
aes256-gcm@openssh.com,chacha20-poly1305@openssh.com,aes128-cbc,aes192-cbc,aes256-cbc";

/// Answers every keyboard-interactive prompt with the password.
struct PasswordPrompt<'a>(&'a str);

impl KeyboardInteractivePrompt for PasswordPrompt<'_> {
    fn prompt<'b>(&mut self, _username: &str, _instructions: &str, prompts: &[Prompt<'b>]) -> Vec<String> {
        prompts.iter().map(|_| self.0.to_string()).collect()
    }
}

/// Connect, handshake and authenticate a new session.
pub(super) fn open(config: &SshConfig) -> Result<Session, TransferError> {
    let addr = (config.host.as_str(), config.port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| TransferError::Session {
            message: format!("{} did not resolve", config.host),
        })?;
    let tcp = TcpStream::connect_timeout(&addr, config.timeout)?;

    let mut session = Session::new()?;
    session.set_timeout(u32::try_from(config.timeout.as_millis()).unwrap_or(u32::MAX));
    if config.legacy_ciphers {
        session.method_pref(MethodType::CryptCs, LEGACY_CRYPT)?;
        session.method_pref(MethodType::CryptSc, LEGACY_CRYPT)?;
    }
    session.set_tcp_stream(tcp);
    session.handshake()?;
    verify_host_key(&session, config)?;

    authenticate(&session, config)?;
    debug!("file-transfer session to {} established", config.socket_addr());
    Ok(session)
}

fn verify_host_key(session: &Session, config: &SshConfig) -> Result<(), TransferError> {
    let (raw, _) = session.host_key().ok_or_else(|| TransferError::Session {
        message: format!("{} sent no host key", config.socket_addr()),
    })?;
    HostKeyCheck::new(config)
        .verify_raw(raw)
        .map_err(|e| TransferError::Session { message: e.to_string() })
}

fn authenticate(session: &Session, config: &SshConfig) -> Result<(), TransferError> {
    let user = config.username.as_str();
    match &config.auth {
        AuthMethod::None => {}
        AuthMethod::Password(password) => {
            let password = password.expose_secret();
            if let Err(e) = session.userauth_password(user, password) {
                debug!("password auth refused ({e}), trying keyboard-interactive");
                session.userauth_keyboard_interactive(user, &mut PasswordPrompt(password))?;
            }
        }
        AuthMethod::KeyboardInteractive(password) => {
            session.userauth_keyboard_interactive(user, &mut PasswordPrompt(password.expose_secret()))?;
        }
        AuthMethod::PrivateKey { path, passphrase } => {
            session.userauth_pubkey_file(
                user,
                None,
                path,
                passphrase.as_ref().map(|p| p.expose_secret()),
            )?;
        }
    }

    if session.authenticated() {
        Ok(())
    } else {
        Err(TransferError::Session {
            message: format!("authentication failed for user '{user}'"),
        })
    }
}
