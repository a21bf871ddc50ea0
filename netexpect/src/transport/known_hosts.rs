//! known_hosts policy shared by the shell and file-transfer sessions.

use std::path::PathBuf;

use log::warn;
use russh::keys::PublicKey;

use super::config::{HostKeyVerification, SshConfig};
use crate::error::TransportError;

/// Checks a server key for one target against known_hosts.
#[derive(Debug, Clone)]
pub(crate) struct HostKeyCheck {
    host: String,
    port: u16,
    mode: HostKeyVerification,
    known_hosts_path: Option<PathBuf>,
}

impl HostKeyCheck {
    pub(crate) fn new(config: &SshConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            mode: config.host_key_verification.clone(),
            known_hosts_path: config.known_hosts_path.clone(),
        }
    }

    /// Accept or reject `key`. Unknown keys are learned under
    /// [`HostKeyVerification::AcceptNew`]; changed keys are always rejected.
    pub(crate) fn verify(&self, key: &PublicKey) -> Result<(), TransportError> {
        match self.mode {
            HostKeyVerification::Disabled => Ok(()),
            HostKeyVerification::AcceptNew => {
                if !self.lookup(key)? {
                    if let Err(e) = self.learn(key) {
                        warn!("Failed to save host key: {}", e);
                    }
                }
                Ok(())
            }
            HostKeyVerification::Strict => {
                if self.lookup(key)? {
                    Ok(())
                } else {
                    Err(TransportError::HostKeyUnknown {
                        host: self.host.clone(),
                        port: self.port,
                    })
                }
            }
        }
    }

    /// Verify a key in SSH wire encoding, as libssh2 reports it.
    pub(crate) fn verify_raw(&self, raw: &[u8]) -> Result<(), TransportError> {
        if matches!(self.mode, HostKeyVerification::Disabled) {
            return Ok(());
        }
        let key = PublicKey::from_bytes(raw).map_err(|e| TransportError::Key(e.to_string()))?;
        self.verify(&key)
    }

    /// `Ok(true)` if matched, `Ok(false)` if the host is not listed.
    fn lookup(&self, key: &PublicKey) -> Result<bool, TransportError> {
        let result = match &self.known_hosts_path {
            Some(path) => russh::keys::check_known_hosts_path(&self.host, self.port, key, path),
            None => russh::keys::check_known_hosts(&self.host, self.port, key),
        };

        match result {
            Ok(matched) => Ok(matched),
            Err(russh::keys::Error::KeyChanged { line }) => Err(TransportError::HostKeyChanged {
                host: self.host.clone(),
                port: self.port,
                line,
            }),
            Err(e) => Err(TransportError::KnownHosts(e.to_string())),
        }
    }

    fn learn(&self, key: &PublicKey) -> Result<(), TransportError> {
        let result = match &self.known_hosts_path {
            Some(path) => russh::keys::known_hosts::learn_known_hosts_path(&self.host, self.port, key, path),
            None => russh::keys::known_hosts::learn_known_hosts(&self.host, self.port, key),
        };

        result.map_err(|e| TransportError::KnownHosts(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EDGE_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIKee8rlSP6V/bYMldPtnnGSV9CKO/OHXaOBP17gd7xkC";
    const ROGUE_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIFBfj6hXgq4+R+47Y66cfsmlHsdeLcuJgmoZSa21xpvt";

    fn key(line: &str) -> PublicKey {
        PublicKey::from_openssh(line).unwrap()
    }

    fn check(mode: HostKeyVerification, path: PathBuf) -> HostKeyCheck {
        let mut config = SshConfig::new("edge1.lab", "admin", "admin");
        config.port = 2222;
        config.host_key_verification = mode;
        config.known_hosts_path = Some(path);
        HostKeyCheck::new(&config)
    }

    #[test]
    fn test_strict_rejects_unknown_host() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_hosts");
        std::fs::write(&path, "").unwrap();

        let err = check(HostKeyVerification::Strict, path.clone())
            .verify(&key(EDGE_KEY))
            .unwrap_err();
        assert!(matches!(err, TransportError::HostKeyUnknown { port: 2222, .. }));
        assert!(std::fs::read_to_string(&path).unwrap().is_empty());
    }

    #[test]
    fn test_accept_new_learns_then_rejects_changed_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_hosts");
        std::fs::write(&path, "").unwrap();

        let learning = check(HostKeyVerification::AcceptNew, path.clone());
        learning.verify(&key(EDGE_KEY)).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("edge1.lab"));

        check(HostKeyVerification::Strict, path.clone())
            .verify(&key(EDGE_KEY))
            .unwrap();

        let err = learning.verify(&key(ROGUE_KEY)).unwrap_err();
        assert!(matches!(err, TransportError::HostKeyChanged { .. }));
    }

    #[test]
    fn test_raw_key_is_checked_like_a_parsed_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_hosts");
        std::fs::write(&path, "").unwrap();
        let raw = key(ROGUE_KEY).to_bytes().unwrap();

        let err = check(HostKeyVerification::Strict, path.clone())
            .verify_raw(&raw)
            .unwrap_err();
        assert!(matches!(err, TransportError::HostKeyUnknown { .. }));

        check(HostKeyVerification::Disabled, path).verify_raw(b"garbage").unwrap();
    }
}
