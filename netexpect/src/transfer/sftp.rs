//! SFTP-backed remote file system for the streaming and buffered tiers.

use std::io::{self, Read, Write};
use std::path::Path;

use ssh2::{ErrorCode, Session, Sftp};

use super::{RemoteFs, RemoteFsConnector, session};
use crate::error::TransferError;
use crate::transport::SshConfig;

/// `SSH_FX_NO_SUCH_FILE`
const FX_NO_SUCH_FILE: i32 = 2;

/// Opens an SFTP subsystem on a fresh SSH session per transfer.
#[derive(Debug, Clone)]
pub struct SftpConnector {
    config: SshConfig,
}

impl SftpConnector {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }
}

impl RemoteFsConnector for SftpConnector {
    fn connect(&self) -> Result<Box<dyn RemoteFs>, TransferError> {
        let session = session::open(&self.config)?;
        let sftp = session.sftp().map_err(|e| TransferError::Session {
            message: format!("sftp subsystem unavailable: {e}"),
        })?;
        Ok(Box::new(SftpFs {
            sftp,
            _session: session,
        }))
    }
}

struct SftpFs {
    sftp: Sftp,
    _session: Session,
}

fn map_error(e: ssh2::Error, path: &Path) -> TransferError {
    match e.code() {
        ErrorCode::SFTP(FX_NO_SUCH_FILE) => TransferError::NotFound {
            path: path.to_path_buf(),
        },
        _ => TransferError::Ssh(e),
    }
}

impl RemoteFs for SftpFs {
    fn read_into(&mut self, remote: &Path, sink: &mut dyn Write) -> Result<u64, TransferError> {
        let mut file = self.sftp.open(remote).map_err(|e| map_error(e, remote))?;
        Ok(io::copy(&mut file, sink)?)
    }

    fn write_from(&mut self, remote: &Path, _size: u64, source: &mut dyn Read) -> Result<u64, TransferError> {
        let mut file = self.sftp.create(remote).map_err(|e| map_error(e, remote))?;
        let written = io::copy(source, &mut file)?;
        file.flush()?;
        Ok(written)
    }
}
