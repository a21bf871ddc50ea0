//! Secure-copy tier: SCP over its own SSH connection.

use std::io::{self, Read, Write};
use std::path::Path;

use ssh2::{Channel, Session};

use super::{RemoteFs, RemoteFsConnector, session};
use crate::error::TransferError;
use crate::transport::SshConfig;

const FILE_MODE: i32 = 0o644;

/// Opens a new authenticated session for each SCP transfer.
#[derive(Debug, Clone)]
pub struct ScpConnector {
    config: SshConfig,
}

impl ScpConnector {
    pub fn new(config: SshConfig) -> Self {
        Self { config }
    }
}

impl RemoteFsConnector for ScpConnector {
    fn connect(&self) -> Result<Box<dyn RemoteFs>, TransferError> {
        Ok(Box::new(ScpFs {
            session: session::open(&self.config)?,
        }))
    }
}

struct ScpFs {
    session: Session,
}

/// The remote `scp` reports a missing file as a protocol error whose text
/// carries the shell's message.
fn map_error(e: ssh2::Error, path: &Path) -> TransferError {
    if e.message().contains("No such file") {
        TransferError::NotFound {
            path: path.to_path_buf(),
        }
    } else {
        TransferError::Ssh(e)
    }
}

fn finish(mut channel: Channel) -> Result<(), TransferError> {
    channel.send_eof()?;
    channel.wait_eof()?;
    channel.close()?;
    channel.wait_close()?;
    Ok(())
}

impl RemoteFs for ScpFs {
    fn read_into(&mut self, remote: &Path, sink: &mut dyn Write) -> Result<u64, TransferError> {
        let (mut channel, stat) = self.session.scp_recv(remote).map_err(|e| map_error(e, remote))?;
        let copied = io::copy(&mut (&mut channel).take(stat.size()), sink)?;
        finish(channel)?;
        Ok(copied)
    }

    fn write_from(&mut self, remote: &Path, size: u64, source: &mut dyn Read) -> Result<u64, TransferError> {
        let mut channel = self
            .session
            .scp_send(remote, FILE_MODE, size, None)
            .map_err(|e| map_error(e, remote))?;
        let copied = io::copy(&mut source.take(size), &mut channel)?;
        finish(channel)?;
        Ok(copied)
    }
}
