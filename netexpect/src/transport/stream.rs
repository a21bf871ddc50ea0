//! Shell transport over an arbitrary async byte stream.
//!
//! Used to drive the expect engine from a telnet-like socket, a serial
//! bridge, or an in-memory `tokio::io::duplex` pair in tests.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{ShellConnector, ShellTransport, SshConfig};
use crate::error::{ChannelError, Result, TransportError};

const READ_CHUNK: usize = 8192;

/// [`ShellTransport`] over any `AsyncRead + AsyncWrite` stream.
pub struct StreamTransport<S> {
    stream: S,
    buf: BytesMut,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin,
{
    /// Wrap a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buf: BytesMut::with_capacity(READ_CHUNK),
        }
    }
}

#[async_trait]
impl<S> ShellTransport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Send + Unpin,
{
    async fn read(&mut self) -> Result<Option<Bytes>> {
        self.buf.reserve(READ_CHUNK);
        let n = self
            .stream
            .read_buf(&mut self.buf)
            .await
            .map_err(ChannelError::Io)?;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(self.buf.split().freeze()))
    }

    async fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.stream.write_all(data).await.map_err(ChannelError::Io)?;
        self.stream.flush().await.map_err(ChannelError::Io)?;
        Ok(data.len())
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await.map_err(ChannelError::Io)?;
        Ok(())
    }
}

/// Connector that hands out one pre-built transport.
///
/// The driver calls `connect` once per session; a second call fails as if
/// the device refused the connection.
pub struct StreamConnector {
    transport: Mutex<Option<Box<dyn ShellTransport>>>,
}

impl StreamConnector {
    /// Wrap a stream to be returned by the first `connect`.
    pub fn new<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            transport: Mutex::new(Some(Box::new(StreamTransport::new(stream)))),
        }
    }
}

#[async_trait]
impl ShellConnector for StreamConnector {
    async fn connect(
        &self,
        config: &SshConfig,
        _terminal_type: &str,
    ) -> Result<Box<dyn ShellTransport>> {
        let taken = self.transport.lock().ok().and_then(|mut slot| slot.take());
        taken.ok_or_else(|| {
            TransportError::ConnectionFailed {
                host: config.host.clone(),
                port: config.port,
                source: std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    "stream already consumed",
                ),
            }
            .into()
        })
    }
}
