//! PTY channel: the expect engine.
//!
//! Writes go straight to the shell. Reads run in a spawned task that
//! accumulates sanitized output until an [`Anchor`] completes; the caller
//! races that task against a timer. On timeout the task is cancelled and
//! awaited before the error is returned, so no reader outlives the call
//! and later output is never consumed by a stale loop.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace, warn};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::buffer::{Anchor, PatternBuffer};
use crate::error::{ChannelError, Result};
use crate::transport::ShellTransport;

/// Configuration for PTY channel behavior.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    /// Default timeout for read operations.
    pub timeout: Duration,

    /// Search depth for single-shot anchors.
    pub search_depth: usize,

    /// Appended to every line sent.
    pub line_ending: String,
}

impl Default for PtyConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(6),
            search_depth: 1000,
            line_ending: "\n".to_string(),
        }
    }
}

type SharedTransport = Arc<Mutex<Box<dyn ShellTransport>>>;

/// High-level PTY channel for interactive device sessions.
pub struct PtyChannel {
    transport: SharedTransport,
    config: PtyConfig,
    open: bool,
}

impl PtyChannel {
    /// Wrap an open shell.
    pub fn new(transport: Box<dyn ShellTransport>, config: PtyConfig) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            config,
            open: true,
        }
    }

    /// Check if the channel is open.
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Get the default timeout.
    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Set the default timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
    }

    /// Get the configuration.
    pub fn config(&self) -> &PtyConfig {
        &self.config
    }

    /// Send one line followed by the line ending.
    pub async fn send(&self, line: &str) -> Result<()> {
        self.send_lines(&[line]).await
    }

    /// Send several lines in a single write, each followed by the line
    /// ending. Devices see the whole batch before any output is read.
    pub async fn send_lines<S: AsRef<str>>(&self, lines: &[S]) -> Result<()> {
        let mut payload = String::new();
        for line in lines {
            payload.push_str(line.as_ref());
            payload.push_str(&self.config.line_ending);
        }
        trace!("send {} line(s), {} bytes", lines.len(), payload.len());
        self.write_raw(payload.as_bytes()).await
    }

    /// Write bytes without a line ending (e.g. a bare carriage return).
    pub async fn write_raw(&self, data: &[u8]) -> Result<()> {
        if !self.open {
            return Err(ChannelError::Closed.into());
        }
        let mut transport = self.transport.lock().await;
        transport.write(data).await?;
        Ok(())
    }

    /// Read until `pattern` matches once, or fail after `timeout`.
    ///
    /// The pattern is compiled before anything is read, so an invalid regex
    /// leaves the stream untouched.
    pub async fn read_until(&self, pattern: &str, timeout: Duration) -> Result<String> {
        let anchor = Anchor::compile(pattern, 1).map_err(ChannelError::InvalidPattern)?;
        self.read_until_anchor(&anchor, timeout).await
    }

    /// Read until the anchor has matched the required number of times.
    ///
    /// Returns everything read, sanitized, including the command echo and
    /// the matched anchor text.
    pub async fn read_until_anchor(&self, anchor: &Anchor, timeout: Duration) -> Result<String> {
        if !self.open {
            return Err(ChannelError::Closed.into());
        }

        let token = CancellationToken::new();
        let mut reader = tokio::spawn(read_loop(
            self.transport.clone(),
            anchor.clone(),
            self.config.search_depth,
            token.clone(),
        ));

        let raw = tokio::select! {
            joined = &mut reader => {
                joined.map_err(|e| ChannelError::ReaderFailed(e.to_string()))??
            }
            _ = tokio::time::sleep(timeout) => {
                token.cancel();
                match reader.await {
                    Ok(outcome) => settle(outcome, timeout)?,
                    Err(e) => {
                        warn!("reader task failed during cancellation: {}", e);
                        return Err(ChannelError::PatternTimeout(timeout).into());
                    }
                }
            }
        };

        Ok(String::from_utf8_lossy(&raw).into_owned())
    }

    /// Close the shell. Safe to call more than once.
    pub async fn close(&mut self) -> Result<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        let mut transport = self.transport.lock().await;
        transport.close().await
    }
}

/// Resolve a reader that was cancelled by the timer. Output that completed
/// the anchor before the cancellation was seen has already left the stream,
/// so it is returned rather than dropped.
fn settle(outcome: Result<Vec<u8>>, timeout: Duration) -> Result<Vec<u8>> {
    match outcome {
        Ok(raw) => {
            debug!("anchor completed as the timer fired");
            Ok(raw)
        }
        Err(e) => {
            trace!("reader stopped: {}", e);
            Err(ChannelError::PatternTimeout(timeout).into())
        }
    }
}

async fn read_loop(
    transport: SharedTransport,
    anchor: Anchor,
    search_depth: usize,
    token: CancellationToken,
) -> Result<Vec<u8>> {
    let mut transport = transport.lock().await;
    let mut buffer = PatternBuffer::new(search_depth);

    loop {
        let chunk = tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(
                    "read cancelled waiting for {:?}, partial output: {:?}",
                    anchor.pattern().as_str(),
                    buffer.as_str_lossy()
                );
                return Err(ChannelError::Cancelled.into());
            }
            chunk = transport.read() => chunk?,
        };

        match chunk {
            Some(data) => {
                trace!("read {} bytes", data.len());
                buffer.extend(&data);
                if buffer.check(&anchor) {
                    return Ok(buffer.take());
                }
            }
            None => return Err(ChannelError::Closed.into()),
        }
    }
}
