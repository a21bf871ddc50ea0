//! Error types for netexpect.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::transfer::Tier;

/// Main error type for netexpect operations.
#[derive(Error, Debug)]
pub enum Error {
    /// SSH transport-level errors
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Platform/vendor errors
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// File transfer errors
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),
}

impl Error {
    /// True when the error is an expect timeout (the caller may retry with a
    /// longer timeout).
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Channel(ChannelError::PatternTimeout(_)))
    }
}

/// Transport layer errors (SSH connection, authentication).
#[derive(Error, Debug)]
pub enum TransportError {
    /// Failed to connect to host
    #[error("Connection failed to {host}:{port}: {source}")]
    ConnectionFailed {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    /// SSH handshake or protocol error
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// Authentication failed
    #[error("Authentication failed for user '{user}'")]
    AuthenticationFailed { user: String },

    /// SSH key error
    #[error("SSH key error: {0}")]
    Key(String),

    /// Server presented a key different from the one in known_hosts
    #[error("Host key for {host}:{port} changed (known_hosts line {line})")]
    HostKeyChanged { host: String, port: u16, line: usize },

    /// Server is not in known_hosts and strict checking is enabled
    #[error("Host key for {host}:{port} is unknown")]
    HostKeyUnknown { host: String, port: u16 },

    /// known_hosts could not be read or written
    #[error("known_hosts error: {0}")]
    KnownHosts(String),

    /// Failed to open the PTY shell channel
    #[error("Failed to open shell channel: {0}")]
    ShellOpenFailed(String),

    /// Operation timed out
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Channel layer errors (pattern matching, reads and writes on the shell).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Pattern not found within {0:?}")]
    PatternTimeout(Duration),

    /// Channel reached EOF or was closed by the remote side
    #[error("Channel closed")]
    Closed,

    /// SSH protocol error on the channel
    #[error("Channel SSH error: {0}")]
    Ssh(russh::Error),

    /// I/O error on a stream-backed channel
    #[error("Channel I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// The read loop observed cancellation before completing
    #[error("Read cancelled")]
    Cancelled,

    /// The background reader task panicked or was aborted
    #[error("Reader task failed: {0}")]
    ReaderFailed(String),
}

/// Driver layer errors (command execution, prompt discovery).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver not connected
    #[error("Driver not connected - call connect() first")]
    NotConnected,

    /// Driver already connected
    #[error("Driver already connected")]
    AlreadyConnected,

    /// Prompt regex did not match the discovery output
    #[error("Failed to find prompt in output: '{output}'")]
    PromptNotFound { output: String },

    /// The platform has no framing for the requested CLI mode
    #[error("Platform '{platform}' does not support {mode} mode")]
    UnsupportedMode { platform: String, mode: String },

    /// Command echo or completion anchor could not be located in the output
    #[error("Malformed output for command '{command}': completion anchor not found after echo")]
    MalformedOutput { command: String },

    /// Command execution failed
    #[error("Command failed: {message}")]
    CommandFailed { message: String },

    /// Invalid configuration in the driver builder
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Platform/vendor definition errors.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// Invalid platform definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },

    /// Platform name is not registered
    #[error("Unknown platform: '{name}'")]
    UnknownPlatform { name: String },

    /// A platform with this name is already registered
    #[error("Platform already registered: '{name}'")]
    AlreadyRegistered { name: String },
}

/// File transfer errors.
#[derive(Error, Debug)]
pub enum TransferError {
    /// The source file does not exist. Never triggers a fallback.
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    /// A tier could not establish its session or subsystem
    #[error("Session setup failed: {message}")]
    Session { message: String },

    /// Local or remote I/O failure during the copy
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// libssh2 error
    #[error("SSH error: {0}")]
    Ssh(#[from] ssh2::Error),

    /// The blocking worker running a tier failed to complete
    #[error("Transfer worker failed: {0}")]
    Worker(String),

    /// Every tier in the chain failed; holds the last tier's error
    #[error("All transfer tiers failed: {0}")]
    Exhausted(Box<TransferError>),

    /// The chain has no tiers to try
    #[error("No transfer tiers configured")]
    NoTiers,

    /// An explicitly requested tier is not part of the chain
    #[error("Transfer tier '{0}' is not configured")]
    TierUnavailable(Tier),
}

impl TransferError {
    /// True if this error means the source file legitimately does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            TransferError::NotFound { .. } => true,
            TransferError::Io(e) => e.kind() == io::ErrorKind::NotFound,
            TransferError::Exhausted(inner) => inner.is_not_found(),
            _ => false,
        }
    }
}

/// Result type alias using netexpect's Error.
pub type Result<T> = std::result::Result<T, Error>;
