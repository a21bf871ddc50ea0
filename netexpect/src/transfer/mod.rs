//! File transfer with tiered fallback.
//!
//! A transfer walks an ordered list of strategies. Each tier runs on a
//! blocking worker; when it fails for any reason other than a missing
//! source file, the failure is logged and the next tier is tried. The
//! default chain over SSH is
//!
//! 1. [`Tier::Streaming`]: SFTP, remote and local files copied chunk by chunk
//! 2. [`Tier::Buffered`]: SFTP, whole file read into memory, then written
//! 3. [`Tier::SecureCopy`]: SCP on a separate SSH connection
//!
//! Each tier opens its own session per call, so nothing is shared between
//! transfers.

mod scp;
mod session;
mod sftp;

pub use scp::ScpConnector;
pub use sftp::SftpConnector;

use std::fmt;
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, info, warn};

use crate::error::{Result, TransferError};
use crate::transport::SshConfig;

/// One strategy in the fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Chunked copy over the remote-filesystem subchannel.
    Streaming,
    /// Whole-file copy through memory over the remote-filesystem subchannel.
    Buffered,
    /// Copy over an independent secure-copy connection.
    SecureCopy,
}

impl Tier {
    /// Default fallback order.
    pub const ALL: [Tier; 3] = [Tier::Streaming, Tier::Buffered, Tier::SecureCopy];
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Streaming => f.write_str("streaming"),
            Tier::Buffered => f.write_str("buffered"),
            Tier::SecureCopy => f.write_str("secure-copy"),
        }
    }
}

/// Which way the file moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    /// Remote to local.
    Download,
    /// Local to remote.
    Upload,
}

/// A single copy request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub local: PathBuf,
    pub remote: PathBuf,
    pub direction: TransferDirection,
}

impl TransferRequest {
    /// Copy `remote` into `local`.
    pub fn download(remote: impl Into<PathBuf>, local: impl Into<PathBuf>) -> Self {
        Self {
            local: local.into(),
            remote: remote.into(),
            direction: TransferDirection::Download,
        }
    }

    /// Copy `local` to `remote`.
    pub fn upload(local: impl Into<PathBuf>, remote: impl Into<PathBuf>) -> Self {
        Self {
            local: local.into(),
            remote: remote.into(),
            direction: TransferDirection::Upload,
        }
    }

    /// The file that must already exist.
    pub fn source(&self) -> &Path {
        match self.direction {
            TransferDirection::Download => &self.remote,
            TransferDirection::Upload => &self.local,
        }
    }
}

/// A blocking copy strategy. Runs on a worker thread.
pub trait TransferStrategy: Send + Sync {
    /// Which tier this strategy implements.
    fn tier(&self) -> Tier;

    /// Perform the copy, returning the number of bytes moved.
    fn transfer(&self, request: &TransferRequest) -> std::result::Result<u64, TransferError>;
}

/// An open remote file system.
pub trait RemoteFs {
    /// Copy the remote file into `sink`.
    fn read_into(&mut self, remote: &Path, sink: &mut dyn Write) -> std::result::Result<u64, TransferError>;

    /// Create `remote` from `size` bytes of `source`.
    fn write_from(
        &mut self,
        remote: &Path,
        size: u64,
        source: &mut dyn Read,
    ) -> std::result::Result<u64, TransferError>;
}

/// Opens a fresh [`RemoteFs`] per transfer.
pub trait RemoteFsConnector: Send + Sync {
    fn connect(&self) -> std::result::Result<Box<dyn RemoteFs>, TransferError>;
}

/// A tier backed by a [`RemoteFsConnector`].
///
/// Streaming and secure-copy tiers hand the open local file straight to the
/// remote side; the buffered tier goes through memory first. Downloads are
/// staged next to the destination and only replace it on success. Uploads
/// open the local source before any connection is made.
pub struct CopyTier {
    tier: Tier,
    connector: Arc<dyn RemoteFsConnector>,
}

impl CopyTier {
    pub fn new(tier: Tier, connector: Arc<dyn RemoteFsConnector>) -> Self {
        Self { tier, connector }
    }

    fn download(&self, fs: &mut dyn RemoteFs, request: &TransferRequest) -> std::result::Result<u64, TransferError> {
        let dir = match request.local.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        // The destination is only replaced once the whole file has arrived.
        let mut staged = tempfile::NamedTempFile::new_in(dir)?;
        let copied = match self.tier {
            Tier::Buffered => {
                let mut data = Vec::new();
                fs.read_into(&request.remote, &mut data)?;
                staged.write_all(&data)?;
                data.len() as u64
            }
            Tier::Streaming | Tier::SecureCopy => fs.read_into(&request.remote, staged.as_file_mut())?,
        };
        staged.as_file_mut().flush()?;
        staged
            .persist(&request.local)
            .map_err(|e| TransferError::Io(e.error))?;
        Ok(copied)
    }

    fn upload(
        &self,
        fs: &mut dyn RemoteFs,
        mut local: File,
        request: &TransferRequest,
    ) -> std::result::Result<u64, TransferError> {
        match self.tier {
            Tier::Buffered => {
                let mut data = Vec::new();
                local.read_to_end(&mut data)?;
                fs.write_from(&request.remote, data.len() as u64, &mut data.as_slice())
            }
            Tier::Streaming | Tier::SecureCopy => {
                let size = local.metadata()?.len();
                fs.write_from(&request.remote, size, &mut local)
            }
        }
    }
}

impl TransferStrategy for CopyTier {
    fn tier(&self) -> Tier {
        self.tier
    }

    fn transfer(&self, request: &TransferRequest) -> std::result::Result<u64, TransferError> {
        match request.direction {
            TransferDirection::Download => {
                let mut fs = self.connector.connect()?;
                self.download(fs.as_mut(), request)
            }
            TransferDirection::Upload => {
                let local = open_local(&request.local)?;
                let mut fs = self.connector.connect()?;
                self.upload(fs.as_mut(), local, request)
            }
        }
    }
}

fn open_local(path: &Path) -> std::result::Result<File, TransferError> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => TransferError::NotFound {
            path: path.to_path_buf(),
        },
        _ => TransferError::Io(e),
    })
}

/// Ordered fallback chain of transfer strategies.
#[derive(Clone)]
pub struct FileTransfer {
    tiers: Vec<Arc<dyn TransferStrategy>>,
}

impl FileTransfer {
    /// The default chain: SFTP streaming, SFTP buffered, then SCP, all
    /// authenticating with `config`'s credentials.
    pub fn over_ssh(config: &SshConfig) -> Self {
        let sftp: Arc<dyn RemoteFsConnector> = Arc::new(SftpConnector::new(config.clone()));
        let scp: Arc<dyn RemoteFsConnector> = Arc::new(ScpConnector::new(config.clone()));
        Self::with_tiers(vec![
            Arc::new(CopyTier::new(Tier::Streaming, sftp.clone())),
            Arc::new(CopyTier::new(Tier::Buffered, sftp)),
            Arc::new(CopyTier::new(Tier::SecureCopy, scp)),
        ])
    }

    /// A custom chain, tried in the given order.
    pub fn with_tiers(tiers: Vec<Arc<dyn TransferStrategy>>) -> Self {
        Self { tiers }
    }

    /// Tiers in the order they are tried.
    pub fn tiers(&self) -> impl Iterator<Item = Tier> + '_ {
        self.tiers.iter().map(|t| t.tier())
    }

    /// Copy `remote` to `local`, falling back through the chain.
    pub async fn download(&self, remote: impl AsRef<Path>, local: impl AsRef<Path>) -> Result<u64> {
        self.run(TransferRequest::download(remote.as_ref(), local.as_ref()))
            .await
    }

    /// Copy `local` to `remote`, falling back through the chain.
    pub async fn upload(&self, local: impl AsRef<Path>, remote: impl AsRef<Path>) -> Result<u64> {
        self.run(TransferRequest::upload(local.as_ref(), remote.as_ref()))
            .await
    }

    /// Run `request` through the chain.
    ///
    /// A missing source file is returned as-is from the first tier that
    /// reports it. When every tier fails, the last tier's error is returned
    /// wrapped in [`TransferError::Exhausted`].
    pub async fn run(&self, request: TransferRequest) -> Result<u64> {
        let mut last = None;
        for strategy in &self.tiers {
            let tier = strategy.tier();
            match run_tier(strategy.clone(), request.clone()).await {
                Ok(bytes) => {
                    info!(
                        "{:?} {} via {} tier ({} bytes)",
                        request.direction,
                        request.source().display(),
                        tier,
                        bytes
                    );
                    return Ok(bytes);
                }
                Err(e) if e.is_not_found() => return Err(e.into()),
                Err(e) => {
                    warn!("{} tier failed for {}: {}", tier, request.source().display(), e);
                    last = Some(e);
                }
            }
        }

        Err(match last {
            Some(e) => TransferError::Exhausted(Box::new(e)),
            None => TransferError::NoTiers,
        }
        .into())
    }

    /// Run `request` on one tier only, without fallback.
    pub async fn run_with(&self, tier: Tier, request: TransferRequest) -> Result<u64> {
        let strategy = self
            .tiers
            .iter()
            .find(|s| s.tier() == tier)
            .cloned()
            .ok_or(TransferError::TierUnavailable(tier))?;
        Ok(run_tier(strategy, request).await?)
    }
}

impl fmt::Debug for FileTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileTransfer")
            .field("tiers", &self.tiers().collect::<Vec<_>>())
            .finish()
    }
}

async fn run_tier(
    strategy: Arc<dyn TransferStrategy>,
    request: TransferRequest,
) -> std::result::Result<u64, TransferError> {
    debug!("trying {} tier for {}", strategy.tier(), request.source().display());
    tokio::task::spawn_blocking(move || strategy.transfer(&request))
        .await
        .map_err(|e| TransferError::Worker(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::sync::Mutex;

    /// Serves a local directory as the "remote" side.
    struct LocalDir {
        root: PathBuf,
    }

    impl LocalDir {
        fn resolve(&self, remote: &Path) -> PathBuf {
            self.root.join(remote.strip_prefix("/").unwrap_or(remote))
        }
    }

    impl RemoteFs for LocalDir {
        fn read_into(&mut self, remote: &Path, sink: &mut dyn Write) -> std::result::Result<u64, TransferError> {
            let mut file = open_local(&self.resolve(remote))?;
            Ok(io::copy(&mut file, sink)?)
        }

        fn write_from(
            &mut self,
            remote: &Path,
            size: u64,
            source: &mut dyn Read,
        ) -> std::result::Result<u64, TransferError> {
            let mut file = File::create(self.resolve(remote))?;
            Ok(io::copy(&mut source.take(size), &mut file)?)
        }
    }

    struct LocalDirConnector(PathBuf);

    impl RemoteFsConnector for LocalDirConnector {
        fn connect(&self) -> std::result::Result<Box<dyn RemoteFs>, TransferError> {
            Ok(Box::new(LocalDir { root: self.0.clone() }))
        }
    }

    /// Records calls and fails with a fixed error.
    struct Failing {
        tier: Tier,
        not_found: bool,
        calls: Arc<Mutex<Vec<Tier>>>,
    }

    impl TransferStrategy for Failing {
        fn tier(&self) -> Tier {
            self.tier
        }

        fn transfer(&self, request: &TransferRequest) -> std::result::Result<u64, TransferError> {
            self.calls.lock().unwrap().push(self.tier);
            if self.not_found {
                Err(TransferError::NotFound {
                    path: request.source().to_path_buf(),
                })
            } else {
                Err(TransferError::Session {
                    message: format!("{} subsystem refused", self.tier),
                })
            }
        }
    }

    fn failing(tier: Tier, not_found: bool, calls: &Arc<Mutex<Vec<Tier>>>) -> Arc<dyn TransferStrategy> {
        Arc::new(Failing {
            tier,
            not_found,
            calls: calls.clone(),
        })
    }

    #[tokio::test]
    async fn test_round_trip_on_every_tier() {
        let remote_root = tempfile::tempdir().unwrap();
        let local_root = tempfile::tempdir().unwrap();
        let original = local_root.path().join("r1.cfg");
        let content: Vec<u8> = (0..70_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&original, &content).unwrap();

        let connector: Arc<dyn RemoteFsConnector> =
            Arc::new(LocalDirConnector(remote_root.path().to_path_buf()));
        let chain = FileTransfer::with_tiers(
            Tier::ALL
                .iter()
                .map(|&t| Arc::new(CopyTier::new(t, connector.clone())) as Arc<dyn TransferStrategy>)
                .collect(),
        );

        for tier in Tier::ALL {
            let remote = PathBuf::from(format!("/{tier}.cfg"));
            let back = local_root.path().join(format!("{tier}.back"));

            let sent = chain
                .run_with(tier, TransferRequest::upload(&original, &remote))
                .await
                .unwrap();
            let received = chain
                .run_with(tier, TransferRequest::download(&remote, &back))
                .await
                .unwrap();

            assert_eq!(sent, content.len() as u64);
            assert_eq!(received, content.len() as u64);
            assert_eq!(std::fs::read(&back).unwrap(), content, "tier {tier}");
        }
    }

    #[tokio::test]
    async fn test_falls_back_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let remote_root = tempfile::tempdir().unwrap();
        std::fs::write(remote_root.path().join("boot.cfg"), b"hostname r1\n").unwrap();
        let local = tempfile::tempdir().unwrap();

        let chain = FileTransfer::with_tiers(vec![
            failing(Tier::Streaming, false, &calls),
            failing(Tier::Buffered, false, &calls),
            Arc::new(CopyTier::new(
                Tier::SecureCopy,
                Arc::new(LocalDirConnector(remote_root.path().to_path_buf())),
            )),
        ]);

        let dest = local.path().join("boot.cfg");
        let bytes = chain.download("/boot.cfg", &dest).await.unwrap();

        assert_eq!(bytes, 12);
        assert_eq!(*calls.lock().unwrap(), vec![Tier::Streaming, Tier::Buffered]);
        assert_eq!(std::fs::read(&dest).unwrap(), b"hostname r1\n");
    }

    #[tokio::test]
    async fn test_not_found_does_not_fall_back() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let chain = FileTransfer::with_tiers(vec![
            failing(Tier::Streaming, true, &calls),
            failing(Tier::Buffered, false, &calls),
            failing(Tier::SecureCopy, false, &calls),
        ]);

        let err = chain.download("/missing.cfg", "/tmp/never").await.unwrap_err();

        assert!(matches!(err, Error::Transfer(TransferError::NotFound { .. })));
        assert_eq!(*calls.lock().unwrap(), vec![Tier::Streaming]);
    }

    #[tokio::test]
    async fn test_exhausted_wraps_last_error() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let chain = FileTransfer::with_tiers(vec![
            failing(Tier::Streaming, false, &calls),
            failing(Tier::SecureCopy, false, &calls),
        ]);

        let err = chain.upload("/tmp/a", "/b").await.unwrap_err();

        match err {
            Error::Transfer(TransferError::Exhausted(last)) => {
                assert!(last.to_string().contains("secure-copy"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_chain_and_unknown_tier() {
        let chain = FileTransfer::with_tiers(Vec::new());
        let err = chain.download("/a", "/tmp/b").await.unwrap_err();
        assert!(matches!(err, Error::Transfer(TransferError::NoTiers)));

        let err = chain
            .run_with(Tier::Buffered, TransferRequest::download("/a", "/tmp/b"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Transfer(TransferError::TierUnavailable(Tier::Buffered))
        ));
    }

    #[tokio::test]
    async fn test_missing_local_source_is_not_found() {
        let remote_root = tempfile::tempdir().unwrap();
        let chain = FileTransfer::with_tiers(vec![Arc::new(CopyTier::new(
            Tier::Streaming,
            Arc::new(LocalDirConnector(remote_root.path().to_path_buf())),
        ))]);

        let err = chain.upload("/definitely/not/here.cfg", "/x.cfg").await.unwrap_err();
        assert!(matches!(err, Error::Transfer(TransferError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_failed_streaming_download_leaves_no_partial_file() {
        let remote_root = tempfile::tempdir().unwrap();
        let local = tempfile::tempdir().unwrap();
        let dest = local.path().join("gone.cfg");
        let tier = CopyTier::new(
            Tier::Streaming,
            Arc::new(LocalDirConnector(remote_root.path().to_path_buf())),
        );

        let err = tier
            .transfer(&TransferRequest::download("/gone.cfg", &dest))
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(!dest.exists());
    }

    #[test]
    fn test_failed_download_keeps_existing_destination() {
        let remote_root = tempfile::tempdir().unwrap();
        let local = tempfile::tempdir().unwrap();
        let dest = local.path().join("startup.cfg");
        std::fs::write(&dest, b"precious backup").unwrap();

        for tier in Tier::ALL {
            let copy = CopyTier::new(tier, Arc::new(LocalDirConnector(remote_root.path().to_path_buf())));
            let err = copy
                .transfer(&TransferRequest::download("/startup.cfg", &dest))
                .unwrap_err();
            assert!(err.is_not_found(), "tier {tier}");
            assert_eq!(std::fs::read(&dest).unwrap(), b"precious backup", "tier {tier}");
        }
        assert_eq!(std::fs::read_dir(local.path()).unwrap().count(), 1);
    }

    /// Refuses every connection.
    struct Unreachable;

    impl RemoteFsConnector for Unreachable {
        fn connect(&self) -> std::result::Result<Box<dyn RemoteFs>, TransferError> {
            Err(TransferError::Session {
                message: "connection refused".into(),
            })
        }
    }

    #[test]
    fn test_missing_upload_source_checked_before_connecting() {
        for tier in Tier::ALL {
            let copy = CopyTier::new(tier, Arc::new(Unreachable));
            let err = copy
                .transfer(&TransferRequest::upload("/definitely/not/here.cfg", "/x.cfg"))
                .unwrap_err();
            assert!(err.is_not_found(), "tier {tier}: {err}");
        }
    }

    #[tokio::test]
    async fn test_missing_upload_source_stops_chain_when_unreachable() {
        let chain = FileTransfer::with_tiers(
            Tier::ALL
                .iter()
                .map(|&t| Arc::new(CopyTier::new(t, Arc::new(Unreachable))) as Arc<dyn TransferStrategy>)
                .collect(),
        );

        let err = chain.upload("/definitely/not/here.cfg", "/x.cfg").await.unwrap_err();
        assert!(matches!(err, Error::Transfer(TransferError::NotFound { .. })));
    }

    #[test]
    fn test_default_chain_order() {
        let chain = FileTransfer::over_ssh(&SshConfig::new("192.0.2.1", "admin", "admin"));
        assert_eq!(chain.tiers().collect::<Vec<_>>(), Tier::ALL.to_vec());
    }
}
