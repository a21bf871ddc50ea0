//! Scripted device simulators for driver tests.

#![allow(dead_code)]

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use netexpect::GenericDriver;
use netexpect::error::TransferError;
use netexpect::transfer::{RemoteFs, RemoteFsConnector};
use netexpect::transport::StreamConnector;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::task::JoinHandle;

/// Route library logs to the test harness; `RUST_LOG=debug` shows them.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Start a device on `stream` that prints `banner`, then answers each
/// received line with `respond(line)`. `None` means stay silent.
///
/// The handle resolves to every line the device received once the client
/// closes the stream.
pub fn spawn_device<F>(stream: DuplexStream, banner: &str, respond: F) -> JoinHandle<Vec<String>>
where
    F: Fn(&str) -> Option<String> + Send + 'static,
{
    spawn_device_with(stream, &[banner], Duration::ZERO, respond)
}

/// Like [`spawn_device`], but the banner goes out in pieces, `gap` apart.
pub fn spawn_device_with<F>(
    stream: DuplexStream,
    banner: &[&str],
    gap: Duration,
    respond: F,
) -> JoinHandle<Vec<String>>
where
    F: Fn(&str) -> Option<String> + Send + 'static,
{
    let banner: Vec<String> = banner.iter().map(|s| s.to_string()).collect();
    tokio::spawn(async move {
        let (read, mut write) = tokio::io::split(stream);
        let mut lines = BufReader::new(read).lines();
        let mut seen = Vec::new();

        for (i, piece) in banner.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(gap).await;
            }
            if write.write_all(piece.as_bytes()).await.is_err() {
                return seen;
            }
        }
        while let Ok(Some(line)) = lines.next_line().await {
            seen.push(line.clone());
            if let Some(reply) = respond(&line) {
                if write.write_all(reply.as_bytes()).await.is_err() {
                    break;
                }
            }
        }
        seen
    })
}

/// Attach `driver` to a fresh simulated device.
pub fn attach<F>(driver: GenericDriver, banner: &str, respond: F) -> (GenericDriver, JoinHandle<Vec<String>>)
where
    F: Fn(&str) -> Option<String> + Send + 'static,
{
    attach_with(driver, &[banner], Duration::ZERO, respond)
}

/// Attach `driver` to a device whose banner arrives in pieces.
pub fn attach_with<F>(
    driver: GenericDriver,
    banner: &[&str],
    gap: Duration,
    respond: F,
) -> (GenericDriver, JoinHandle<Vec<String>>)
where
    F: Fn(&str) -> Option<String> + Send + 'static,
{
    init_logging();
    let (client, server) = tokio::io::duplex(64 * 1024);
    let device = spawn_device_with(server, banner, gap, respond);
    (driver.with_connector(Arc::new(StreamConnector::new(client))), device)
}

/// Serves a local directory as the device's file system.
pub struct LocalDir(pub PathBuf);

struct LocalDirFs(PathBuf);

impl LocalDirFs {
    fn resolve(&self, remote: &Path) -> PathBuf {
        self.0.join(remote.strip_prefix("/").unwrap_or(remote))
    }
}

impl RemoteFs for LocalDirFs {
    fn read_into(&mut self, remote: &Path, sink: &mut dyn Write) -> Result<u64, TransferError> {
        let path = self.resolve(remote);
        let mut file = std::fs::File::open(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => TransferError::NotFound { path: remote.to_path_buf() },
            _ => TransferError::Io(e),
        })?;
        Ok(io::copy(&mut file, sink)?)
    }

    fn write_from(&mut self, remote: &Path, size: u64, source: &mut dyn Read) -> Result<u64, TransferError> {
        let mut file = std::fs::File::create(self.resolve(remote))?;
        Ok(io::copy(&mut source.take(size), &mut file)?)
    }
}

impl RemoteFsConnector for LocalDir {
    fn connect(&self) -> Result<Box<dyn RemoteFs>, TransferError> {
        Ok(Box::new(LocalDirFs(self.0.clone())))
    }
}

/// Refuses every session, like a device without the subsystem.
pub struct Refusing(pub &'static str);

impl RemoteFsConnector for Refusing {
    fn connect(&self) -> Result<Box<dyn RemoteFs>, TransferError> {
        Err(TransferError::Session {
            message: format!("{} subsystem not enabled", self.0),
        })
    }
}

pub const JUNOS_BANNER: &str = "Last login: Mon Jan  1 10:00:00 2024\r\n--- JUNOS 21.4R1.12 Kernel 64-bit\r\n\r\nadmin@vmx> ";

/// A Junos box answering the commands the tests use.
pub fn junos(line: &str) -> Option<String> {
    let reply = match line.trim_end() {
        "set cli screen-length 0" => "set cli screen-length 0 \r\nScreen length set to 0\r\n\r\n{master:0}\r\nadmin@vmx> ".to_string(),
        "show system uptime | no-more" => "show system uptime | no-more \r\n\
             Current time: 2024-01-01 10:00:05 UTC\r\n\
             System booted: 2023-12-01 08:00:00 UTC (4w3d 02:00 ago)\r\n\r\n{master:0}\r\nadmin@vmx> "
            .to_string(),
        "show bogus | no-more" => "show bogus | no-more \r\n                ^\r\nsyntax error, expecting <command>.\r\n\r\nadmin@vmx> ".to_string(),
        "configure" => "configure \r\nEntering configuration mode\r\n\r\n[edit]\r\nadmin@vmx# ".to_string(),
        "commit and-quit" => "commit and-quit \r\ncommit complete\r\nExiting configuration mode\r\n\r\nadmin@vmx> ".to_string(),
        other if other.starts_with("set ") => format!("{other} \r\n\r\n[edit]\r\nadmin@vmx# "),
        other if other.starts_with("show ") => format!("{other} \r\n\r\nadmin@vmx> "),
        _ => return None,
    };
    Some(reply)
}
