//! Unix datagram queues.
//!
//! Each named queue is a datagram socket under the IPC directory:
//! `/cpu_usage` lives at `<ipc_dir>/cpu_usage.sock`. Workers send one JSON
//! object per datagram; the consumer side reads them without blocking.

use lighthouse_core::{parse_record, Record, RecordParseError, Source, SourceError};
use std::io::ErrorKind;
use std::os::unix::net::UnixDatagram;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::{MAX_DATAGRAM_SIZE, SOCKET_EXTENSION};

#[derive(Debug, Error)]
pub enum IpcError {
    #[error("Invalid queue name '{queue}': {reason}")]
    InvalidQueueName { queue: String, reason: &'static str },

    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Check a queue name: one non-empty path segment after an optional `/`.
pub fn validate_queue_name(queue: &str) -> Result<&str, IpcError> {
    let invalid = |reason| IpcError::InvalidQueueName {
        queue: queue.to_string(),
        reason,
    };
    let name = queue.strip_prefix('/').unwrap_or(queue);
    if name.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if name.contains('/') {
        return Err(invalid("must not contain '/' after the leading slash"));
    }
    if name == "." || name == ".." {
        return Err(invalid("must not be a relative path component"));
    }
    if name.contains('\0') {
        return Err(invalid("must not contain NUL"));
    }
    Ok(name)
}

/// Socket file backing `queue`.
pub fn socket_path(ipc_dir: &Path, queue: &str) -> Result<PathBuf, IpcError> {
    let name = validate_queue_name(queue)?;
    Ok(ipc_dir.join(format!("{}.{}", name, SOCKET_EXTENSION)))
}

// ============================================================================
// CONSUMER
// ============================================================================

/// Consumer end of a queue.
#[derive(Debug)]
pub struct IpcQueueSource {
    queue: String,
    path: PathBuf,
    socket: UnixDatagram,
    buf: Vec<u8>,
}

impl IpcQueueSource {
    /// Create the socket for `queue`, replacing any stale file.
    pub fn bind(ipc_dir: &Path, queue: &str) -> Result<Self, IpcError> {
        let path = socket_path(ipc_dir, queue)?;
        debug!(?path, queue, "Binding queue socket");

        std::fs::create_dir_all(ipc_dir).map_err(|source| IpcError::Io {
            action: "create directory",
            path: ipc_dir.to_path_buf(),
            source,
        })?;

        if path.exists() {
            debug!(?path, "Removing stale queue socket");
            std::fs::remove_file(&path).map_err(|source| IpcError::Io {
                action: "remove stale socket",
                path: path.clone(),
                source,
            })?;
        }

        let socket = UnixDatagram::bind(&path).map_err(|source| IpcError::Io {
            action: "bind",
            path: path.clone(),
            source,
        })?;
        socket.set_nonblocking(true).map_err(|source| IpcError::Io {
            action: "set non-blocking on",
            path: path.clone(),
            source,
        })?;

        Ok(Self {
            queue: queue.to_string(),
            path,
            socket,
            buf: vec![0u8; MAX_DATAGRAM_SIZE],
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Source for IpcQueueSource {
    fn name(&self) -> &str {
        &self.queue
    }

    fn try_receive(&mut self) -> Result<Option<Record>, SourceError> {
        let len = match self.socket.recv(&mut self.buf) {
            Ok(len) => len,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(None),
            Err(e) if e.kind() == ErrorKind::Interrupted => return Ok(None),
            Err(e) => {
                return Err(SourceError::Io {
                    queue: self.queue.clone(),
                    reason: e.to_string(),
                })
            }
        };

        match parse_record(&self.buf[..len]) {
            Ok(record) => Ok(Some(record)),
            Err(RecordParseError::NotAnObject) => Err(SourceError::NotAnObject {
                queue: self.queue.clone(),
            }),
            Err(RecordParseError::Json(reason)) => Err(SourceError::Malformed {
                queue: self.queue.clone(),
                reason,
            }),
        }
    }
}

impl Drop for IpcQueueSource {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != ErrorKind::NotFound {
                warn!(path = ?self.path, error = %e, "Failed to remove queue socket");
            }
        }
    }
}

// ============================================================================
// PUBLISHER
// ============================================================================

/// Producer end of a queue, for workers written in Rust.
#[derive(Debug)]
pub struct IpcQueuePublisher {
    path: PathBuf,
    socket: UnixDatagram,
}

impl IpcQueuePublisher {
    pub fn new(ipc_dir: &Path, queue: &str) -> Result<Self, IpcError> {
        let path = socket_path(ipc_dir, queue)?;
        let socket = UnixDatagram::unbound().map_err(|source| IpcError::Io {
            action: "create socket for",
            path: path.clone(),
            source,
        })?;
        Ok(Self { path, socket })
    }

    /// Send one record. Fails if nobody is listening on the queue.
    pub fn publish(&self, record: &Record) -> Result<(), IpcError> {
        let payload = serde_json::to_vec(record)?;
        self.publish_raw(&payload)
    }

    /// Send a raw payload as-is.
    pub fn publish_raw(&self, payload: &[u8]) -> Result<(), IpcError> {
        self.socket
            .send_to(payload, &self.path)
            .map_err(|source| IpcError::Io {
                action: "send to",
                path: self.path.clone(),
                source,
            })?;
        Ok(())
    }
}
