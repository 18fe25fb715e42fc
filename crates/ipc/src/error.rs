//! IPC Surface error taxonomy (SPEC_FULL.md §4.9): transport-layer failures
//! distinct from the fan-out bus's own `FanoutError`, since binding a local
//! socket fails in ways a WebSocket upgrade never does.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IpcError {
    #[error("failed to bind {transport}: {source}")]
    Bind {
        transport: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to remove stale socket file {path:?}: {source}")]
    StaleSocketCleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("connection I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type IpcResult<T> = Result<T, IpcError>;
