//! Top-level daemon error, mapped to the exit codes in SPEC_FULL.md §6:
//! 0 clean shutdown, 2 config error, 3 bind failure, 1 unhandled internal
//! error.

use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("configuration error: {0}")]
    Config(#[from] pitwall_config::ConfigError),

    #[error("failed to bind {transport}: {source}")]
    Bind {
        transport: String,
        #[source]
        source: io::Error,
    },

    #[error("ipc surface error: {0}")]
    Ipc(#[from] pitwall_ipc::IpcError),

    #[error("a required task ended unexpectedly: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl DaemonError {
    /// The process exit code this error maps to (SPEC_FULL.md §6).
    pub fn exit_code(&self) -> i32 {
        match self {
            DaemonError::Config(_) => 2,
            DaemonError::Bind { .. } => 3,
            DaemonError::Ipc(pitwall_ipc::IpcError::Bind { .. }) => 3,
            DaemonError::Ipc(_) | DaemonError::TaskJoin(_) => 1,
        }
    }
}
