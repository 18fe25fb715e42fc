//! Local transport selection for the IPC Surface to Overlays (SPEC_FULL.md
//! §4.7, §6, §9): loopback TCP everywhere, with the platform-native
//! alternative (Unix domain socket / Windows named pipe) preferred by
//! default.

#[cfg(unix)]
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default loopback TCP port for the IPC bus, distinct from the fan-out
/// bus's `--server-port`.
pub const DEFAULT_TCP_PORT: u16 = 20778;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransportType {
    Tcp {
        address: String,
        port: u16,
    },
    #[cfg(unix)]
    UnixSocket {
        socket_path: PathBuf,
    },
    #[cfg(windows)]
    NamedPipe {
        pipe_name: String,
    },
}

impl TransportType {
    pub fn tcp() -> Self {
        TransportType::Tcp {
            address: "127.0.0.1".to_string(),
            port: DEFAULT_TCP_PORT,
        }
    }

    pub fn tcp_with_address(address: impl Into<String>, port: u16) -> Self {
        TransportType::Tcp {
            address: address.into(),
            port,
        }
    }

    #[cfg(unix)]
    pub fn unix_socket(path: impl Into<PathBuf>) -> Self {
        TransportType::UnixSocket {
            socket_path: path.into(),
        }
    }

    #[cfg(windows)]
    pub fn named_pipe(name: impl Into<String>) -> Self {
        TransportType::NamedPipe { pipe_name: name.into() }
    }

    /// The platform-native choice named in SPEC_FULL.md §9: a Unix socket
    /// under the user's runtime directory on Unix, a named pipe on Windows.
    pub fn platform_default() -> Self {
        #[cfg(windows)]
        {
            TransportType::NamedPipe {
                pipe_name: r"\\.\pipe\pitwall-hud".to_string(),
            }
        }
        #[cfg(unix)]
        {
            let uid = unsafe { libc::getuid() };
            TransportType::UnixSocket {
                socket_path: PathBuf::from(format!("/run/user/{uid}/pitwall-hud.sock")),
            }
        }
    }

    pub fn description(&self) -> String {
        match self {
            TransportType::Tcp { address, port } => format!("TCP {address}:{port}"),
            #[cfg(unix)]
            TransportType::UnixSocket { socket_path } => {
                format!("Unix socket {socket_path:?}")
            }
            #[cfg(windows)]
            TransportType::NamedPipe { pipe_name } => format!("Named pipe {pipe_name}"),
        }
    }
}

impl Default for TransportType {
    fn default() -> Self {
        Self::platform_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcp_transport_describes_itself_with_its_port() {
        let transport = TransportType::tcp();
        assert!(transport.description().contains("20778"));
    }

    #[test]
    fn platform_default_is_not_plain_tcp_on_unix() {
        #[cfg(unix)]
        assert!(matches!(
            TransportType::platform_default(),
            TransportType::UnixSocket { .. }
        ));
    }
}
