//! Layered `AppConfig` (SPEC_FULL.md §4.8): built-in defaults, then an
//! optional YAML config file, then CLI flags, in that precedence order.
//! Constructed once in `main` and handed by value into each task's
//! constructor — nothing here is read from a process-wide global afterwards
//! (§9's "global singletons" re-architecture flag).

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};
use serde::Deserialize;

pub const DEFAULT_TELEMETRY_PORT: u16 = 20777;
pub const DEFAULT_SERVER_PORT: u16 = 5000;
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 200;
pub const DEFAULT_NUM_ADJACENT_CARS: u8 = 2;

/// `--packet-capture-mode` (SPEC_FULL.md §6, §4.10).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PacketCaptureMode {
    #[default]
    Disabled,
    Enabled,
    EnabledWithAutosave,
}

/// A per-role broadcast cadence override (SPEC_FULL.md §4.8), e.g. slowing
/// down `eng-view` without touching `race-table`'s default cadence.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleCadenceOverride {
    pub role: String,
    pub interval_ms: u64,
}

/// CLI surface (SPEC_FULL.md §6), parsed with `clap::Parser`. Every field
/// here has a config-file and a built-in-default counterpart; precedence is
/// defaults < file < CLI.
#[derive(Debug, Parser, Default)]
#[command(name = "pitwalld", about = "F1 telemetry companion daemon", version)]
pub struct CliArgs {
    /// UDP bind port (default 20777).
    #[arg(long)]
    pub telemetry_port: Option<u16>,

    /// HTTP/WS bind port (default 5000).
    #[arg(long)]
    pub server_port: Option<u16>,

    #[arg(long, value_enum)]
    pub packet_capture_mode: Option<PacketCaptureMode>,

    /// Write the archived model as a structured document on session end.
    #[arg(long)]
    pub post_race_data_autosave: bool,

    /// Serve a TCP replay listener instead of binding UDP.
    #[arg(long)]
    pub replay_server: bool,

    /// Broadcaster cadence in milliseconds (default 200).
    #[arg(long)]
    pub refresh_interval: Option<u64>,

    /// Inbound code that injects a Custom Marker.
    #[arg(long)]
    pub udp_custom_action_code: Option<u8>,

    /// Default pace-comparator window (default 2).
    #[arg(long)]
    pub num_adjacent_cars: Option<u8>,

    #[arg(long)]
    pub disable_browser_autoload: bool,

    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[arg(long)]
    pub debug: bool,

    /// Optional config-file path (SPEC_FULL.md §4.8).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// The YAML config-file shape. Every field is optional: an absent key falls
/// through to the built-in default, an explicit key always wins over it —
/// only the CLI layer can override a value the file set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    telemetry_port: Option<u16>,
    server_port: Option<u16>,
    packet_capture_mode: Option<PacketCaptureMode>,
    post_race_data_autosave: Option<bool>,
    replay_server: Option<bool>,
    refresh_interval_ms: Option<u64>,
    udp_custom_action_code: Option<u8>,
    num_adjacent_cars: Option<u8>,
    disable_browser_autoload: Option<bool>,
    log_file: Option<PathBuf>,
    debug: Option<bool>,
    #[serde(default)]
    forwarder_endpoints: Vec<SocketAddr>,
    #[serde(default)]
    role_cadence_overrides: Vec<RoleCadenceOverride>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// The resolved, immutable configuration value (SPEC_FULL.md §4.8). One of
/// these is built once by [`AppConfig::load`] and then passed by value (or
/// `Arc`) into every task's constructor.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telemetry_port: u16,
    pub server_port: u16,
    pub packet_capture_mode: PacketCaptureMode,
    pub post_race_data_autosave: bool,
    pub replay_server: bool,
    pub refresh_interval_ms: u64,
    pub udp_custom_action_code: Option<u8>,
    pub num_adjacent_cars: u8,
    pub disable_browser_autoload: bool,
    pub log_file: Option<PathBuf>,
    pub debug: bool,
    pub forwarder_endpoints: Vec<SocketAddr>,
    pub role_cadence_overrides: Vec<RoleCadenceOverride>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telemetry_port: DEFAULT_TELEMETRY_PORT,
            server_port: DEFAULT_SERVER_PORT,
            packet_capture_mode: PacketCaptureMode::default(),
            post_race_data_autosave: false,
            replay_server: false,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            udp_custom_action_code: None,
            num_adjacent_cars: DEFAULT_NUM_ADJACENT_CARS,
            disable_browser_autoload: false,
            log_file: None,
            debug: false,
            forwarder_endpoints: Vec::new(),
            role_cadence_overrides: Vec::new(),
        }
    }
}

impl AppConfig {
    /// Builds the resolved config from already-parsed CLI args. A malformed
    /// config file is a startup error (exit code 2, SPEC_FULL.md §6), never
    /// a silent fallback to defaults for fields the file explicitly set.
    pub fn load(args: CliArgs) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(path) = &args.config {
            config.apply_file(Self::read_file(path)?);
        }
        config.apply_cli(args);
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<ConfigFile, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_file(&mut self, file: ConfigFile) {
        if let Some(v) = file.telemetry_port {
            self.telemetry_port = v;
        }
        if let Some(v) = file.server_port {
            self.server_port = v;
        }
        if let Some(v) = file.packet_capture_mode {
            self.packet_capture_mode = v;
        }
        if let Some(v) = file.post_race_data_autosave {
            self.post_race_data_autosave = v;
        }
        if let Some(v) = file.replay_server {
            self.replay_server = v;
        }
        if let Some(v) = file.refresh_interval_ms {
            self.refresh_interval_ms = v;
        }
        if let Some(v) = file.udp_custom_action_code {
            self.udp_custom_action_code = Some(v);
        }
        if let Some(v) = file.num_adjacent_cars {
            self.num_adjacent_cars = v;
        }
        if let Some(v) = file.disable_browser_autoload {
            self.disable_browser_autoload = v;
        }
        if let Some(v) = file.log_file {
            self.log_file = Some(v);
        }
        if let Some(v) = file.debug {
            self.debug = v;
        }
        self.forwarder_endpoints = file.forwarder_endpoints;
        self.role_cadence_overrides = file.role_cadence_overrides;
    }

    fn apply_cli(&mut self, args: CliArgs) {
        if let Some(v) = args.telemetry_port {
            self.telemetry_port = v;
        }
        if let Some(v) = args.server_port {
            self.server_port = v;
        }
        if let Some(v) = args.packet_capture_mode {
            self.packet_capture_mode = v;
        }
        if args.post_race_data_autosave {
            self.post_race_data_autosave = true;
        }
        if args.replay_server {
            self.replay_server = true;
        }
        if let Some(v) = args.refresh_interval {
            self.refresh_interval_ms = v;
        }
        if let Some(v) = args.udp_custom_action_code {
            self.udp_custom_action_code = Some(v);
        }
        if let Some(v) = args.num_adjacent_cars {
            self.num_adjacent_cars = v;
        }
        if args.disable_browser_autoload {
            self.disable_browser_autoload = true;
        }
        if let Some(v) = args.log_file {
            self.log_file = Some(v);
        }
        if args.debug {
            self.debug = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_cli_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.telemetry_port, 20777);
        assert_eq!(config.server_port, 5000);
        assert_eq!(config.refresh_interval_ms, 200);
        assert_eq!(config.num_adjacent_cars, 2);
        assert_eq!(config.packet_capture_mode, PacketCaptureMode::Disabled);
    }

    #[test]
    fn cli_flags_override_an_unset_config() {
        let args = CliArgs {
            telemetry_port: Some(30000),
            debug: true,
            ..CliArgs::default()
        };
        let config = AppConfig::load(args).expect("no config file involved");
        assert_eq!(config.telemetry_port, 30000);
        assert!(config.debug);
    }

    #[test]
    fn file_values_fill_in_over_defaults_and_cli_wins_over_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pitwall.yaml");
        fs::write(
            &path,
            "telemetry_port: 40000\nserver_port: 6000\ndebug: true\n",
        )
        .expect("write fixture config");

        let args = CliArgs {
            config: Some(path),
            server_port: Some(6001),
            ..CliArgs::default()
        };
        let config = AppConfig::load(args).expect("valid config file");
        assert_eq!(config.telemetry_port, 40000);
        assert_eq!(config.server_port, 6001);
        assert!(config.debug);
    }

    #[test]
    fn a_malformed_config_file_is_a_typed_error_not_a_silent_default() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "telemetry_port: [not, a, port]\n").expect("write fixture config");

        let args = CliArgs {
            config: Some(path),
            ..CliArgs::default()
        };
        assert!(matches!(
            AppConfig::load(args),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn a_missing_config_file_is_a_typed_read_error() {
        let args = CliArgs {
            config: Some(PathBuf::from("/nonexistent/pitwall.yaml")),
            ..CliArgs::default()
        };
        assert!(matches!(AppConfig::load(args), Err(ConfigError::Read { .. })));
    }
}
