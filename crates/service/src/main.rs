//! `pitwalld`: the F1 telemetry companion daemon (SPEC_FULL.md §2, §6).

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use pitwall_config::{AppConfig, CliArgs};
use pitwall_service::Daemon;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    let debug = args.debug;
    let log_file = args.log_file.clone();

    let config = match AppConfig::load(args) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("configuration error: {error}");
            return ExitCode::from(2);
        }
    };

    if let Err(error) = init_tracing(debug, log_file.as_deref()) {
        eprintln!("failed to initialize logging: {error}");
        return ExitCode::from(1);
    }

    info!(
        telemetry_port = config.telemetry_port,
        server_port = config.server_port,
        "starting pitwalld"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received shutdown signal");
            let _ = shutdown_tx.send(true);
        }
    });

    match Daemon::new(config).run(shutdown_rx).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            error!(%error, "daemon exited with an error");
            let code: u8 = error.exit_code().try_into().unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

/// `--debug` widens the default filter; `RUST_LOG` always wins if set.
/// `--log-file` switches the writer to an append-mode file instead of
/// stderr; a malformed path is a startup error, never a silent fallback.
fn init_tracing(debug: bool, log_file: Option<&Path>) -> std::io::Result<()> {
    let default_filter = if debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
            subscriber.with_writer(std::sync::Mutex::new(file)).init();
        }
        None => subscriber.init(),
    }
    Ok(())
}
