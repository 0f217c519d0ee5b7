//! relayterm-attach - attach the local terminal to a terminal relay
//!
//! Usage:
//!   relayterm-attach
//!   relayterm-attach wss://tracker.example.com/ws/terminal
//!   relayterm-attach --page-url https://tracker.example.com --path /ws/terminal

mod host;
mod keys;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use relayterm_core::config::default_config_path;
use relayterm_core::{ConnectionState, RelayConfig, SessionStatus, TerminalPanel};
use tokio::sync::mpsc;
use tracing::{info, warn};

use host::{AppEvent, NativeHost};

#[derive(Parser, Debug)]
#[command(name = "relayterm-attach")]
#[command(about = "Attach to a terminal relay session")]
#[command(version)]
struct Args {
    /// Relay URL (ws:// or wss://). Overrides --page-url and --path.
    endpoint: Option<String>,

    /// Page the terminal belongs to; the relay is on the same host
    #[arg(long)]
    page_url: Option<String>,

    /// Relay path on the page host
    #[arg(long)]
    path: Option<String>,

    /// Config file (default: ~/.relayterm/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Give up on a pending handshake after this many milliseconds (0 disables)
    #[arg(long)]
    connect_timeout_ms: Option<u64>,

    /// Also log to stderr
    #[arg(long)]
    log_stderr: bool,
}

fn load_config(args: &Args) -> Result<RelayConfig> {
    let mut config = match &args.config {
        Some(path) => RelayConfig::load(path)?,
        None => RelayConfig::load_or_default(&default_config_path())?,
    };
    config.apply_env()?;

    if let Some(page_url) = &args.page_url {
        config.page_url = page_url.clone();
        config.endpoint = None;
    }
    if let Some(path) = &args.path {
        config.path = path.clone();
        config.endpoint = None;
    }
    if let Some(endpoint) = &args.endpoint {
        config.endpoint = Some(endpoint.clone());
    }
    if let Some(ms) = args.connect_timeout_ms {
        config.connect_timeout_ms = (ms > 0).then_some(ms);
    }
    Ok(config)
}

/// Resolves at `deadline`, or never when there is none
async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}

fn render_status(status: &SessionStatus) {
    let (color, hint) = match status.state {
        ConnectionState::Connected => ("32", ""),
        ConnectionState::Connecting => ("90", ""),
        ConnectionState::Disconnected if status.show_reconnect() => ("33", " - press r to reconnect"),
        ConnectionState::Disconnected => ("31", ""),
    };
    // Raw mode: no implicit carriage return
    eprint!("\r\n\x1b[{}m[relay: {}{}]\x1b[0m\r\n", color, status.state, hint);
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let _log_guard = logging::init_logging(args.log_stderr)?;

    let config = load_config(&args)?;
    let session_config = config
        .session_config()
        .context("Invalid relay configuration")?;
    let endpoint = session_config.endpoint.clone();

    eprintln!("\x1b[90mConnecting to {}...\x1b[0m", endpoint);
    eprintln!("\x1b[90mPress Ctrl+] to detach\x1b[0m");
    eprintln!();

    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<AppEvent>();
    let observing = Arc::new(AtomicBool::new(false));
    let reconnect_offered = Arc::new(AtomicBool::new(false));
    let running = Arc::new(AtomicBool::new(true));

    let input_handle = keys::spawn_input_reader(
        events_tx.clone(),
        observing.clone(),
        reconnect_offered.clone(),
        running.clone(),
    );

    let mut panel = TerminalPanel::new(session_config);
    panel.open(NativeHost::new(events_tx, observing), Instant::now());

    let Some(session) = panel.session_mut() else {
        anyhow::bail!("Terminal session did not open");
    };
    let mut status_rx = session.subscribe();
    let mut failure: Option<String> = None;

    loop {
        let Some(session) = panel.session_mut() else {
            break;
        };
        let deadline = session.next_deadline();

        tokio::select! {
            event = events_rx.recv() => match event {
                Some(AppEvent::Transport(id, event)) => session.on_transport_event(id, event),
                Some(AppEvent::Input(data)) => {
                    session.on_input(&data);
                }
                Some(AppEvent::Reconnect) => {
                    if session.status().show_reconnect() {
                        session.reconnect(Instant::now())?;
                    }
                }
                Some(AppEvent::Resized) => session.on_container_resized(Instant::now()),
                Some(AppEvent::Detach) | None => {
                    eprint!("\r\n\x1b[33mDetaching from relay session\x1b[0m\r\n");
                    break;
                }
            },

            _ = sleep_until(deadline) => session.poll_timers(Instant::now()),

            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let status = *status_rx.borrow_and_update();
                reconnect_offered.store(status.show_reconnect(), Ordering::SeqCst);
                render_status(&status);
                if status.state == ConnectionState::Disconnected && !status.ever_connected {
                    failure = Some(format!("Could not connect to {}", endpoint));
                    break;
                }
            }

            _ = tokio::signal::ctrl_c() => {
                eprint!("\r\n\x1b[33mDetaching...\x1b[0m\r\n");
                break;
            }
        }
    }

    // Restores the terminal before anything else is printed
    panel.close();
    running.store(false, Ordering::SeqCst);
    if let Err(e) = input_handle.await {
        warn!(error = %e, "Input reader task failed");
    }

    // No process::exit: `_log_guard` has to drop to flush the log file
    Ok(exit_status(failure.as_deref()))
}

fn exit_status(failure: Option<&str>) -> ExitCode {
    match failure {
        Some(message) => {
            warn!(%message, "Relay session failed");
            eprintln!("\x1b[31mError: {}\x1b[0m", message);
            ExitCode::FAILURE
        }
        None => {
            info!("Detached from relay");
            ExitCode::SUCCESS
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::parse_from(std::iter::once("relayterm-attach").chain(args.iter().copied()))
    }

    #[test]
    fn test_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "pageUrl: http://localhost:8080\nconnectTimeoutMs: 5000\n").unwrap();
        let path = path.to_string_lossy().to_string();

        let config = load_config(&parse(&["-c", &path, "--path", "/relay", "--connect-timeout-ms", "0"])).unwrap();
        assert_eq!(config.endpoint().unwrap().as_str(), "ws://localhost:8080/relay");
        assert_eq!(config.connect_timeout_ms, None);

        let config = load_config(&parse(&["-c", &path, "wss://relay.example.com/term"])).unwrap();
        assert_eq!(config.endpoint().unwrap().as_str(), "wss://relay.example.com/term");
        assert_eq!(config.connect_timeout_ms, Some(5000));
    }

    #[test]
    fn test_exit_status() {
        assert_eq!(exit_status(None), ExitCode::SUCCESS);
        assert_eq!(
            exit_status(Some("Could not connect to ws://localhost:3000/ws/terminal")),
            ExitCode::FAILURE
        );
    }
}
