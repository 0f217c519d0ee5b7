use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use relayterm_core::config::default_home;

pub const ENV_LOG_LEVEL: &str = "RELAYTERM_LOG_LEVEL";

const LOG_FILE: &str = "relayterm-attach.log";

fn log_filter() -> tracing_subscriber::EnvFilter {
    let level = if let Ok(v) = std::env::var("RUST_LOG") {
        v
    } else if let Ok(v) = std::env::var(ENV_LOG_LEVEL) {
        level_alias(&v).to_string()
    } else {
        "info".to_string()
    };

    tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
}

fn level_alias(value: &str) -> &str {
    match value {
        "silent" => "off",
        "fatal" => "error",
        other => other,
    }
}

/// File log (daily rotation) plus an optional stderr layer.
///
/// Stderr is off by default since stdout/stderr are the attached terminal.
/// The returned guard must live until exit to flush the file writer.
pub fn init_logging(log_stderr: bool) -> Result<WorkerGuard> {
    let log_dir = default_home().join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = log_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed()
    });

    tracing_subscriber::registry()
        .with(log_filter())
        .with(stderr_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}
