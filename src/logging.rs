// ABOUTME: Tracing setup writing timestamped, leveled lines to the log file and stderr
// ABOUTME: Returns the appender guard that must live until the process exits

use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{Builder, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber.
///
/// Defaults to INFO when `RUST_LOG` is not set. Drop the returned guard only
/// after the last log line, otherwise buffered lines never reach the file.
pub fn init_logging(log_path: &Path) -> Result<WorkerGuard> {
    let (dir, file_name) = split_log_path(log_path)?;
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = Builder::new()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(&dir)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false)
                .with_target(false),
        )
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// Split a log file path into its directory (current directory if none) and file name
fn split_log_path(path: &Path) -> Result<(PathBuf, String)> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow!("Log file path {} has no file name", path.display()))?
        .to_string();

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    Ok((dir, file_name))
}
