//! Logging setup for nutriscope.
//!
//! Log records go to stderr (so they never interleave with report output on
//! stdout) and to a daily-rotating file in the app data directory.
//!
//! ```no_run
//! nutriscope::logging::init(false).expect("Failed to initialize logging");
//! tracing::info!("App started");
//! ```

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    EnvFilter, Layer as _, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _,
};

/// Gets the log directory path based on platform conventions
///
/// Returns:
/// - Windows: `%APPDATA%/nutriscope/logs`
/// - macOS: `~/Library/Application Support/nutriscope/logs`
/// - Linux: `~/.local/share/nutriscope/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let log_dir = crate::utils::standard_paths().data_dir.join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

/// Initializes console and file logging.
///
/// The console layer defaults to `warn` (`info` with `verbose`) so the
/// interactive menu stays readable; `RUST_LOG` overrides both. The file layer
/// always records `info` and above.
///
/// # Errors
///
/// Returns error if the log directory or file appender cannot be created.
pub fn init(verbose: bool) -> Result<()> {
    let log_dir = get_log_dir()?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix("nutriscope")
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to create log file appender")?;

    let default_level = if verbose { "info" } else { "warn" };
    let console_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .context("Failed to create env filter")?;

    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_filter(console_filter);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false)
        .with_writer(file_appender)
        .with_filter(EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!("Logging initialized, log directory: {}", log_dir.display());

    Ok(())
}
