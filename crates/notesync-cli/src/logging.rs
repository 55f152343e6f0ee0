//! Tracing subscriber setup from the `logging` config section

use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use colored::Colorize;
use notesync_core::config::LoggingSection;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::error::{CliError, Result};

/// How the command line wants logs shown
#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    /// Force debug level, ignoring RUST_LOG and the config
    pub verbose: bool,
    /// Keep stderr free of log lines (JSON and quiet api modes)
    pub quiet: bool,
}

/// Install the global subscriber.
///
/// The level comes from `--verbose`, then `RUST_LOG`, then `logging.level`.
/// Console output goes to stderr so stdout stays usable for JSON. A log file
/// that cannot be opened is reported and skipped.
pub fn init(logging: &LoggingSection, options: LogOptions) -> Result<()> {
    let filter = if options.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured_level(logging)))
    };

    let console_layer = (logging.console_output && !options.quiet).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(options.verbose)
            .compact()
    });

    let file_layer = match logging.log_file.as_deref().map(open_log_file) {
        Some(Ok(file)) => Some(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        ),
        Some(Err(e)) => {
            if !options.quiet {
                eprintln!("{}: log file disabled: {}", "warning".yellow().bold(), e);
            }
            None
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::user(format!("Failed to initialise logging: {}", e)))?;

    tracing::debug!(verbose = options.verbose, "Logging initialised");
    Ok(())
}

/// Filter directive for the configured level; invalid names fall back to info
fn configured_level(logging: &LoggingSection) -> &'static str {
    logging
        .log_level()
        .map(|level| level.as_filter())
        .unwrap_or("info")
}

/// Open the log file for appending, creating its parent directory
fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}
