//! Logging utilities.
//!
//! The terminal belongs to the UI, so log records go to a size-rotated file
//! in the user's cache directory instead of stderr.

use std::fs::remove_file;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::BaseDirs;
use env_logger::{Builder, Target, fmt::TimestampPrecision};
use file_rotate::compression::Compression;
use file_rotate::suffix::AppendCount;
use file_rotate::{ContentLimit, FileRotate};
use log::LevelFilter;

/// Name of the log file inside the cache directory.
const LOG_FILE_NAME: &str = "quote_cards.log";

/// Size at which the log file is rotated.
const MAX_LOG_BYTES: usize = 1024 * 1024;

/// Rotated files kept next to the live one.
const KEPT_LOG_FILES: usize = 3;

/// Default location of the log file.
///
/// # Errors
///
/// Returns an error if the user's cache directory cannot be determined.
pub fn default_log_path() -> Result<PathBuf>
{
    let dirs = BaseDirs::new().context("Failed to determine the cache directory")?;
    Ok(dirs.cache_dir().join(LOG_FILE_NAME))
}

/// Opens the rotating writer behind the logger.
fn open_log_writer(log_path: &Path) -> Result<FileRotate<AppendCount>>
{
    if let Some(parent) = log_path.parent()
    {
        std::fs::create_dir_all(parent)
            .context(format!("Failed to create log directory {}", parent.display()))?;
    }

    Ok(FileRotate::new(
        log_path,
        AppendCount::new(KEPT_LOG_FILES),
        ContentLimit::Bytes(MAX_LOG_BYTES),
        Compression::None,
        #[cfg(unix)]
        None,
    ))
}

/// Initializes the logging system for the application.
///
/// Records at `Info` and above are kept, `Debug` for this crate. `RUST_LOG`
/// overrides both.
///
/// # Errors
///
/// Returns an error if the log directory cannot be created or a logger is
/// already installed.
pub fn init_logging(log_path: &Path) -> Result<()>
{
    let writer = open_log_writer(log_path)?;

    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter_module("quote_cards", LevelFilter::Debug)
        .parse_default_env()
        .format_timestamp(Some(TimestampPrecision::Millis))
        .target(Target::Pipe(Box::new(writer)))
        .try_init()
        .context("Failed to install the logger")
}

/// Removes the log file.
///
/// A missing file is not an error.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be removed.
pub fn clear_log_file(log_path: &Path) -> Result<()>
{
    match remove_file(log_path)
    {
        Err(err) if err.kind() != ErrorKind::NotFound =>
        {
            Err(err).context(format!("Failed to remove {}", log_path.display()))
        }
        _ => Ok(()),
    }
}
