use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Size past which the log file is rotated at startup.
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;
/// Rotated generations kept next to the live file (`bot.log.1` .. `bot.log.5`).
pub const LOG_GENERATIONS: usize = 5;

/// Maps a `LOG_LEVEL` value onto a tracing filter directive.
pub fn filter_directive(log_level: &str) -> String {
    let level = match log_level.trim().to_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" | "WARN" => "warn",
        "ERROR" | "CRITICAL" => "error",
        "TRACE" => "trace",
        _ => "info",
    };
    format!("{level},sqlx=warn,hyper=warn")
}

/// Installs the global subscriber: console output plus, when `log_file`
/// is given, an appending file layer without ANSI colours.
///
/// `RUST_LOG` overrides `log_level` when set.
pub fn init_tracing(log_level: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(log_level)));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
            }
            rotate_if_needed(path, MAX_LOG_BYTES, LOG_GENERATIONS)
                .with_context(|| format!("Failed to rotate {}", path.display()))?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_line_number(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Shifts `path` to `path.1` (and older generations up by one) once it
/// grows past `max_bytes`. Returns whether a rotation happened.
pub fn rotate_if_needed(path: &Path, max_bytes: u64, generations: usize) -> io::Result<bool> {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if size <= max_bytes || generations == 0 {
        return Ok(false);
    }

    let oldest = generation_path(path, generations);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }
    for n in (1..generations).rev() {
        let from = generation_path(path, n);
        if from.exists() {
            fs::rename(&from, generation_path(path, n + 1))?;
        }
    }
    fs::rename(path, generation_path(path, 1))?;
    Ok(true)
}

fn generation_path(path: &Path, n: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{n}"));
    PathBuf::from(name)
}

/// Logs command start with consistent format
pub fn log_command_start(command: &str, user_id: i64, details: Option<&str>) {
    match details {
        Some(d) => info!("CMD_START: {} by {} - {}", command, user_id, d),
        None => info!("CMD_START: {} by {}", command, user_id),
    }
}

/// Logs command completion with consistent format
pub fn log_command_success(command: &str, user_id: i64, details: Option<&str>) {
    match details {
        Some(d) => info!("CMD_SUCCESS: {} by {} - {}", command, user_id, d),
        None => info!("CMD_SUCCESS: {} by {}", command, user_id),
    }
}

/// Logs command errors with consistent format
pub fn log_command_error(command: &str, user_id: i64, error: &str) {
    error!("CMD_ERROR: {} by {} - {}", command, user_id, error);
}

pub fn log_database_operation(operation: &str, table: &str, details: Option<&str>) {
    match details {
        Some(d) => debug!("DB_OP: {} on {} - {}", operation, table, d),
        None => debug!("DB_OP: {} on {}", operation, table),
    }
}

pub fn log_database_error(operation: &str, table: &str, error: &str) {
    error!("DB_ERROR: {} on {} failed: {}", operation, table, error);
}

pub fn log_system_event(event: &str, details: Option<&str>) {
    match details {
        Some(d) => info!("SYSTEM: {} - {}", event, d),
        None => info!("SYSTEM: {}", event),
    }
}

pub fn log_system_warning(event: &str, details: &str) {
    warn!("SYSTEM: {} - {}", event, details);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_filter_directive_maps_python_levels() {
        assert!(filter_directive("DEBUG").starts_with("debug,"));
        assert!(filter_directive("warning").starts_with("warn,"));
        assert!(filter_directive("CRITICAL").starts_with("error,"));
        assert!(filter_directive("nonsense").starts_with("info,"));
    }

    #[test]
    fn test_small_file_is_not_rotated() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("bot.log");
        fs::write(&log, b"short").unwrap();

        assert!(!rotate_if_needed(&log, 1024, 5).unwrap());
        assert!(log.exists());
        assert!(!dir.path().join("bot.log.1").exists());
    }

    #[test]
    fn test_missing_file_is_not_an_error() {
        let dir = tempdir().unwrap();
        assert!(!rotate_if_needed(&dir.path().join("absent.log"), 10, 5).unwrap());
    }

    #[test]
    fn test_rotation_shifts_generations_and_drops_oldest() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("bot.log");
        fs::write(&log, b"current-current").unwrap();
        fs::write(dir.path().join("bot.log.1"), b"one").unwrap();
        fs::write(dir.path().join("bot.log.2"), b"two").unwrap();

        assert!(rotate_if_needed(&log, 4, 2).unwrap());

        assert!(!log.exists());
        assert_eq!(fs::read(dir.path().join("bot.log.1")).unwrap(), b"current-current");
        assert_eq!(fs::read(dir.path().join("bot.log.2")).unwrap(), b"one");
        assert!(!dir.path().join("bot.log.3").exists());
    }
}
