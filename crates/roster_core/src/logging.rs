//! Rolling file logging for roster core.
//!
//! # Responsibility
//! - Normalize logging configuration from arguments or environment.
//! - Start the `flexi_logger` backend at most once per process.
//!
//! # Invariants
//! - Re-initializing with an identical config is a no-op.
//! - Re-initializing with a different level or directory is rejected.
//! - Initialization never panics.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::info;
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "roster";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;

/// Environment variable holding the log level.
pub const LOG_LEVEL_ENV: &str = "ROSTER_LOG_LEVEL";
/// Environment variable holding the absolute log directory.
pub const LOG_DIR_ENV: &str = "ROSTER_LOG_DIR";

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();

struct LoggingState {
    config: LoggingConfig,
    _logger: LoggerHandle,
}

/// Validated logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    level: &'static str,
    log_dir: PathBuf,
}

impl LoggingConfig {
    /// Normalizes `level` and checks that `log_dir` is absolute.
    pub fn new(level: &str, log_dir: &str) -> Result<Self, String> {
        Ok(Self {
            level: normalize_level(level)?,
            log_dir: normalize_log_dir(log_dir)?,
        })
    }

    /// Reads `ROSTER_LOG_DIR` and optional `ROSTER_LOG_LEVEL`.
    ///
    /// Returns `Ok(None)` when no log directory is configured.
    pub fn from_env() -> Result<Option<Self>, String> {
        let Ok(log_dir) = std::env::var(LOG_DIR_ENV) else {
            return Ok(None);
        };
        let level =
            std::env::var(LOG_LEVEL_ENV).unwrap_or_else(|_| default_log_level().to_string());
        Self::new(&level, &log_dir).map(Some)
    }

    pub fn level(&self) -> &'static str {
        self.level
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

/// Starts file logging for the process.
///
/// # Errors
/// - Returns an error when the directory cannot be created or the backend
///   fails to start.
/// - Returns an error when logging is already active with another config.
pub fn init_logging(config: &LoggingConfig) -> Result<(), String> {
    if let Some(state) = LOGGING_STATE.get() {
        return ensure_same_config(&state.config, config);
    }

    let state = LOGGING_STATE.get_or_try_init(|| -> Result<LoggingState, String> {
        std::fs::create_dir_all(&config.log_dir).map_err(|err| {
            format!(
                "failed to create log directory `{}`: {err}",
                config.log_dir.display()
            )
        })?;

        let logger = Logger::try_with_str(config.level)
            .map_err(|err| format!("invalid log level `{}`: {err}", config.level))?
            .log_to_file(
                FileSpec::default()
                    .directory(config.log_dir.as_path())
                    .basename(LOG_FILE_BASENAME),
            )
            .rotate(
                Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                Naming::Numbers,
                Cleanup::KeepLogFiles(MAX_LOG_FILES),
            )
            .write_mode(WriteMode::BufferAndFlush)
            .append()
            .format_for_files(flexi_logger::detailed_format)
            .start()
            .map_err(|err| format!("failed to start logger: {err}"))?;

        info!(
            "event=core_init module=core status=ok level={} log_dir={} version={}",
            config.level,
            config.log_dir.display(),
            env!("CARGO_PKG_VERSION")
        );

        Ok(LoggingState {
            config: config.clone(),
            _logger: logger,
        })
    })?;

    ensure_same_config(&state.config, config)
}

/// Returns the active config, or `None` before `init_logging` succeeds.
pub fn logging_status() -> Option<LoggingConfig> {
    LOGGING_STATE.get().map(|state| state.config.clone())
}

/// `debug` for debug builds, `info` for release builds.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn ensure_same_config(active: &LoggingConfig, requested: &LoggingConfig) -> Result<(), String> {
    if active.log_dir != requested.log_dir {
        return Err(format!(
            "logging already initialized at `{}`; refusing to switch to `{}`",
            active.log_dir.display(),
            requested.log_dir.display()
        ));
    }
    if active.level != requested.level {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{}`",
            active.level, requested.level
        ));
    }
    Ok(())
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn normalize_log_dir(log_dir: &str) -> Result<PathBuf, String> {
    let trimmed = log_dir.trim();
    if trimmed.is_empty() {
        return Err("log_dir cannot be empty".to_string());
    }
    let path = Path::new(trimmed);
    if !path.is_absolute() {
        return Err(format!("log_dir must be an absolute path, got `{trimmed}`"));
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, normalize_level, LoggingConfig};

    #[test]
    fn normalize_level_accepts_known_values() {
        assert_eq!(normalize_level("INFO").unwrap(), "info");
        assert_eq!(normalize_level(" warning ").unwrap(), "warn");
        assert!(normalize_level("verbose").is_err());
    }

    #[test]
    fn config_rejects_relative_or_empty_dir() {
        let error = LoggingConfig::new("info", "logs/dev").unwrap_err();
        assert!(error.contains("absolute"));
        assert!(LoggingConfig::new("info", "  ").is_err());
    }

    #[test]
    fn init_logging_is_idempotent_and_rejects_conflicts() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let first_dir = first.path().to_str().unwrap();
        let second_dir = second.path().to_str().unwrap();

        let config = LoggingConfig::new("info", first_dir).unwrap();
        init_logging(&config).unwrap();
        init_logging(&config).unwrap();

        let level_error = init_logging(&LoggingConfig::new("debug", first_dir).unwrap())
            .expect_err("level conflict should fail");
        assert!(level_error.contains("refusing to switch"));

        let dir_error = init_logging(&LoggingConfig::new("info", second_dir).unwrap())
            .expect_err("directory conflict should fail");
        assert!(dir_error.contains("refusing to switch"));

        assert_eq!(logging_status(), Some(config));
    }
}
