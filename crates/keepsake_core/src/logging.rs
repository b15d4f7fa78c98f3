//! Rolling file logging for keepsake processes.
//!
//! # Responsibility
//! - Start the `flexi_logger` file backend once per process.
//! - Capture panics as sanitised, metadata-only log events.
//!
//! # Invariants
//! - Initialisation never panics.
//! - A second call with the same level and directory is a no-op; any other
//!   second call is rejected.

use crate::config::LoggingConfig;
use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "keepsake";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 8 * 1024 * 1024;
const MAX_LOG_FILES: usize = 4;
const MAX_PANIC_PAYLOAD_CHARS: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    level: &'static str,
    dir: PathBuf,
    _handle: LoggerHandle,
}

pub type LoggingResult<T> = Result<T, LoggingError>;

#[derive(Debug)]
pub enum LoggingError {
    UnsupportedLevel(String),
    MissingDirectory,
    RelativeDirectory(PathBuf),
    CreateDirectory {
        dir: PathBuf,
        source: std::io::Error,
    },
    Backend(flexi_logger::FlexiLoggerError),
    AlreadyInitialised {
        level: &'static str,
        dir: PathBuf,
    },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => write!(
                f,
                "unsupported log level `{level}`; expected trace|debug|info|warn|error"
            ),
            Self::MissingDirectory => write!(f, "no log directory configured"),
            Self::RelativeDirectory(dir) => {
                write!(f, "log directory must be absolute, got `{}`", dir.display())
            }
            Self::CreateDirectory { dir, source } => write!(
                f,
                "failed to create log directory `{}`: {source}",
                dir.display()
            ),
            Self::Backend(err) => write!(f, "failed to start logger: {err}"),
            Self::AlreadyInitialised { level, dir } => write!(
                f,
                "logging already running at `{}` with level `{level}`",
                dir.display()
            ),
        }
    }
}

impl Error for LoggingError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::CreateDirectory { source, .. } => Some(source),
            Self::Backend(err) => Some(err),
            _ => None,
        }
    }
}

/// Starts file logging from configuration.
///
/// # Errors
/// - `MissingDirectory` / `RelativeDirectory` for an unusable `dir`.
/// - `UnsupportedLevel` for an unknown level name.
/// - `AlreadyInitialised` when a different level or directory is active.
pub fn init_logging(config: &LoggingConfig) -> LoggingResult<()> {
    let level = normalize_level(&config.level)?;
    let dir = normalize_dir(config.dir.as_deref())?;

    if let Some(active) = ACTIVE.get() {
        return ensure_same(active, level, &dir);
    }

    let active = ACTIVE.get_or_try_init(|| start_backend(level, &dir))?;
    ensure_same(active, level, &dir)
}

/// `(level, dir)` of the running logger, if any.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE.get().map(|active| (active.level, active.dir.clone()))
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_backend(level: &'static str, dir: &Path) -> LoggingResult<ActiveLogger> {
    std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDirectory {
        dir: dir.to_path_buf(),
        source,
    })?;

    let handle = Logger::try_with_str(level)
        .map_err(LoggingError::Backend)?
        .log_to_file(
            FileSpec::default()
                .directory(dir)
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
        .map_err(LoggingError::Backend)?;

    install_panic_hook();
    info!(
        "event=logging_start module=logging status=ok level={} dir={} version={}",
        level,
        dir.display(),
        env!("CARGO_PKG_VERSION")
    );

    Ok(ActiveLogger {
        level,
        dir: dir.to_path_buf(),
        _handle: handle,
    })
}

fn ensure_same(active: &ActiveLogger, level: &'static str, dir: &Path) -> LoggingResult<()> {
    if active.level == level && active.dir == dir {
        return Ok(());
    }
    Err(LoggingError::AlreadyInitialised {
        level: active.level,
        dir: active.dir.clone(),
    })
}

fn normalize_level(level: &str) -> LoggingResult<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(LoggingError::UnsupportedLevel(other.to_string())),
    }
}

fn normalize_dir(dir: Option<&Path>) -> LoggingResult<PathBuf> {
    let dir = dir.ok_or(LoggingError::MissingDirectory)?;
    if dir.as_os_str().is_empty() {
        return Err(LoggingError::MissingDirectory);
    }
    if !dir.is_absolute() {
        return Err(LoggingError::RelativeDirectory(dir.to_path_buf()));
    }
    Ok(dir.to_path_buf())
}

fn install_panic_hook() {
    if PANIC_HOOK.get().is_some() {
        return;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!(
            "event=panic_captured module=logging status=error location={} payload={}",
            location,
            panic_payload(panic_info)
        );
        previous(panic_info);
    }));

    let _ = PANIC_HOOK.set(());
}

fn panic_payload(info: &std::panic::PanicHookInfo<'_>) -> String {
    let payload = info
        .payload()
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| info.payload().downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "non-string panic payload".to_string());
    sanitize(&payload, MAX_PANIC_PAYLOAD_CHARS)
}

/// Single-line, length-capped copy of a message that may contain user text.
fn sanitize(value: &str, max_chars: usize) -> String {
    let single_line = value.replace(['\n', '\r'], " ");
    let mut capped: String = single_line.chars().take(max_chars).collect();
    if single_line.chars().count() > max_chars {
        capped.push_str("...");
    }
    capped
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, normalize_dir, normalize_level, sanitize};
    use super::LoggingError;
    use crate::config::LoggingConfig;
    use std::path::Path;

    #[test]
    fn level_names_are_normalized() {
        assert_eq!(normalize_level(" WARNING ").expect("warning is known"), "warn");
        assert!(matches!(
            normalize_level("loud"),
            Err(LoggingError::UnsupportedLevel(_))
        ));
    }

    #[test]
    fn relative_and_missing_dirs_are_rejected() {
        assert!(matches!(
            normalize_dir(Some(Path::new("logs/dev"))),
            Err(LoggingError::RelativeDirectory(_))
        ));
        assert!(matches!(normalize_dir(None), Err(LoggingError::MissingDirectory)));
    }

    #[test]
    fn sanitize_flattens_and_caps() {
        let sanitized = sanitize("first\nsecond\rthird", 8);
        assert_eq!(sanitized, "first se...");
    }

    #[test]
    fn init_is_idempotent_and_rejects_conflicts() {
        let dir = tempfile::tempdir()
            .expect("tempdir should be created")
            .into_path();
        let config = LoggingConfig {
            level: "info".to_string(),
            dir: Some(dir.clone()),
        };

        init_logging(&config).expect("first init should succeed");
        init_logging(&config).expect("same config should be a no-op");

        let louder = LoggingConfig {
            level: "debug".to_string(),
            ..config.clone()
        };
        assert!(matches!(
            init_logging(&louder),
            Err(LoggingError::AlreadyInitialised { .. })
        ));

        let (level, active_dir) = logging_status().expect("logging should be active");
        assert_eq!(level, "info");
        assert_eq!(active_dir, dir);
    }
}
