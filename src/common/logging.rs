//! Logging and tracing configuration
//!
//! A [`LogProvider`] is built once at startup. It owns the subscriber (a
//! console layer on stderr plus an optional size-rotated file layer) and
//! hands out [`Logger`] handles that components keep and log through.
//! Nothing is installed as the global default subscriber.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::field::MakeVisitor;
use tracing_subscriber::fmt::format::{DefaultVisitor, Writer};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

use super::config::LoggingConfig;
use super::{Error, Result};

/// Owns the log sinks for the lifetime of the process
pub struct LogProvider {
    dispatch: Dispatch,
    log_file: Option<PathBuf>,
    // Flushes the file writer on drop
    _guard: Option<WorkerGuard>,
}

impl LogProvider {
    /// Build the console sink and, if configured, the rotating file sink
    ///
    /// The filter comes from `RUST_LOG` when set, otherwise from
    /// `config.level` for this crate and WARN for dependencies.
    pub fn init(config: &LoggingConfig) -> Result<Self> {
        let filter = match EnvFilter::try_from_default_env() {
            Ok(filter) => filter,
            Err(_) => EnvFilter::try_new(format!("harness={},warn", config.level))
                .map_err(|e| Error::Config(format!("Invalid log level '{}': {}", config.level, e)))?,
        };

        let console_layer = fmt::layer()
            .with_writer(io::stderr)
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact();

        // Fall back to console-only logging if the file can't be opened
        let writer = config.file.as_ref().and_then(|path| {
            match RotatingFile::open(path, config.max_bytes, config.backup_count) {
                Ok(writer) => Some((path.clone(), writer)),
                Err(e) => {
                    eprintln!(
                        "Warning: Could not open log file {}: {}",
                        path.display(),
                        e
                    );
                    None
                }
            }
        });

        let (file_layer, guard, log_file) = match writer {
            Some((path, writer)) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(writer);
                let layer = fmt::layer()
                    .fmt_fields(PlainFields)
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false);
                (Some(layer), Some(guard), Some(path))
            }
            None => (None, None, None),
        };

        let subscriber = tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer);

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
            log_file,
            _guard: guard,
        })
    }

    /// A provider whose loggers discard everything
    pub fn disabled() -> Self {
        Self {
            dispatch: Dispatch::none(),
            log_file: None,
            _guard: None,
        }
    }

    /// Get a named logger backed by this provider's sinks
    pub fn logger(&self, name: &'static str) -> Logger {
        Logger {
            name,
            dispatch: self.dispatch.clone(),
        }
    }

    /// Path of the rotating log file, if file logging is enabled
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

/// Cheap, cloneable handle used by components to emit log events
#[derive(Clone)]
pub struct Logger {
    name: &'static str,
    dispatch: Dispatch,
}

impl Logger {
    /// A logger that discards everything
    pub fn noop() -> Self {
        Self {
            name: "noop",
            dispatch: Dispatch::none(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run `f` with this logger's sinks receiving any `tracing` events
    pub fn scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, || {
            let span = tracing::info_span!("logger", component = self.name);
            let _entered = span.enter();
            f()
        })
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger").field("name", &self.name).finish()
    }
}

/// Field formatter for the file layer
///
/// Span fields are cached per formatter type, so sharing the default one with
/// the console layer would leak its ANSI styling into the file.
struct PlainFields;

impl<'a> MakeVisitor<Writer<'a>> for PlainFields {
    type Visitor = DefaultVisitor<'a>;

    fn make_visitor(&self, target: Writer<'a>) -> Self::Visitor {
        DefaultVisitor::new(target, true)
    }
}

/// A log file that rotates by size
///
/// Once a write would take the file to `max_bytes` or more, `app.log`
/// becomes `app.log.1`, `app.log.1` becomes `app.log.2`, and so on; files
/// past `backup_count` are dropped. A `backup_count` of zero disables
/// rotation.
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    file: Option<File>,
    written: u64,
}

impl RotatingFile {
    /// Open (or create) the log file in append mode, creating parent dirs
    pub fn open(path: &Path, max_bytes: u64, backup_count: usize) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path: path.to_path_buf(),
            max_bytes,
            backup_count,
            file: Some(file),
            written,
        })
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn should_rotate(&self, incoming: usize) -> bool {
        self.max_bytes > 0
            && self.backup_count > 0
            && self.written > 0
            && self.written + incoming as u64 >= self.max_bytes
    }

    fn rotate(&mut self) -> io::Result<()> {
        // Close before renaming so this also works where open files are locked
        self.file.take();

        for index in (1..self.backup_count).rev() {
            let src = self.backup_path(index);
            if src.exists() {
                let dst = self.backup_path(index + 1);
                if dst.exists() {
                    fs::remove_file(&dst)?;
                }
                fs::rename(&src, &dst)?;
            }
        }

        let first = self.backup_path(1);
        if first.exists() {
            fs::remove_file(&first)?;
        }
        fs::rename(&self.path, &first)?;

        self.file = Some(
            OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.path)?,
        );
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.should_rotate(buf.len()) {
            self.rotate()?;
        }
        if self.file.is_none() {
            self.file = Some(OpenOptions::new().create(true).append(true).open(&self.path)?);
        }
        let n = match self.file.as_mut() {
            Some(file) => file.write(buf)?,
            None => 0,
        };
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap_or_default()
    }

    #[test]
    fn test_rotating_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("test.log");
        let mut file = RotatingFile::open(&path, 100, 2).unwrap();
        file.write_all(b"hello\n").unwrap();
        file.flush().unwrap();
        assert_eq!(read(&path), "hello\n");
    }

    #[test]
    fn test_rotation_keeps_backup_count_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.log");
        let mut file = RotatingFile::open(&path, 10, 2).unwrap();

        for line in ["aaaaaaaa\n", "bbbbbbbb\n", "cccccccc\n", "dddddddd\n"] {
            file.write_all(line.as_bytes()).unwrap();
        }
        file.flush().unwrap();

        assert_eq!(read(&path), "dddddddd\n");
        assert_eq!(read(&dir.path().join("test.log.1")), "cccccccc\n");
        assert_eq!(read(&dir.path().join("test.log.2")), "bbbbbbbb\n");
        assert!(!dir.path().join("test.log.3").exists());
    }

    #[test]
    fn test_zero_backups_never_rotates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.log");
        let mut file = RotatingFile::open(&path, 4, 0).unwrap();
        file.write_all(b"12345\n67890\n").unwrap();
        file.write_all(b"more\n").unwrap();
        file.flush().unwrap();
        assert_eq!(read(&path), "12345\n67890\nmore\n");
        assert!(!dir.path().join("test.log.1").exists());
    }

    #[test]
    fn test_reopen_appends_and_counts_existing_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.log");
        fs::write(&path, "0123456789").unwrap();
        let mut file = RotatingFile::open(&path, 12, 1).unwrap();
        file.write_all(b"abc").unwrap();
        file.flush().unwrap();
        assert_eq!(read(&path), "abc");
        assert_eq!(read(&dir.path().join("test.log.1")), "0123456789");
    }

    #[test]
    fn test_provider_writes_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("harness.log");
        let config = LoggingConfig {
            level: "info".to_string(),
            file: Some(path.clone()),
            max_bytes: 1_000_000,
            backup_count: 3,
        };

        {
            let provider = LogProvider::init(&config).unwrap();
            assert_eq!(provider.log_file(), Some(path.as_path()));
            let logger = provider.logger("api_client");
            logger.scope(|| tracing::info!("Sending GET request to http://h/x"));
        }

        let content = read(&path);
        assert!(content.contains("Sending GET request to http://h/x"));
        assert!(content.contains("component=\"api_client\""));
        assert!(!content.contains("\x1b["), "ANSI escapes in log file: {content:?}");
    }

    #[test]
    fn test_unopenable_log_file_falls_back_to_console() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "").unwrap();
        let config = LoggingConfig {
            file: Some(blocker.join("test.log")),
            ..LoggingConfig::default()
        };

        let provider = LogProvider::init(&config).unwrap();
        assert!(provider.log_file().is_none());
        provider
            .logger("api_client")
            .scope(|| tracing::info!("still logging"));
    }

    #[test]
    fn test_invalid_level_is_config_error() {
        if std::env::var("RUST_LOG").is_ok() {
            return;
        }
        let config = LoggingConfig {
            level: "not a level!!".to_string(),
            file: None,
            ..LoggingConfig::default()
        };
        assert!(matches!(LogProvider::init(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_disabled_provider_has_no_file() {
        let provider = LogProvider::disabled();
        assert!(provider.log_file().is_none());
        let logger = provider.logger("api_client");
        assert_eq!(logger.name(), "api_client");
        logger.scope(|| tracing::info!("dropped"));
    }

    #[test]
    fn test_noop_logger_runs_closure() {
        let logger = Logger::noop();
        assert_eq!(logger.scope(|| 2 + 2), 4);
    }
}
