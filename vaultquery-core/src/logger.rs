//! Log routing.
//!
//! The crate logs through the `log` facade. Embedding applications route
//! those records either to a host logger with [`set_logger`], or to a
//! `tracing` subscriber printing to stderr with [`init_tracing`].

use std::sync::{Arc, OnceLock};

use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Receives the crate's log messages.
///
/// Exported via `UniFFI` when the `ffi` feature is enabled, so Swift and
/// Kotlin hosts can forward messages to their own logging.
///
/// ```rust
/// use vaultquery_core::logger::{LogLevel, Logger};
///
/// struct StderrLogger;
///
/// impl Logger for StderrLogger {
///     fn log(&self, level: LogLevel, message: String) {
///         eprintln!("[{level:?}] {message}");
///     }
/// }
/// ```
#[cfg_attr(feature = "ffi", uniffi::export(with_foreign))]
pub trait Logger: Sync + Send {
    /// Logs `message` at `level`.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum LogLevel {
    /// Very detailed diagnostics.
    Trace,
    /// Debugging information.
    Debug,
    /// Progress of the application.
    Info,
    /// Potentially harmful situations, such as a search that was never closed.
    Warn,
    /// Failures.
    Error,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => Self::Error,
            log::Level::Warn => Self::Warn,
            log::Level::Info => Self::Info,
            log::Level::Debug => Self::Debug,
            log::Level::Trace => Self::Trace,
        }
    }
}

static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();

/// Forwards `log` records to the installed [`Logger`].
struct ForeignLogger;

impl ForeignLogger {
    /// Debug and trace records are only forwarded from this crate's modules.
    fn forwards(metadata: &log::Metadata) -> bool {
        metadata.level() <= log::Level::Info || metadata.target().starts_with("vaultquery")
    }
}

impl log::Log for ForeignLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        Self::forwards(metadata)
    }

    fn log(&self, record: &log::Record) {
        if !Self::forwards(record.metadata()) {
            return;
        }
        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(record.level().into(), record.args().to_string());
        } else {
            eprintln!("Logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Installs `logger` as the destination of every log message.
///
/// Only the first call has an effect. Call it once, early, before any other
/// function of this crate.
#[cfg_attr(feature = "ffi", uniffi::export)]
pub fn set_logger(logger: Arc<dyn Logger>) {
    static LOGGER: ForeignLogger = ForeignLogger;

    if LOGGER_INSTANCE.set(logger).is_err() {
        eprintln!("Logger already set");
        return;
    }
    match log::set_logger(&LOGGER) {
        Ok(()) => log::set_max_level(log::LevelFilter::Trace),
        Err(e) => eprintln!("Failed to set logger: {e}"),
    }
}

/// Prints log messages to stderr through a `tracing` subscriber.
///
/// The filter comes from `RUST_LOG` when set, `default_filter` (for example
/// `"vaultquery_core=debug"`) otherwise. Returns `false` if a subscriber or
/// logger was already installed; this is what repeated calls from tests see.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
        .try_init()
        .is_ok();
    installed && tracing_log::LogTracer::init().is_ok()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use test_case::test_case;

    use super::*;

    #[derive(Default)]
    struct CapturingLogger {
        messages: Mutex<Vec<(LogLevel, String)>>,
    }

    impl Logger for CapturingLogger {
        fn log(&self, level: LogLevel, message: String) {
            self.messages.lock().unwrap().push((level, message));
        }
    }

    #[test_case(log::Level::Error, LogLevel::Error)]
    #[test_case(log::Level::Warn, LogLevel::Warn)]
    #[test_case(log::Level::Info, LogLevel::Info)]
    #[test_case(log::Level::Debug, LogLevel::Debug)]
    #[test_case(log::Level::Trace, LogLevel::Trace)]
    fn test_level_mapping(level: log::Level, expected: LogLevel) {
        assert_eq!(LogLevel::from(level), expected);
    }

    #[test_case(log::Level::Warn, "hyper::client", true)]
    #[test_case(log::Level::Info, "hyper::client", true)]
    #[test_case(log::Level::Debug, "hyper::client", false)]
    #[test_case(log::Level::Trace, "hyper::client", false)]
    #[test_case(log::Level::Debug, "vaultquery_core::records", true)]
    #[test_case(log::Level::Trace, "vaultquery_core::bridge", true)]
    fn test_forwarding_filter(level: log::Level, target: &str, expected: bool) {
        let metadata = log::Metadata::builder().level(level).target(target).build();
        assert_eq!(ForeignLogger::forwards(&metadata), expected);
    }

    #[test]
    fn test_records_reach_the_installed_logger() {
        let capturing = Arc::new(CapturingLogger::default());
        set_logger(capturing.clone());

        log::warn!("search leaked");
        log::debug!(target: "other_crate", "ignored");

        let messages = capturing.messages.lock().unwrap();
        assert!(messages.contains(&(LogLevel::Warn, "search leaked".to_string())));
        assert!(!messages.iter().any(|(_, message)| message == "ignored"));
    }
}
