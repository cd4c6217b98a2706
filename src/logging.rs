//! Process-wide logging and named log sinks.
//!
//! This module provides:
//! - A `tracing` subscriber writing to stderr, configured once at startup
//! - Two named sinks: one for the chat framework's own diagnostics and one
//!   for the dispatch core
//! - An in-memory sink for embedders and tests that need to inspect records
//!
//! Log levels may be overridden with `RUST_LOG`.

use std::sync::{Arc, Mutex, OnceLock};

use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

/// Name of the sink carrying this crate's own messages.
pub const CORE_SINK: &str = "iam";

/// `tracing` target the core sink emits under.
pub const CORE_TARGET: &str = "iam::core";

/// `tracing` target the framework sink emits under.
pub const FRAMEWORK_TARGET: &str = "iam::framework";

/// Log level configuration for the logging middleware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level - most verbose
    Trace,
    /// Debug level
    Debug,
    /// Info level (default)
    #[default]
    Info,
    /// Warning level
    Warn,
    /// Error level - least verbose
    Error,
    /// Disable logging entirely
    Off,
}

impl LogLevel {
    /// The directive string understood by [`EnvFilter`].
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

impl From<u8> for LogLevel {
    /// Convert verbosity count to log level.
    /// 0 = Info, 1 = Debug, 2+ = Trace
    fn from(verbosity: u8) -> Self {
        match verbosity {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }
}

/// Configuration for the logging middleware.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Level for the core sink and everything not otherwise configured
    pub level: LogLevel,
    /// `tracing` target the chat framework logs under
    pub framework_target: String,
    /// Level for the framework's own diagnostics
    pub framework_level: LogLevel,
    /// Whether to include timestamps
    pub with_timestamps: bool,
    /// Whether to include the target (module path)
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            framework_target: "serenity".to_string(),
            framework_level: LogLevel::Info,
            with_timestamps: true,
            with_target: true,
        }
    }
}

impl LoggingConfig {
    /// Create a new logging configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level.
    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// Set the framework's target and level.
    pub fn with_framework(mut self, target: impl Into<String>, level: LogLevel) -> Self {
        self.framework_target = target.into();
        self.framework_level = level;
        self
    }

    /// Set whether to include timestamps.
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.with_timestamps = enabled;
        self
    }

    /// Set whether to include the target (module path).
    pub fn with_target(mut self, enabled: bool) -> Self {
        self.with_target = enabled;
        self
    }

    /// The filter directives this configuration produces.
    ///
    /// The framework level applies both to the framework's own target and to
    /// the framework sink's [`FRAMEWORK_TARGET`].
    pub fn directives(&self) -> String {
        let framework = self.framework_level.as_directive();
        format!(
            "{},{}={},{}={}",
            self.level.as_directive(),
            self.framework_target,
            framework,
            FRAMEWORK_TARGET,
            framework
        )
    }
}

/// One log entry written to a [`LogSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    /// Full cause chain or backtrace, when the entry describes an error.
    pub trace: Option<String>,
}

/// A named, independently addressable log destination.
pub trait LogSink: Send + Sync {
    fn name(&self) -> &str;

    fn write(&self, record: LogRecord);

    fn error(&self, message: &str, trace: Option<&str>) {
        self.write(LogRecord {
            level: Level::ERROR,
            message: message.to_string(),
            trace: trace.map(str::to_string),
        });
    }

    fn warn(&self, message: &str) {
        self.write(LogRecord {
            level: Level::WARN,
            message: message.to_string(),
            trace: None,
        });
    }

    fn info(&self, message: &str) {
        self.write(LogRecord {
            level: Level::INFO,
            message: message.to_string(),
            trace: None,
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkTarget {
    Core,
    Framework,
}

/// Sink forwarding records to the global `tracing` subscriber.
///
/// Each sink emits under its own target so filter directives reach it
/// independently.
#[derive(Debug, Clone)]
pub struct TracingSink {
    name: String,
    target: SinkTarget,
}

impl TracingSink {
    /// The dispatch core's sink, emitting under [`CORE_TARGET`].
    pub fn core() -> Self {
        Self {
            name: CORE_SINK.to_string(),
            target: SinkTarget::Core,
        }
    }

    /// The framework's sink, emitting under [`FRAMEWORK_TARGET`].
    pub fn framework(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: SinkTarget::Framework,
        }
    }
}

// Targets and levels must be constants at each callsite.
macro_rules! emit {
    ($target:expr, $level:expr, $sink:expr, $trace:expr, $message:expr) => {
        match $level {
            Level::ERROR => tracing::error!(target: $target, sink = $sink, trace = $trace, "{}", $message),
            Level::WARN => tracing::warn!(target: $target, sink = $sink, trace = $trace, "{}", $message),
            Level::INFO => tracing::info!(target: $target, sink = $sink, trace = $trace, "{}", $message),
            Level::DEBUG => tracing::debug!(target: $target, sink = $sink, trace = $trace, "{}", $message),
            _ => tracing::trace!(target: $target, sink = $sink, trace = $trace, "{}", $message),
        }
    };
}

impl LogSink for TracingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, record: LogRecord) {
        let sink = self.name.as_str();
        let trace = record.trace.as_deref().unwrap_or("");
        let message = record.message.as_str();
        match self.target {
            SinkTarget::Core => emit!(CORE_TARGET, record.level, sink, trace, message),
            SinkTarget::Framework => emit!(FRAMEWORK_TARGET, record.level, sink, trace, message),
        }
    }
}

/// Sink that keeps every record in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    name: String,
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the records written so far.
    pub fn records(&self) -> Vec<LogRecord> {
        match self.records.lock() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Records at error severity.
    pub fn errors(&self) -> Vec<LogRecord> {
        self.records()
            .into_iter()
            .filter(|r| r.level == Level::ERROR)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

impl LogSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, record: LogRecord) {
        match self.records.lock() {
            Ok(mut records) => records.push(record),
            Err(poisoned) => poisoned.into_inner().push(record),
        }
    }
}

/// The process's named sinks.
#[derive(Clone)]
pub struct LogSinks {
    /// The chat framework's internal diagnostics.
    pub framework: Arc<dyn LogSink>,
    /// The dispatch core's own messages.
    pub core: Arc<dyn LogSink>,
}

impl std::fmt::Debug for LogSinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSinks")
            .field("framework", &self.framework.name())
            .field("core", &self.core.name())
            .finish()
    }
}

static SINKS: OnceLock<LogSinks> = OnceLock::new();

/// Initialize the logging middleware with the given configuration.
///
/// Only the first call installs the subscriber and creates the sinks; later
/// calls return the sinks created by the first one. Logs are written to stderr.
///
/// # Examples
///
/// ```no_run
/// use iam_dispatch::logging::{init_logging, LoggingConfig, LogLevel};
///
/// let sinks = init_logging(LoggingConfig::new().with_level(LogLevel::Debug));
/// sinks.core.info("ready");
/// ```
pub fn init_logging(config: LoggingConfig) -> &'static LogSinks {
    SINKS.get_or_init(|| {
        let env_filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(config.directives())
        };

        let subscriber = fmt::Subscriber::builder()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_target(config.with_target);

        // Another subscriber may already be installed (tests, embedders);
        // the sinks still forward to whichever one is global.
        let _ = if config.with_timestamps {
            subscriber.try_init()
        } else {
            subscriber.without_time().try_init()
        };

        LogSinks {
            framework: Arc::new(TracingSink::framework(config.framework_target.clone())),
            core: Arc::new(TracingSink::core()),
        }
    })
}

/// The sinks created by [`init_logging`], if it has run.
pub fn sinks() -> Option<&'static LogSinks> {
    SINKS.get()
}
