use std::backtrace::Backtrace;
use std::fmt;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::config::Config;
use crate::encoder::select_encoder;
use crate::error::{Error, Result};
use crate::level::Severity;
use crate::record::{Caller, Record};
use crate::rotation;
use crate::sink::{compose, ConsoleSink, FanOut, Sink};

/// What a fatal record does once every sink has been flushed.
pub type ExitHook = Arc<dyn Fn() + Send + Sync>;

/// The default [`ExitHook`]: terminates the process with status 1.
pub fn exit_process() -> ExitHook {
    Arc::new(|| std::process::exit(1))
}

const NO_FIELDS: [(&str, Value); 0] = [];

/// A constructed logger instance.
///
/// Loggers are immutable once built and safe to share between threads; the
/// sinks serialize their own writes. They are normally obtained from a
/// [`Registry`](crate::Registry), which guarantees one instance per name.
///
/// Dropping the last handle flushes the sinks and closes the log file.
pub struct Logger {
    name: String,
    config: Arc<Config>,
    sinks: FanOut,
    file_path: Option<PathBuf>,
    exit: ExitHook,
}

impl Logger {
    /// Builds the console and file sinks described by `config`.
    pub fn build(name: &str, config: Config, exit: ExitHook) -> Result<Self> {
        let mut sinks: Vec<Box<dyn Sink>> = Vec::new();
        if config.console {
            let encoder = select_encoder(config.format, config.enable_color, &config.time_format);
            sinks.push(Box::new(ConsoleSink::stdout(config.level, encoder)));
        }

        let mut file_path = None;
        if config.write_to_file {
            // Files never get color codes.
            let encoder = select_encoder(config.file.format, false, &config.time_format);
            let sink = rotation::build_file_sink(&config.file, name, config.level, encoder)?;
            file_path = Some(sink.path().to_path_buf());
            sinks.push(Box::new(sink));
        }

        let mut logger = Self::from_sinks(name, config, sinks, exit);
        logger.file_path = file_path;
        Ok(logger)
    }

    /// Assembles a logger around an explicit sink chain.
    pub fn from_sinks(name: &str, config: Config, sinks: Vec<Box<dyn Sink>>, exit: ExitHook) -> Self {
        Self {
            name: name.to_owned(),
            config: Arc::new(config),
            sinks: compose(sinks),
            file_path: None,
            exit,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The active log file, if file output is enabled.
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    pub fn enabled(&self, level: Severity) -> bool {
        self.sinks.enabled(level)
    }

    /// Logs `message` with structured `fields`.
    ///
    /// A [`Severity::Fatal`] record terminates the process after it has been
    /// written and flushed, see [`Logger::fatal`]. Records logged this way
    /// carry no `func`; the [`log!`](crate::log) family of macros fills it in
    /// from the calling function.
    ///
    /// ```no_run
    /// # use awesome_log::{Registry, Severity};
    /// let registry = Registry::new();
    /// let log = registry.get("orders").unwrap();
    /// log.log(Severity::Info, "order created", [("order_id", 42)]);
    /// ```
    #[track_caller]
    pub fn log<I, K, V>(&self, level: Severity, message: impl fmt::Display, fields: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.log_record(level, message, fields, None);
    }

    /// Like [`Logger::log`], recording `function` as the emitting function.
    #[track_caller]
    pub fn log_in<I, K, V>(&self, function: &str, level: Severity, message: impl fmt::Display, fields: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.log_record(level, message, fields, Some(function));
    }

    #[track_caller]
    fn log_record<I, K, V>(&self, level: Severity, message: impl fmt::Display, fields: I, function: Option<&str>)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        if level < Severity::Fatal && !self.enabled(level) {
            return;
        }
        let mut record = Record::new(level, message.to_string())
            .with_caller(Caller::from(Location::caller()))
            .with_fields(fields);
        if let Some(function) = function {
            record = record.with_function(function);
        }
        self.emit(record);
    }

    #[track_caller]
    pub fn debug(&self, message: impl fmt::Display) {
        self.log(Severity::Debug, message, NO_FIELDS);
    }

    #[track_caller]
    pub fn info(&self, message: impl fmt::Display) {
        self.log(Severity::Info, message, NO_FIELDS);
    }

    #[track_caller]
    pub fn warn(&self, message: impl fmt::Display) {
        self.log(Severity::Warn, message, NO_FIELDS);
    }

    #[track_caller]
    pub fn error(&self, message: impl fmt::Display) {
        self.log(Severity::Error, message, NO_FIELDS);
    }

    /// Logs at fatal severity, flushes every sink, then runs the exit hook.
    ///
    /// With the default hook this does not return.
    #[track_caller]
    pub fn fatal(&self, message: impl fmt::Display) {
        self.log(Severity::Fatal, message, NO_FIELDS);
    }

    /// Sends a prepared record through the sink chain.
    ///
    /// The logger stamps its own name, drops the caller when caller recording
    /// is off, and attaches a stack trace when the level calls for one.
    pub fn emit(&self, mut record: Record) {
        record.logger.clone_from(&self.name);
        if !self.config.record_caller {
            record.caller = None;
            record.function = None;
        }
        if record.stacktrace.is_none() && record.level >= self.config.stacktrace_level {
            record.stacktrace = Some(Backtrace::force_capture().to_string());
        }

        if self.sinks.enabled(record.level) {
            if let Err(err) = self.sinks.write_record(&record) {
                eprintln!("awesome_log: failed to write record for logger {:?}: {err}", self.name);
            }
        }

        if record.level == Severity::Fatal {
            self.terminate();
        }
    }

    /// Blocks until buffered records reach the sinks' storage.
    pub fn sync(&self) -> Result<()> {
        self.sinks.flush().map_err(Error::Flush)
    }

    fn terminate(&self) {
        if let Err(err) = self.sync() {
            eprintln!("awesome_log: {err}");
        }
        (self.exit)();
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("sinks", &self.sinks)
            .field("file_path", &self.file_path)
            .finish_non_exhaustive()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        let _ = self.sinks.flush();
    }
}
