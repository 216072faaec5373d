use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::encoder::Format;
use crate::level::Severity;

/// Default chrono pattern for record timestamps (millisecond precision).
pub const DEFAULT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Everything needed to build one logger instance.
///
/// A `Config` is assembled once, from a base value and an ordered list of
/// [`ConfigOption`]s, and is never mutated after the logger is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Records below this severity are dropped by every sink.
    pub level: Severity,
    /// Encoder used by the console sink.
    pub format: Format,
    /// Whether records are written to stdout.
    pub console: bool,
    /// Whether a rotating file sink is attached.
    pub write_to_file: bool,
    /// ANSI colors on the console sink (console format only).
    pub enable_color: bool,
    /// Whether records carry the `file:line` of the call site.
    pub record_caller: bool,
    /// Records at or above this severity carry a stack trace.
    pub stacktrace_level: Severity,
    /// chrono strftime pattern for the `time` field.
    pub time_format: String,
    pub file: FileConfig,
}

/// Rotating file output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Base path; named loggers insert `.{name}` before the extension.
    pub path: PathBuf,
    /// Size in megabytes that triggers a rotation.
    pub max_size_mb: u64,
    /// Backups older than this many days are removed. `0` keeps them forever.
    pub max_age_days: u32,
    /// Number of rotated files kept next to the active one.
    pub max_backups: u32,
    /// Gzip rotated files.
    pub compress: bool,
    /// Encoder used by the file sink.
    pub format: Format,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: Severity::Info,
            format: Format::Console,
            console: true,
            write_to_file: false,
            enable_color: true,
            record_caller: true,
            stacktrace_level: Severity::Fatal,
            time_format: DEFAULT_TIME_FORMAT.to_owned(),
            file: FileConfig::default(),
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("logs/app.log"),
            max_size_mb: 100,
            max_age_days: 7,
            max_backups: 10,
            compress: true,
            format: Format::Json,
        }
    }
}

impl Config {
    /// Builds a config from the built-in defaults and `options`, in order.
    pub fn from_options<I>(options: I) -> Self
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        Self::default().with(options)
    }

    /// Applies `options` on top of `self`. Later options win.
    pub fn with<I>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        for option in options {
            option.apply(&mut self);
        }
        self
    }
}

/// A single configuration mutator.
///
/// Options are applied in the order they are supplied, so when two options
/// touch the same field the later one wins. [`with_full_config`] replaces the
/// whole value, discarding whatever earlier options set.
pub struct ConfigOption(Box<dyn FnOnce(&mut Config) + Send>);

impl ConfigOption {
    /// Wraps an arbitrary mutator.
    pub fn custom<F>(mutate: F) -> Self
    where
        F: FnOnce(&mut Config) + Send + 'static,
    {
        ConfigOption(Box::new(mutate))
    }

    pub fn apply(self, config: &mut Config) {
        (self.0)(config)
    }
}

impl fmt::Debug for ConfigOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConfigOption")
    }
}

/// Sets the threshold from a level name; unknown names mean `info`.
pub fn with_level(level: &str) -> ConfigOption {
    let level = Severity::resolve(level);
    ConfigOption::custom(move |c| c.level = level)
}

/// Sets the console encoder; anything but `json` means console.
pub fn with_format(format: &str) -> ConfigOption {
    let format = Format::resolve(format);
    ConfigOption::custom(move |c| c.format = format)
}

pub fn with_time_format(pattern: impl Into<String>) -> ConfigOption {
    let pattern = pattern.into();
    ConfigOption::custom(move |c| c.time_format = pattern)
}

pub fn with_color(enable: bool) -> ConfigOption {
    ConfigOption::custom(move |c| c.enable_color = enable)
}

pub fn with_caller(enable: bool) -> ConfigOption {
    ConfigOption::custom(move |c| c.record_caller = enable)
}

pub fn with_stacktrace_level(level: &str) -> ConfigOption {
    let level = Severity::resolve(level);
    ConfigOption::custom(move |c| c.stacktrace_level = level)
}

pub fn with_console(enable: bool) -> ConfigOption {
    ConfigOption::custom(move |c| c.console = enable)
}

/// Enables file output and replaces the whole rotation setup.
///
/// The file format is reset to JSON; follow with [`with_file_format`] to
/// change it.
pub fn with_file_rotation(
    path: impl Into<PathBuf>,
    max_size_mb: u64,
    max_age_days: u32,
    max_backups: u32,
    compress: bool,
) -> ConfigOption {
    let file = FileConfig {
        path: path.into(),
        max_size_mb,
        max_age_days,
        max_backups,
        compress,
        format: Format::Json,
    };
    ConfigOption::custom(move |c| {
        c.write_to_file = true;
        c.file = file;
    })
}

pub fn with_file_format(format: &str) -> ConfigOption {
    let format = Format::resolve(format);
    ConfigOption::custom(move |c| c.file.format = format)
}

/// Replaces the entire configuration.
pub fn with_full_config(config: Config) -> ConfigOption {
    ConfigOption::custom(move |c| *c = config)
}
