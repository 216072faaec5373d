use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use colored::{ColoredString, Colorize};
use serde::{Deserialize, Serialize};

/// Ordered log severity.
///
/// `Debug < Info < Warn < Error < Fatal`. The derived ordering is what sinks
/// use for threshold checks, so the variant order must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
}

impl Severity {
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warn,
        Severity::Error,
        Severity::Fatal,
    ];

    /// Resolves a symbolic level name.
    ///
    /// Recognizes `debug`, `info`, `warn`, `error` and `fatal`. Every other
    /// input resolves to [`Severity::Info`]; this never fails.
    ///
    /// # Examples
    ///
    /// ```
    /// # use awesome_log::Severity;
    /// assert_eq!(Severity::resolve("warn"), Severity::Warn);
    /// assert_eq!(Severity::resolve("verbose"), Severity::Info);
    /// ```
    pub fn resolve(name: &str) -> Severity {
        match name {
            "debug" => Severity::Debug,
            "info" => Severity::Info,
            "warn" => Severity::Warn,
            "error" => Severity::Error,
            "fatal" => Severity::Fatal,
            _ => Severity::Info,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warn => "warn",
            Severity::Error => "error",
            Severity::Fatal => "fatal",
        }
    }

    /// Upper-case label used by both encoders.
    pub fn capital(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }

    /// Paints `text` with the color assigned to this severity.
    pub(crate) fn paint(self, text: &str) -> ColoredString {
        match self {
            Severity::Debug => text.blue(),
            Severity::Info => text.green(),
            Severity::Warn => text.yellow(),
            Severity::Error => text.red(),
            Severity::Fatal => text.red().bold(),
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Severity::resolve(s))
    }
}

impl From<String> for Severity {
    fn from(name: String) -> Self {
        Severity::resolve(&name)
    }
}

impl From<Severity> for String {
    fn from(level: Severity) -> Self {
        level.as_str().to_owned()
    }
}

impl From<&tracing::Level> for Severity {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE | tracing::Level::DEBUG => Severity::Debug,
            tracing::Level::INFO => Severity::Info,
            tracing::Level::WARN => Severity::Warn,
            tracing::Level::ERROR => Severity::Error,
        }
    }
}

impl From<Severity> for log::Level {
    fn from(level: Severity) -> Self {
        match level {
            Severity::Debug => log::Level::Debug,
            Severity::Info => log::Level::Info,
            Severity::Warn => log::Level::Warn,
            Severity::Error | Severity::Fatal => log::Level::Error,
        }
    }
}
