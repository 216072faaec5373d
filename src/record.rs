use std::borrow::Cow;
use std::fmt;
use std::panic::Location;
use std::path::Path;

use chrono::{DateTime, Local};
use serde_json::{Map, Value};

use crate::level::Severity;

/// Caller-supplied key/value pairs, kept in insertion order.
pub type Fields = Map<String, Value>;

/// One log event on its way to the sinks.
#[derive(Debug, Clone)]
pub struct Record {
    pub time: DateTime<Local>,
    pub level: Severity,
    /// Name of the emitting logger; empty for the anonymous instance.
    pub logger: String,
    pub caller: Option<Caller>,
    pub function: Option<String>,
    pub message: String,
    pub stacktrace: Option<String>,
    pub fields: Fields,
}

impl Record {
    pub fn new(level: Severity, message: impl Into<String>) -> Self {
        Self {
            time: Local::now(),
            level,
            logger: String::new(),
            caller: None,
            function: None,
            message: message.into(),
            stacktrace: None,
            fields: Fields::new(),
        }
    }

    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_fields<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields
            .extend(fields.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

/// Source location of a log call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub file: String,
    pub line: u32,
}

impl Caller {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// The file path as rendered in records.
    ///
    /// Absolute paths are shown relative to the directory two levels above
    /// the file (`/work/app/src/main.rs` becomes `src/main.rs`). Relative
    /// paths, which is what rustc records for the crate being built, are kept.
    pub fn display_path(&self) -> Cow<'_, str> {
        let path = Path::new(&self.file);
        if !path.is_absolute() {
            return Cow::Borrowed(&self.file);
        }
        path.parent()
            .and_then(Path::parent)
            .and_then(|root| path.strip_prefix(root).ok())
            .map(|rel| Cow::Owned(rel.to_string_lossy().into_owned()))
            .unwrap_or(Cow::Borrowed(&self.file))
    }
}

impl From<&Location<'_>> for Caller {
    fn from(location: &Location<'_>) -> Self {
        Caller::new(location.file(), location.line())
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.display_path(), self.line)
    }
}
