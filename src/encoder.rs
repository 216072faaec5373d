use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::DEFAULT_TIME_FORMAT;
use crate::record::Record;

/// Record keys of the structured format. These are fixed.
pub const TIME_KEY: &str = "time";
pub const LEVEL_KEY: &str = "level";
pub const LOGGER_KEY: &str = "logger";
pub const CALLER_KEY: &str = "caller";
pub const FUNCTION_KEY: &str = "func";
pub const MESSAGE_KEY: &str = "msg";
pub const STACKTRACE_KEY: &str = "stacktrace";

pub const RESERVED_KEYS: [&str; 7] = [
    TIME_KEY,
    LEVEL_KEY,
    LOGGER_KEY,
    CALLER_KEY,
    FUNCTION_KEY,
    MESSAGE_KEY,
    STACKTRACE_KEY,
];

/// Output format of one sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Format {
    /// One JSON object per line.
    Json,
    /// Tab-separated, human-readable lines.
    #[default]
    Console,
}

impl Format {
    /// `"json"` selects [`Format::Json`]; every other value is console.
    pub fn resolve(name: &str) -> Format {
        match name {
            "json" => Format::Json,
            _ => Format::Console,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Json => "json",
            Format::Console => "console",
        }
    }
}

impl From<String> for Format {
    fn from(name: String) -> Self {
        Format::resolve(&name)
    }
}

impl From<Format> for String {
    fn from(format: Format) -> Self {
        format.as_str().to_owned()
    }
}

/// A validated strftime pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeFormat(String);

impl TimeFormat {
    /// Uses `pattern` if chrono can parse it, the default pattern otherwise.
    pub fn new(pattern: &str) -> Self {
        let valid = !pattern.is_empty()
            && StrftimeItems::new(pattern).all(|item| !matches!(item, Item::Error));
        if valid {
            TimeFormat(pattern.to_owned())
        } else {
            TimeFormat(DEFAULT_TIME_FORMAT.to_owned())
        }
    }

    pub fn pattern(&self) -> &str {
        &self.0
    }

    pub fn format(&self, time: &DateTime<Local>) -> String {
        let mut out = String::new();
        if write!(out, "{}", time.format(&self.0)).is_err() {
            out.clear();
            out.push_str(&time.to_rfc3339());
        }
        out
    }
}

impl Default for TimeFormat {
    fn default() -> Self {
        TimeFormat(DEFAULT_TIME_FORMAT.to_owned())
    }
}

/// Renders records as single JSON objects.
#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    time: TimeFormat,
}

impl JsonEncoder {
    pub fn new(time: TimeFormat) -> Self {
        Self { time }
    }

    /// Builds the JSON object of a record.
    ///
    /// Fixed keys come first. Caller fields follow at the top level; a
    /// field named like a fixed key is dropped.
    pub fn to_value(&self, record: &Record) -> Value {
        let mut object = Map::new();
        object.insert(TIME_KEY.into(), self.time.format(&record.time).into());
        object.insert(LEVEL_KEY.into(), record.level.capital().into());
        if !record.logger.is_empty() {
            object.insert(LOGGER_KEY.into(), record.logger.clone().into());
        }
        if let Some(caller) = &record.caller {
            object.insert(CALLER_KEY.into(), caller.to_string().into());
        }
        if let Some(function) = &record.function {
            object.insert(FUNCTION_KEY.into(), function.clone().into());
        }
        object.insert(MESSAGE_KEY.into(), record.message.clone().into());
        if let Some(stacktrace) = &record.stacktrace {
            object.insert(STACKTRACE_KEY.into(), stacktrace.clone().into());
        }
        for (key, value) in &record.fields {
            if !RESERVED_KEYS.contains(&key.as_str()) {
                object.insert(key.clone(), value.clone());
            }
        }
        Value::Object(object)
    }

    pub fn encode(&self, record: &Record) -> String {
        self.to_value(record).to_string()
    }
}

/// Renders records as tab-separated lines, optionally with ANSI colors.
#[derive(Debug, Clone)]
pub struct ConsoleEncoder {
    time: TimeFormat,
    color: bool,
}

impl ConsoleEncoder {
    pub fn new(time: TimeFormat, color: bool) -> Self {
        Self { time, color }
    }

    pub fn encode(&self, record: &Record) -> String {
        let time = self.time.format(&record.time);
        let level = format!("{:<5}", record.level.capital());

        let mut columns: Vec<String> = Vec::with_capacity(6);
        if self.color {
            columns.push(time.white().bold().to_string());
            columns.push(record.level.paint(&level).to_string());
        } else {
            columns.push(time);
            columns.push(level);
        }
        if !record.logger.is_empty() {
            columns.push(record.logger.clone());
        }
        if let Some(caller) = &record.caller {
            columns.push(caller.to_string());
        }
        columns.push(record.message.clone());
        if !record.fields.is_empty() {
            columns.push(Value::Object(record.fields.clone()).to_string());
        }

        let mut line = columns.join("\t");
        if let Some(stacktrace) = &record.stacktrace {
            line.push('\n');
            line.push_str(stacktrace.trim_end());
        }
        line
    }
}

/// Record formatter of one sink.
#[derive(Debug, Clone)]
pub enum Encoder {
    Json(JsonEncoder),
    Console(ConsoleEncoder),
}

impl Encoder {
    /// Formats a record, without a trailing newline.
    pub fn encode(&self, record: &Record) -> String {
        match self {
            Encoder::Json(encoder) => encoder.encode(record),
            Encoder::Console(encoder) => encoder.encode(record),
        }
    }

    pub fn format(&self) -> Format {
        match self {
            Encoder::Json(_) => Format::Json,
            Encoder::Console(_) => Format::Console,
        }
    }
}

/// Picks the encoder for a sink. Color only applies to the console format.
pub fn select_encoder(format: Format, color: bool, time_format: &str) -> Encoder {
    let time = TimeFormat::new(time_format);
    match format {
        Format::Json => Encoder::Json(JsonEncoder::new(time)),
        Format::Console => Encoder::Console(ConsoleEncoder::new(time, color)),
    }
}
