use std::fmt;
use std::io::{self, Write};

use parking_lot::Mutex;

use crate::encoder::Encoder;
use crate::level::Severity;
use crate::record::Record;

/// A destination for formatted records.
///
/// Every sink applies its own severity threshold and its own encoder. Sinks
/// are shared between threads, so implementations serialize physical writes
/// themselves.
pub trait Sink: Send + Sync {
    /// Whether a record of `level` would be written.
    fn enabled(&self, level: Severity) -> bool;

    /// Encodes and writes one record. Callers check [`Sink::enabled`] first.
    fn write_record(&self, record: &Record) -> io::Result<()>;

    /// Pushes buffered records to the underlying storage.
    fn flush(&self) -> io::Result<()>;
}

/// Writes records to a byte stream, stdout by default.
pub struct ConsoleSink {
    threshold: Severity,
    encoder: Encoder,
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn new(threshold: Severity, encoder: Encoder, out: impl Write + Send + 'static) -> Self {
        Self {
            threshold,
            encoder,
            out: Mutex::new(Box::new(out)),
        }
    }

    pub fn stdout(threshold: Severity, encoder: Encoder) -> Self {
        Self::new(threshold, encoder, io::stdout())
    }
}

impl fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("threshold", &self.threshold)
            .field("encoder", &self.encoder)
            .finish_non_exhaustive()
    }
}

impl Sink for ConsoleSink {
    fn enabled(&self, level: Severity) -> bool {
        level >= self.threshold
    }

    fn write_record(&self, record: &Record) -> io::Result<()> {
        let mut line = self.encoder.encode(record);
        line.push('\n');
        // One write call per record keeps lines from interleaving.
        self.out.lock().write_all(line.as_bytes())
    }

    fn flush(&self) -> io::Result<()> {
        self.out.lock().flush()
    }
}

/// Delivers each record to every constituent sink.
///
/// A failing sink does not stop delivery to the sinks after it; the first
/// error is returned once all of them have been tried.
#[derive(Default)]
pub struct FanOut {
    sinks: Vec<Box<dyn Sink>>,
}

/// Combines `sinks` into one, in order.
pub fn compose(sinks: Vec<Box<dyn Sink>>) -> FanOut {
    FanOut { sinks }
}

impl FanOut {
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl fmt::Debug for FanOut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanOut")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl Sink for FanOut {
    fn enabled(&self, level: Severity) -> bool {
        self.sinks.iter().any(|sink| sink.enabled(level))
    }

    fn write_record(&self, record: &Record) -> io::Result<()> {
        let mut first_error = None;
        for sink in self.sinks.iter().filter(|sink| sink.enabled(record.level)) {
            if let Err(err) = sink.write_record(record) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn flush(&self) -> io::Result<()> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(err) = sink.flush() {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
