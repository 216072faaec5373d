//! Bridge from `tracing` events to a logger's sinks.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::facade;
use crate::level::Severity;
use crate::logger::Logger;
use crate::record::{Caller, Fields, Record};

enum Target {
    Fixed(Arc<Logger>),
    /// Whatever the process-wide facade currently holds.
    Global,
}

/// A `tracing_subscriber` layer that writes every event through a logger.
///
/// The event's `message` becomes the record message, its other fields become
/// record fields, and its module path is recorded as the function.
pub struct LoggerLayer {
    target: Target,
}

impl LoggerLayer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self {
            target: Target::Fixed(logger),
        }
    }

    /// Follows the global default logger, including re-initializations.
    /// Events before the first `init` are dropped.
    pub fn global() -> Self {
        Self {
            target: Target::Global,
        }
    }

    fn logger(&self) -> Option<Arc<Logger>> {
        match &self.target {
            Target::Fixed(logger) => Some(Arc::clone(logger)),
            Target::Global => facade::try_logger(),
        }
    }
}

impl<S: Subscriber> Layer<S> for LoggerLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let Some(logger) = self.logger() else {
            return;
        };
        let metadata = event.metadata();
        let level = Severity::from(metadata.level());
        if !logger.enabled(level) {
            return;
        }

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let mut record = Record::new(level, visitor.message);
        record.fields = visitor.fields;
        if let (Some(file), Some(line)) = (metadata.file(), metadata.line()) {
            record = record.with_caller(Caller::new(file, line));
        }
        if let Some(module) = metadata.module_path() {
            record = record.with_function(module);
        }
        logger.emit(record);
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: Fields,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        self.fields.insert(field.name().to_owned(), value);
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, value.into());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.into());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_owned();
        } else {
            self.insert(field, value.into());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.insert(field, format!("{value:?}").into());
        }
    }
}
