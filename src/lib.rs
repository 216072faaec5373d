//! # awesome_log
//!
//! A structured-logging facade with named loggers and rotating file output.
//!
//! * **Named loggers**: a [`Registry`] hands out one [`Logger`] per name and
//!   builds it exactly once, even when many threads ask for a new name at the
//!   same time
//! * **Layered output**: every logger fans records out to a console sink and
//!   an optional size-rotated file sink, each with its own encoder
//! * **Structured records**: JSON output with fixed keys
//!   (`time, level, logger, caller, func, msg, stacktrace`) plus any
//!   caller-supplied fields
//! * **Lenient configuration**: unknown level or format names fall back to
//!   `info` and console instead of failing
//!
//! ## Main Components
//!
//! * `level`: the ordered [`Severity`] and its total name parser
//! * `config`: [`Config`] and the ordered [`ConfigOption`] mutators
//! * `encoder`: JSON and console record formatters
//! * `sink`: the [`Sink`] trait, console sink and fan-out composition
//! * `rotation`: per-logger file paths and the log4rs-backed rotating sink
//! * `registry`: the per-name construction state machine
//! * `facade`: the process-wide default logger and free functions
//! * `bridge`: a `tracing` layer feeding events into a logger
//! * `macros`: `debug!` … `fatal!` and `log!`, which also record the calling
//!   function
//!
//! ## Quick Start
//!
//! ```no_run
//! use awesome_log::config::{with_file_rotation, with_level};
//!
//! awesome_log::init([
//!     with_level("debug"),
//!     with_file_rotation("logs/app.log", 100, 7, 10, true),
//! ])
//! .unwrap();
//!
//! awesome_log::info!("service starting");
//!
//! // Writes to logs/app.user-service.log with the configuration above.
//! let users = awesome_log::get_logger("user-service").unwrap();
//! awesome_log::info!(users; "user registered", "user_id" => "u_1");
//!
//! awesome_log::sync().unwrap();
//! ```

pub mod bridge;
pub mod config;
pub mod encoder;
pub mod error;
pub mod facade;
pub mod level;
pub mod logger;
pub mod macros;
pub mod record;
pub mod registry;
pub mod rotation;
pub mod sink;

pub use bridge::LoggerLayer;
pub use config::{Config, ConfigOption, FileConfig};
pub use encoder::{select_encoder, Encoder, Format};
pub use error::{Error, Result};
pub use facade::{
    debug, error, fatal, get_logger, info, init, install_tracing, logger, new_logger, sync,
    try_logger, warn, LogFacade,
};
pub use level::Severity;
pub use logger::{exit_process, ExitHook, Logger};
pub use record::{Caller, Fields, Record};
pub use registry::Registry;
pub use rotation::{build_file_sink, derive_path, FileSink};
pub use sink::{compose, ConsoleSink, FanOut, Sink};
