//! Process-wide default logger.
//!
//! [`LogFacade`] owns a [`Registry`] and the pointer to its anonymous logger.
//! The crate keeps one facade for the whole process and exposes it through
//! the free functions of this module; components that prefer explicit wiring
//! can create their own facade or registry instead.
//!
//! The free `debug` … `fatal` functions record the caller's location but not
//! its function; the macros of the same names record both.

use std::fmt;
use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::{Mutex, RwLock};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::bridge::LoggerLayer;
use crate::config::{Config, ConfigOption};
use crate::error::Result;
use crate::logger::Logger;
use crate::registry::Registry;

const UNINITIALIZED: &str =
    "awesome_log: the default logger is not initialized; call awesome_log::init first";

/// A registry plus its default (anonymous) logger.
pub struct LogFacade {
    registry: Registry,
    default: RwLock<Option<Arc<Logger>>>,
    init_lock: Mutex<()>,
}

impl LogFacade {
    pub fn new() -> Self {
        Self::with_registry(Registry::new())
    }

    pub fn with_registry(registry: Registry) -> Self {
        Self {
            registry,
            default: RwLock::new(None),
            init_lock: Mutex::new(()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Builds the default logger from the built-in defaults and `options`.
    ///
    /// The resulting configuration also becomes the one new named loggers
    /// inherit. Calling `init` again tears the previous default down and
    /// builds a new one: the old instance is flushed and released, and its
    /// files close as soon as no caller holds it any more. If building fails,
    /// the previous default stays in place.
    pub fn init<I>(&self, options: I) -> Result<()>
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        let _serialized = self.init_lock.lock();
        let config = Config::from_options(options);
        let logger = self.registry.rebuild("", config.clone())?;
        self.registry.set_default_config(config);

        let previous = self.default.write().replace(Arc::clone(&logger));
        if let Some(previous) = previous {
            if let Err(err) = previous.sync() {
                eprintln!("awesome_log: {err}");
            }
        }
        tracing::info!(level = %logger.config().level, file = ?logger.file_path(), "default logger initialized");
        Ok(())
    }

    /// The default logger.
    ///
    /// # Panics
    ///
    /// Panics if [`LogFacade::init`] has not succeeded yet. Logging through
    /// an uninitialized facade is a usage error, not a recoverable condition.
    #[track_caller]
    pub fn logger(&self) -> Arc<Logger> {
        match self.try_logger() {
            Some(logger) => logger,
            None => panic!("{UNINITIALIZED}"),
        }
    }

    pub fn try_logger(&self) -> Option<Arc<Logger>> {
        self.default.read().clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.default.read().is_some()
    }

    /// A named logger inheriting the configuration given to `init`.
    pub fn get(&self, name: &str) -> Result<Arc<Logger>> {
        self.registry.get(name)
    }

    /// A named logger; `options` apply only if `name` is new.
    pub fn get_or_create<I>(&self, name: &str, options: I) -> Result<Arc<Logger>>
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        self.registry.get_or_create(name, options)
    }

    /// Flushes every logger of the registry.
    pub fn sync(&self) -> Result<()> {
        self.registry.sync_all()
    }
}

impl Default for LogFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LogFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogFacade")
            .field("initialized", &self.is_initialized())
            .field("loggers", &self.registry.names())
            .finish()
    }
}

lazy_static! {
    static ref GLOBAL: LogFacade = LogFacade::new();
}

/// The process-wide facade behind the free functions.
pub fn global() -> &'static LogFacade {
    &GLOBAL
}

/// Initializes (or re-initializes) the process-wide default logger.
pub fn init<I>(options: I) -> Result<()>
where
    I: IntoIterator<Item = ConfigOption>,
{
    GLOBAL.init(options)
}

/// The process-wide default logger. Panics before [`init`].
#[track_caller]
pub fn logger() -> Arc<Logger> {
    GLOBAL.logger()
}

pub fn try_logger() -> Option<Arc<Logger>> {
    GLOBAL.try_logger()
}

/// A named logger from the process-wide registry.
pub fn get_logger(name: &str) -> Result<Arc<Logger>> {
    GLOBAL.get(name)
}

/// A named logger from the process-wide registry, built with `options` if new.
pub fn new_logger<I>(name: &str, options: I) -> Result<Arc<Logger>>
where
    I: IntoIterator<Item = ConfigOption>,
{
    GLOBAL.get_or_create(name, options)
}

#[track_caller]
pub fn debug(message: impl fmt::Display) {
    GLOBAL.logger().debug(message);
}

#[track_caller]
pub fn info(message: impl fmt::Display) {
    GLOBAL.logger().info(message);
}

#[track_caller]
pub fn warn(message: impl fmt::Display) {
    GLOBAL.logger().warn(message);
}

#[track_caller]
pub fn error(message: impl fmt::Display) {
    GLOBAL.logger().error(message);
}

/// Logs through the default logger, flushes, and terminates the process.
#[track_caller]
pub fn fatal(message: impl fmt::Display) {
    GLOBAL.logger().fatal(message);
}

/// Flushes every logger of the process-wide registry.
pub fn sync() -> Result<()> {
    GLOBAL.sync()
}

/// Routes `tracing` events to the process-wide default logger.
///
/// `RUST_LOG` narrows which events are forwarded; without it every event
/// reaches the logger, which then applies its own threshold.
pub fn install_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("trace"));
    tracing_subscriber::registry()
        .with(filter)
        .with(LoggerLayer::global())
        .try_init()?;
    Ok(())
}
