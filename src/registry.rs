use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Condvar, Mutex, RwLock};

use crate::config::{Config, ConfigOption};
use crate::error::{Error, Result};
use crate::logger::{exit_process, ExitHook, Logger};

/// Name → logger cache with exactly one construction per name.
///
/// Each name moves through `absent → constructing → ready`. The state
/// changes happen under the write lock; the construction itself runs outside
/// it while the slot is marked as constructing, and any other caller asking
/// for the same name waits for that construction instead of starting its own.
///
/// Per-name configuration is fixed by the first successful construction:
/// options passed to later calls for the same name are ignored.
///
/// # Thread Safety
///
/// A `Registry` is `Send + Sync` and is meant to be shared by reference (or
/// behind an `Arc`) between every component that needs loggers. Entries are
/// never evicted.
///
/// # Examples
///
/// ```no_run
/// use awesome_log::{config, Registry};
///
/// let registry = Registry::new();
/// let orders = registry
///     .get_or_create("orders", [config::with_level("debug")])
///     .unwrap();
/// let again = registry.get("orders").unwrap();
/// assert!(std::sync::Arc::ptr_eq(&orders, &again));
/// ```
pub struct Registry {
    slots: RwLock<HashMap<String, Slot>>,
    defaults: RwLock<Option<Arc<Config>>>,
    exit: ExitHook,
}

enum Slot {
    Constructing(Arc<InFlight>),
    Ready(Arc<Logger>),
}

enum Claim<'a> {
    Ready(Arc<Logger>),
    Wait(Arc<InFlight>),
    Owned(Pending<'a>),
}

impl Registry {
    pub fn new() -> Self {
        Self::with_exit_hook(exit_process())
    }

    /// A registry whose loggers run `exit` after a fatal record.
    pub fn with_exit_hook(exit: ExitHook) -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
            defaults: RwLock::new(None),
            exit,
        }
    }

    /// Returns the logger called `name`, constructing it on first use.
    ///
    /// A new logger starts from the registry's default configuration when one
    /// is set (a copy of it) and from the built-in defaults otherwise; then
    /// `options` are applied in order. If the name already exists, `options`
    /// are dropped unused.
    ///
    /// On failure nothing is registered and a later call may retry.
    pub fn get_or_create<I>(&self, name: &str, options: I) -> Result<Arc<Logger>>
    where
        I: IntoIterator<Item = ConfigOption>,
    {
        if let Some(logger) = self.lookup(name) {
            return Ok(logger);
        }

        let mut options = Some(options);
        loop {
            match self.claim(name, false) {
                Claim::Ready(logger) => return Ok(logger),
                Claim::Wait(flight) => flight.wait(),
                Claim::Owned(pending) => {
                    let config = self.base_config().with(options.take().into_iter().flatten());
                    let logger = pending.commit(Logger::build(name, config, self.exit.clone())?);
                    tracing::debug!(
                        logger = name,
                        file = ?logger.file_path(),
                        "constructed logger"
                    );
                    return Ok(logger);
                }
            }
        }
    }

    /// Equivalent to `get_or_create(name, [])`.
    pub fn get(&self, name: &str) -> Result<Arc<Logger>> {
        self.get_or_create(name, std::iter::empty::<ConfigOption>())
    }

    /// Returns the logger called `name` if it is ready. Never constructs.
    pub fn lookup(&self, name: &str) -> Option<Arc<Logger>> {
        match self.slots.read().get(name) {
            Some(Slot::Ready(logger)) => Some(Arc::clone(logger)),
            _ => None,
        }
    }

    /// Replaces the logger called `name` with one built from `config`.
    ///
    /// Goes through the same constructing state as [`Registry::get_or_create`].
    /// If the build fails the previous instance, if any, stays registered.
    /// The replaced instance is released here; it closes its files once the
    /// last outside handle to it is dropped.
    pub fn rebuild(&self, name: &str, config: Config) -> Result<Arc<Logger>> {
        loop {
            match self.claim(name, true) {
                Claim::Ready(logger) => return Ok(logger),
                Claim::Wait(flight) => flight.wait(),
                Claim::Owned(pending) => {
                    let logger = pending.commit(Logger::build(name, config, self.exit.clone())?);
                    tracing::debug!(
                        logger = name,
                        file = ?logger.file_path(),
                        "rebuilt logger"
                    );
                    return Ok(logger);
                }
            }
        }
    }

    /// Sets the configuration new names inherit.
    pub fn set_default_config(&self, config: Config) {
        *self.defaults.write() = Some(Arc::new(config));
    }

    pub fn default_config(&self) -> Option<Arc<Config>> {
        self.defaults.read().clone()
    }

    /// Names of all ready loggers, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .slots
            .read()
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Ready(_)))
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Number of ready loggers.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flushes every ready logger, returning the first failure.
    pub fn sync_all(&self) -> Result<()> {
        let loggers: Vec<Arc<Logger>> = self
            .slots
            .read()
            .values()
            .filter_map(|slot| match slot {
                Slot::Ready(logger) => Some(Arc::clone(logger)),
                Slot::Constructing(_) => None,
            })
            .collect();

        let mut first_error: Option<Error> = None;
        for logger in loggers {
            if let Err(err) = logger.sync() {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn base_config(&self) -> Config {
        self.defaults
            .read()
            .as_deref()
            .cloned()
            .unwrap_or_default()
    }

    /// Re-checks `name` under the write lock and claims it when allowed.
    ///
    /// With `replace` a ready entry is claimed too, remembering the old
    /// instance so a failed build can put it back.
    fn claim(&self, name: &str, replace: bool) -> Claim<'_> {
        let mut slots = self.slots.write();
        let previous = match slots.get(name) {
            Some(Slot::Constructing(flight)) => return Claim::Wait(Arc::clone(flight)),
            Some(Slot::Ready(logger)) if !replace => return Claim::Ready(Arc::clone(logger)),
            Some(Slot::Ready(logger)) => Some(Arc::clone(logger)),
            None => None,
        };

        let flight = Arc::new(InFlight::default());
        slots.insert(name.to_owned(), Slot::Constructing(Arc::clone(&flight)));
        Claim::Owned(Pending {
            registry: self,
            name: name.to_owned(),
            flight,
            previous,
            committed: false,
        })
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Completion signal of one construction.
#[derive(Default)]
struct InFlight {
    done: Mutex<bool>,
    signal: Condvar,
}

impl InFlight {
    fn wait(&self) {
        let mut done = self.done.lock();
        while !*done {
            self.signal.wait(&mut done);
        }
    }

    fn finish(&self) {
        *self.done.lock() = true;
        self.signal.notify_all();
    }
}

/// A claimed name. Dropping it without [`Pending::commit`] (an error or a
/// panic during the build) puts the slot back the way it was.
struct Pending<'a> {
    registry: &'a Registry,
    name: String,
    flight: Arc<InFlight>,
    previous: Option<Arc<Logger>>,
    committed: bool,
}

impl Pending<'_> {
    fn commit(mut self, logger: Logger) -> Arc<Logger> {
        let logger = Arc::new(logger);
        self.registry
            .slots
            .write()
            .insert(self.name.clone(), Slot::Ready(Arc::clone(&logger)));
        self.committed = true;
        logger
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if !self.committed {
            let mut slots = self.registry.slots.write();
            match self.previous.take() {
                Some(previous) => {
                    slots.insert(self.name.clone(), Slot::Ready(previous));
                }
                None => {
                    slots.remove(&self.name);
                }
            }
        }
        self.flight.finish();
    }
}
