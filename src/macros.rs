//! Logging macros that also record the calling function.
//!
//! Every macro takes an optional logger followed by `;`, the message, and
//! `key => value` fields. Without a logger they write through the global
//! default logger.
//!
//! ```no_run
//! use awesome_log::{info, warn, Registry};
//!
//! awesome_log::init([awesome_log::config::with_level("debug")]).unwrap();
//! info!("service starting");
//!
//! let registry = Registry::new();
//! let orders = registry.get("orders").unwrap();
//! warn!(orders; "slow query", "table" => "orders", "ms" => 812);
//! ```

use serde_json::Value;

/// Path of the enclosing function, e.g. `my_app::orders::create`.
#[macro_export]
macro_rules! function_name {
    () => {{
        fn here() {}
        fn type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = type_name_of(here);
        let name = name.strip_suffix("::here").unwrap_or(name);
        name.trim_end_matches("::{{closure}}")
    }};
}

/// Logs at an explicit [`Severity`](crate::Severity).
#[macro_export]
macro_rules! log {
    ($logger:expr; $level:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $logger.log_in(
            $crate::function_name!(),
            $level,
            $message,
            $crate::macros::fields(::std::vec![$((
                ::std::string::String::from($key),
                $crate::macros::value($value),
            )),*]),
        )
    };
    ($level:expr, $message:expr $(, $key:expr => $value:expr)* $(,)?) => {
        $crate::log!($crate::facade::logger(); $level, $message $(, $key => $value)*)
    };
}

#[macro_export]
macro_rules! debug {
    ($($args:tt)+) => {
        $crate::__log_at!($crate::Severity::Debug; $($args)+)
    };
}

#[macro_export]
macro_rules! info {
    ($($args:tt)+) => {
        $crate::__log_at!($crate::Severity::Info; $($args)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($($args:tt)+) => {
        $crate::__log_at!($crate::Severity::Warn; $($args)+)
    };
}

#[macro_export]
macro_rules! error {
    ($($args:tt)+) => {
        $crate::__log_at!($crate::Severity::Error; $($args)+)
    };
}

/// Logs at fatal severity, flushes, then runs the logger's exit hook.
#[macro_export]
macro_rules! fatal {
    ($($args:tt)+) => {
        $crate::__log_at!($crate::Severity::Fatal; $($args)+)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log_at {
    ($level:expr; $logger:expr; $($rest:tt)+) => {
        $crate::log!($logger; $level, $($rest)+)
    };
    ($level:expr; $($rest:tt)+) => {
        $crate::log!($level, $($rest)+)
    };
}

#[doc(hidden)]
pub fn value(value: impl Into<Value>) -> Value {
    value.into()
}

/// Pins the element type so a macro call without fields still infers.
#[doc(hidden)]
pub fn fields(fields: Vec<(String, Value)>) -> Vec<(String, Value)> {
    fields
}
