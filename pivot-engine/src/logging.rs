//! FILENAME: pivot-engine/src/logging.rs
// PURPOSE: Category-tagged logging macros on top of the `log` facade.
// The category becomes the log target, so `RUST_LOG=PIVOT=debug` style
// filters work with any `log` backend the caller installs.

#[macro_export]
macro_rules! log_debug {
    ($cat:expr, $($arg:tt)*) => {
        ::log::debug!(target: $cat, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($cat:expr, $($arg:tt)*) => {
        ::log::info!(target: $cat, $($arg)*)
    };
}

// Re-export the macros so they can be imported via `use crate::logging::log_debug;`
pub use log_debug;
pub use log_info;
