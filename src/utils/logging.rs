//! Conditional logging macros that check a module-level `ENABLE_LOGS` flag.
//!
//! Each module that wants per-module log gating defines the flag and pulls
//! the macros in from the crate root:
//! ```rust
//! const ENABLE_LOGS: bool = true;
//!
//! use gesturecam::{log_info, log_warn};
//!
//! log_info!("camera session opened");
//! ```
//! With the flag set to `false` the module goes quiet without touching the
//! global logger configuration.

/// Conditional `log::info!`. Checks the `ENABLE_LOGS` const in the calling
/// module.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}

/// Conditional `log::warn!`. Checks the `ENABLE_LOGS` const in the calling
/// module.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!($($arg)*);
        }
    };
}

/// Conditional `log::error!`. Checks the `ENABLE_LOGS` const in the calling
/// module.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!($($arg)*);
        }
    };
}
