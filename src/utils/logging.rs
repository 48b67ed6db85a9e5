//! Logging macros gated on a module-level `ENABLE_LOGS` flag.
//!
//! The ticker and the stores are chatty at 10 ms resolution, so they declare
//! `const ENABLE_LOGS: bool` and log through these instead of `log::*` directly:
//!
//! ```ignore
//! const ENABLE_LOGS: bool = false;
//! use crate::log_debug;
//!
//! log_debug!("tick for {}", segment_id);
//! ```

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!($($arg)*);
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!($($arg)*);
        }
    };
}
