//! Logging abstraction layer
//!
//! The engine logs through these macros so the backend is picked at compile time:
//!
//! - `log` (default) - forwards to the `log` crate
//! - `tracing` - forwards to the `tracing` crate
//!
//! With neither feature enabled the arguments are still type-checked but nothing is emitted.
//!
//! # Usage
//!
//! ```ignore
//! use url_state_sync::{debug_log, trace_log};
//!
//! trace_log!("resolve cache miss for '{}'", pathname);
//! debug_log!("history {:?} -> {}", mode, url);
//! ```

/// Trace-level logging, used for cache traffic and skipped sync steps.
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!($($arg)*);
        #[cfg(feature = "log")]
        ::log::trace!($($arg)*);
        #[cfg(not(any(feature = "log", feature = "tracing")))]
        {
            let _ = format_args!($($arg)*);
        }
    };
}

/// Debug-level logging, used for navigation events and history writes.
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::debug!($($arg)*);
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
        #[cfg(not(any(feature = "log", feature = "tracing")))]
        {
            let _ = format_args!($($arg)*);
        }
    };
}

/// Info-level logging.
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::info!($($arg)*);
        #[cfg(feature = "log")]
        ::log::info!($($arg)*);
        #[cfg(not(any(feature = "log", feature = "tracing")))]
        {
            let _ = format_args!($($arg)*);
        }
    };
}

/// Warn-level logging, used when a caller hands back a handle the engine does not know.
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::warn!($($arg)*);
        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);
        #[cfg(not(any(feature = "log", feature = "tracing")))]
        {
            let _ = format_args!($($arg)*);
        }
    };
}

/// Error-level logging, used when a dispatch fails while applying a location.
#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::error!($($arg)*);
        #[cfg(feature = "log")]
        ::log::error!($($arg)*);
        #[cfg(not(any(feature = "log", feature = "tracing")))]
        {
            let _ = format_args!($($arg)*);
        }
    };
}
