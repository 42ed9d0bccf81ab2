//! Logging macros gated by a per-module `ENABLE_LOGS` switch.
//!
//! The engine, auto-snap and feature modules each declare the switch and log
//! through these macros, so a noisy module can be silenced without touching
//! `RUST_LOG`. When the switch is off the arguments are never evaluated.
//!
//! ```
//! use context_flow_lib::{log_error, log_info, log_warn};
//!
//! const ENABLE_LOGS: bool = false;
//!
//! log_info!("restoring {} windows", 3);
//! log_warn!("window source unavailable");
//! log_error!("failed to place {}", "Safari");
//! ```

#[doc(hidden)]
pub use log as __log;

/// `log::info!` when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            $crate::utils::logging::__log::info!($($arg)*);
        }
    };
}

/// `log::warn!` when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            $crate::utils::logging::__log::warn!($($arg)*);
        }
    };
}

/// `log::error!` when the calling module's `ENABLE_LOGS` is true.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            $crate::utils::logging::__log::error!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ENABLE_LOGS: bool = false;

    #[test]
    fn disabled_modules_skip_formatting() {
        let evaluated = AtomicUsize::new(0);
        let count = || evaluated.fetch_add(1, Ordering::SeqCst);

        log_info!("info {}", count());
        log_warn!("warn {}", count());
        log_error!("error {}", count());

        assert_eq!(evaluated.load(Ordering::SeqCst), 0);
    }
}
