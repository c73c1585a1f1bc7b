//! Logging abstraction layer
//!
//! Routing events (redirect hops, loop detection, cache hits, codec fallbacks)
//! are reported through these macros so the crate works with either the `log`
//! or the `tracing` ecosystem.
//!
//! # Features
//!
//! - `log` (default) - Uses the standard `log` crate
//! - `tracing` - Uses the `tracing` crate for structured logging
//!
//! When both are enabled `tracing` wins, so events are never reported twice.
//! Every event uses the `gpui_shell_router` target, which lets hosts filter
//! routing noise with `RUST_LOG=gpui_shell_router=debug`.
//!
//! # Usage
//!
//! ```ignore
//! use gpui_shell_router::{debug_log, trace_log, warn_log};
//!
//! trace_log!("Matching '{}' against {} routes", path, routes.len());
//! debug_log!("Redirecting {} => {}", from, to);
//! warn_log!("Redirect loop detected: {}", chain);
//! ```

#[doc(hidden)]
#[macro_export]
macro_rules! __router_log {
    ($level:ident, $($arg:tt)*) => {{
        #[cfg(feature = "tracing")]
        ::tracing::$level!(target: "gpui_shell_router", $($arg)*);
        #[cfg(all(feature = "log", not(feature = "tracing")))]
        ::log::$level!(target: "gpui_shell_router", $($arg)*);
    }};
}

/// Per-segment matching and cache lookups
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        $crate::__router_log!(trace, $($arg)*)
    };
}

/// Redirect hops and scheduling
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        $crate::__router_log!(debug, $($arg)*)
    };
}

/// Configuration rebuilds
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        $crate::__router_log!(info, $($arg)*)
    };
}

/// Recoverable navigation failures
#[macro_export]
macro_rules! warn_log {
    ($($arg:tt)*) => {
        $crate::__router_log!(warn, $($arg)*)
    };
}

#[macro_export]
macro_rules! error_log {
    ($($arg:tt)*) => {
        $crate::__router_log!(error, $($arg)*)
    };
}
