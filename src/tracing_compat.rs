//! Optional tracing integration.
//!
//! With the `tracing-integration` feature enabled the logging macros used
//! inside the crate forward to [`tracing`](https://docs.rs/tracing). Without
//! it they expand to nothing, so the clock engine carries no logging cost.
//!
//! Arguments of the no-op macros are not evaluated. Call sites must not rely
//! on side effects inside a log statement.

#[cfg(feature = "tracing-integration")]
#[allow(unused_imports)]
pub(crate) use tracing::{debug, error, info, trace, warn};

#[cfg(not(feature = "tracing-integration"))]
mod noop {
    // Distinct names: a `macro_rules! warn` would clash with the builtin
    // `#[warn]` attribute when re-exported.
    macro_rules! noop_trace {
        ($($arg:tt)*) => {};
    }
    macro_rules! noop_debug {
        ($($arg:tt)*) => {};
    }
    macro_rules! noop_info {
        ($($arg:tt)*) => {};
    }
    macro_rules! noop_warn {
        ($($arg:tt)*) => {};
    }
    macro_rules! noop_error {
        ($($arg:tt)*) => {};
    }

    #[allow(unused_imports)]
    pub(crate) use {
        noop_debug as debug, noop_error as error, noop_info as info, noop_trace as trace,
        noop_warn as warn,
    };
}

#[cfg(not(feature = "tracing-integration"))]
#[allow(unused_imports)]
pub(crate) use noop::{debug, error, info, trace, warn};

/// Returns true when log statements are compiled in.
#[must_use]
pub const fn is_enabled() -> bool {
    cfg!(feature = "tracing-integration")
}

#[cfg(test)]
mod tests {
    use super::{debug, error, info, is_enabled, trace, warn};

    #[test]
    fn macros_accept_structured_fields() {
        let factor = 2.0_f64;
        debug!(factor, "timeline.time_factor");
        trace!(trigger_time = 1.5, "timeline.fire");
        info!("timeline.info");
        warn!(reason = "test", "timeline.warn");
        error!("timeline.error");
        assert_eq!(is_enabled(), cfg!(feature = "tracing-integration"));
        let _ = factor;
    }
}
