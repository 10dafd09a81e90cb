//! Test helpers: one-time logging setup and logged assertions.
//!
//! Available to unit tests and, with the `test-internals` feature, to
//! integration tests.
//!
//! ```ignore
//! use timewarp::test_utils::init_test_logging;
//!
//! #[test]
//! fn frozen_sleep() {
//!     init_test_logging();
//!     timewarp::test_phase!("frozen_sleep");
//!     timewarp::assert_with_log!(1 + 1 == 2, "math", 2, 1 + 1);
//!     timewarp::test_complete!("frozen_sleep");
//! }
//! ```
//!
//! Set `RUST_LOG` to override the default `timewarp=debug` filter.

use std::sync::Once;
use tracing_subscriber::EnvFilter;

#[doc(hidden)]
pub use tracing;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "timewarp=debug";

static INIT: Once = Once::new();

/// Installs a test-friendly tracing subscriber once per process.
///
/// Output goes through the test writer so it is captured per test.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
        // Another harness may have installed a global subscriber already.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Logs the start of a test.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        $crate::test_utils::tracing::info!(test = %$name, "==== test phase ====");
    };
}

/// Logs a named section inside a test.
#[macro_export]
macro_rules! test_section {
    ($name:expr) => {
        $crate::test_utils::tracing::info!(section = %$name, "---- section ----");
    };
}

/// Logs the successful end of a test.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        $crate::test_utils::tracing::info!(test = %$name, "==== test complete ====");
    };
}

/// Asserts `cond`, logging the expected and actual values first.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $msg:expr, $expected:expr, $actual:expr $(,)?) => {{
        let passed: bool = $cond;
        let expected = &$expected;
        let actual = &$actual;
        $crate::test_utils::tracing::debug!(
            label = %$msg,
            expected = ?expected,
            actual = ?actual,
            passed,
            "assertion"
        );
        assert!(
            passed,
            "{}: expected {:?}, actual {:?}",
            $msg, expected, actual
        );
    }};
}
