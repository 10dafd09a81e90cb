//! Timewarp: a controllable virtual clock for deterministic tests and
//! simulations.
//!
//! # Overview
//!
//! Code that depends on time is hard to test: waiting for real timeouts makes
//! suites slow, and reading the wall clock makes them flaky. A [`Timeline`]
//! replaces the wall clock with a virtual one that can be frozen, fast
//! forwarded, slowed down, or sped up, while still behaving like a real
//! clock to the code under test.
//!
//! - **Frozen time**: with a time factor of 0, time only moves when told to,
//!   and a one-hour sleep returns instantly.
//! - **Scaled time**: with a factor of 10, virtual time runs ten times faster
//!   than real time and sleeps really wait a tenth as long.
//! - **Scheduled callbacks**: callbacks fire in trigger-time order whenever a
//!   sleep moves the clock past them, each seeing its exact trigger time.
//! - **Step sequences**: [`Sequence`] runs step logic paced by the clock.
//! - **Swappable ambient clock**: [`current`] holds the active clock of the
//!   current thread, so code can read time without holding a timeline.
//!
//! # Module Structure
//!
//! - [`time`]: the timeline, its event queue, real-time strategies, and the
//!   [`Clock`] interface
//! - [`sequence`]: timed step sequences
//! - [`current`]: thread-confined active-clock registry
//! - [`config`]: start-up configuration from code, environment or TOML
//! - [`error`](mod@error): error types
//! - [`tracing_compat`]: optional tracing integration (requires the
//!   `tracing-integration` feature)
//!
//! # Example
//!
//! ```
//! use timewarp::Timeline;
//!
//! let mut timeline = Timeline::frozen_at(1_700_000_000.0)?;
//! timeline.sleep(86_400.0)?;
//! assert_eq!(timeline.time(), 1_700_086_400.0);
//! # Ok::<(), timewarp::Error>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod current;
pub mod error;
pub mod sequence;
pub mod time;
pub mod tracing_compat;

// ── Test-only modules ───────────────────────────────────────────────────
#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

pub use config::{ConfigError, TimelineConfig};
pub use error::{Error, ErrorKind, Result};
pub use sequence::{Sequence, SequenceState, Step, StepIter, StepLogic};
pub use time::{
    AsyncSleep, Callback, Clock, ClockProxy, CooperativeClock, CooperativeScheduler, ManualClock,
    RealClock, SystemClock, Timeline, TimelineBuilder,
};
