//! Real-time sources and waiting strategies.
//!
//! A [`Timeline`](crate::Timeline) never reads the wall clock or blocks the
//! thread directly. It goes through a [`RealClock`], injected at construction:
//!
//! - [`SystemClock`]: the actual wall clock and `std::thread::sleep`.
//! - [`ManualClock`]: a deterministic stand-in whose "real" time only moves
//!   when it sleeps or is advanced by the test.
//! - [`CooperativeClock`]: wraps another clock and yields to a
//!   [`CooperativeScheduler`] after every wait, so cooperatively scheduled
//!   work gets a turn even when the wait itself is instantaneous.

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of real (wall-clock) time plus the primitive for really waiting.
///
/// This trait allows the timeline to run against the system clock in
/// production and against a fully controlled clock in tests.
pub trait RealClock: Send + Sync + fmt::Debug {
    /// Returns the current real time in seconds since the Unix epoch.
    fn now(&self) -> f64;

    /// Blocks for `seconds` of real time. Non-positive values return at once.
    fn sleep(&self, seconds: f64);
}

/// Wall clock backed by [`SystemTime`] and [`std::thread::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates the system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl RealClock for SystemClock {
    fn now(&self) -> f64 {
        // A system clock set before 1970 reads as negative seconds.
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs_f64(),
            Err(before) => -before.duration().as_secs_f64(),
        }
    }

    fn sleep(&self, seconds: f64) {
        if let Some(duration) = seconds_to_duration(seconds) {
            std::thread::sleep(duration);
        }
    }
}

/// Converts a wait in seconds into a [`Duration`], skipping empty waits.
fn seconds_to_duration(seconds: f64) -> Option<Duration> {
    if seconds.is_nan() || seconds <= 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(seconds).ok()
}

/// Real clock under test control.
///
/// `sleep` returns immediately after moving the clock forward by the
/// requested amount, which makes live-mode timelines fully deterministic.
/// Clones share the same reading.
///
/// # Example
///
/// ```
/// use timewarp::time::{ManualClock, RealClock};
///
/// let clock = ManualClock::new(1337.0);
/// clock.sleep(2.5);
/// assert_eq!(clock.now(), 1339.5);
/// assert_eq!(clock.total_slept(), 2.5);
/// ```
#[derive(Debug, Clone)]
pub struct ManualClock {
    inner: Arc<Mutex<ManualState>>,
}

#[derive(Debug)]
struct ManualState {
    now: f64,
    slept: f64,
    sleeps: usize,
}

impl ManualClock {
    /// Creates a manual clock reading `now`.
    #[must_use]
    pub fn new(now: f64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ManualState {
                now,
                slept: 0.0,
                sleeps: 0,
            })),
        }
    }

    /// Moves the reading forward without counting it as a sleep.
    pub fn advance(&self, seconds: f64) {
        self.inner.lock().now += seconds;
    }

    /// Sets the reading.
    pub fn set(&self, now: f64) {
        self.inner.lock().now = now;
    }

    /// Total seconds passed to [`RealClock::sleep`].
    #[must_use]
    pub fn total_slept(&self) -> f64 {
        self.inner.lock().slept
    }

    /// Number of positive-length sleeps performed.
    #[must_use]
    pub fn sleep_count(&self) -> usize {
        self.inner.lock().sleeps
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl RealClock for ManualClock {
    fn now(&self) -> f64 {
        self.inner.lock().now
    }

    fn sleep(&self, seconds: f64) {
        if seconds.is_nan() || seconds <= 0.0 {
            return;
        }
        let mut state = self.inner.lock();
        state.now += seconds;
        state.slept += seconds;
        state.sleeps += 1;
    }
}

/// An external cooperative scheduler that can be given a turn.
pub trait CooperativeScheduler: Send + Sync {
    /// Lets other cooperatively scheduled work run for a zero-length slice.
    fn yield_now(&self);
}

impl<F> CooperativeScheduler for F
where
    F: Fn() + Send + Sync,
{
    fn yield_now(&self) {
        self();
    }
}

/// Scheduler that yields the current OS thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadYield;

impl CooperativeScheduler for ThreadYield {
    fn yield_now(&self) {
        std::thread::yield_now();
    }
}

/// Real clock that yields to a cooperative scheduler after every wait.
///
/// Without a scheduler this behaves exactly like the wrapped clock.
#[derive(Clone)]
pub struct CooperativeClock {
    base: Arc<dyn RealClock>,
    scheduler: Option<Arc<dyn CooperativeScheduler>>,
}

impl CooperativeClock {
    /// Wraps `base`, yielding to `scheduler` after each wait.
    #[must_use]
    pub fn new(base: Arc<dyn RealClock>, scheduler: Arc<dyn CooperativeScheduler>) -> Self {
        Self {
            base,
            scheduler: Some(scheduler),
        }
    }

    /// Wraps `base` with no scheduler attached.
    #[must_use]
    pub fn without_scheduler(base: Arc<dyn RealClock>) -> Self {
        Self {
            base,
            scheduler: None,
        }
    }

    /// Cooperative clock over the system clock yielding the OS thread.
    #[must_use]
    pub fn system() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(ThreadYield))
    }

    /// Returns true if a scheduler is attached.
    #[must_use]
    pub fn has_scheduler(&self) -> bool {
        self.scheduler.is_some()
    }
}

impl fmt::Debug for CooperativeClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CooperativeClock")
            .field("base", &self.base)
            .field("has_scheduler", &self.scheduler.is_some())
            .finish()
    }
}

impl RealClock for CooperativeClock {
    fn now(&self) -> f64 {
        self.base.now()
    }

    fn sleep(&self, seconds: f64) {
        self.base.sleep(seconds);
        if let Some(scheduler) = &self.scheduler {
            scheduler.yield_now();
        }
    }
}
