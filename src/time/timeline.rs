//! The virtual clock.
//!
//! A [`Timeline`] reports virtual time in seconds since the Unix epoch. It
//! runs in one of two modes, chosen by its time factor:
//!
//! - **Frozen** (`factor == 0`): time only moves when told to. [`sleep`]
//!   returns immediately after moving the clock.
//! - **Live** (`factor > 0`): time advances on its own at `factor` times real
//!   speed. [`sleep`] really waits, `seconds / factor` of real time.
//!
//! Callbacks registered with [`schedule_callback`] fire, in trigger-time
//! order, whenever a sleep brings the clock past their trigger time. While a
//! callback runs, [`time`] reports that callback's exact trigger time.
//!
//! [`sleep`]: Timeline::sleep
//! [`schedule_callback`]: Timeline::schedule_callback
//! [`time`]: Timeline::time

use super::correction::TimeCorrection;
use super::event::{Callback, EventQueue};
use super::real::{RealClock, SystemClock};
use super::sleep::AsyncSleep;
use crate::config::TimelineConfig;
use crate::error::{Result, ensure_finite, ensure_non_negative};
use crate::tracing_compat::{debug, trace};
use std::fmt;
use std::sync::Arc;

/// Factor a fresh timeline starts with: virtual time tracks real time.
pub const DEFAULT_TIME_FACTOR: f64 = 1.0;

/// Controllable virtual clock.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use timewarp::Timeline;
///
/// let mut timeline = Timeline::frozen_at(1_000.0)?;
/// let fired = Arc::new(AtomicUsize::new(0));
///
/// let counter = Arc::clone(&fired);
/// timeline.schedule_callback(100.0, move |timeline| {
///     assert_eq!(timeline.time(), 1_100.0);
///     counter.fetch_add(1, Ordering::SeqCst);
///     Ok(())
/// })?;
///
/// timeline.sleep(3_600.0)?; // an hour passes instantly
/// assert_eq!(timeline.time(), 4_600.0);
/// assert_eq!(fired.load(Ordering::SeqCst), 1);
/// # Ok::<(), timewarp::Error>(())
/// ```
pub struct Timeline {
    real: Arc<dyn RealClock>,
    correction: TimeCorrection,
    time_factor: f64,
    /// Exact trigger time of the callback currently running, if any.
    forced_time: Option<f64>,
    scheduled: EventQueue,
    modified: bool,
}

impl Timeline {
    /// Creates a timeline that transparently tracks the system clock.
    ///
    /// The timeline reports [`is_modified`](Self::is_modified) as false until
    /// it is first mutated.
    #[must_use]
    pub fn new() -> Self {
        Self::with_real_clock(Arc::new(SystemClock))
    }

    /// Creates an unmodified timeline driven by the given real clock.
    #[must_use]
    pub fn with_real_clock(real: Arc<dyn RealClock>) -> Self {
        Self::anchored(real, None, DEFAULT_TIME_FACTOR)
    }

    /// Anchors `start_time` (or the real time) to a single real-clock read.
    fn anchored(real: Arc<dyn RealClock>, start_time: Option<f64>, factor: f64) -> Self {
        let real_now = real.now();
        let modified = start_time.is_some() || factor != DEFAULT_TIME_FACTOR;
        if modified {
            debug!(start_time = ?start_time, factor, real_now, "timeline.anchored");
        }
        Self {
            real,
            correction: TimeCorrection::new(start_time.unwrap_or(real_now), real_now),
            time_factor: factor,
            forced_time: None,
            scheduled: EventQueue::new(),
            modified,
        }
    }

    /// Creates a live timeline starting at `start_time`.
    ///
    /// A non-finite `start_time` is rejected.
    pub fn starting_at(start_time: f64) -> Result<Self> {
        Self::builder().start_time(start_time).build()
    }

    /// Creates a frozen timeline reading exactly `start_time`.
    pub fn frozen_at(start_time: f64) -> Result<Self> {
        Self::builder()
            .start_time(start_time)
            .time_factor(0.0)
            .build()
    }

    /// Returns a builder for a customised timeline.
    #[must_use]
    pub fn builder() -> TimelineBuilder {
        TimelineBuilder::new()
    }

    /// Creates a timeline from configuration, using the system clock.
    pub fn from_config(config: &TimelineConfig) -> Result<Self> {
        config.validate()?;
        let mut builder = Self::builder().time_factor(config.time_factor);
        if let Some(start) = config.start_time {
            builder = builder.start_time(start);
        }
        builder.build()
    }

    /// Returns the current virtual time in seconds since the epoch.
    ///
    /// Inside a scheduled callback this is the callback's exact trigger time.
    #[must_use]
    pub fn time(&self) -> f64 {
        match self.forced_time {
            Some(forced) => forced,
            None => self.live_time(),
        }
    }

    /// Interpolated reading, ignoring any forced time.
    fn live_time(&self) -> f64 {
        self.correction
            .virtual_at(self.real.now(), self.time_factor)
    }

    /// Returns the ratio of virtual to real time advance.
    #[must_use]
    pub fn time_factor(&self) -> f64 {
        self.time_factor
    }

    /// Changes the time factor without a jump in the reading.
    pub fn set_time_factor(&mut self, factor: f64) -> Result<()> {
        let factor = ensure_non_negative("time factor", factor)?;
        self.apply_time_factor(factor);
        Ok(())
    }

    /// Stops virtual time from advancing on its own.
    pub fn freeze(&mut self) {
        self.apply_time_factor(0.0);
    }

    fn apply_time_factor(&mut self, factor: f64) {
        let real_now = self.real.now();
        let live = self.correction.virtual_at(real_now, self.time_factor);
        self.correction.reanchor(live, real_now);
        debug!(
            previous = self.time_factor,
            factor,
            virtual_time = live,
            "timeline.time_factor"
        );
        self.time_factor = factor;
        self.modified = true;
    }

    /// Returns true once the timeline was explicitly anchored or moved.
    ///
    /// An unmodified timeline reads the same as the system clock, so
    /// integrations may skip it entirely.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Moves virtual time to `target`.
    ///
    /// Moving backwards is silently ignored unless `allow_backwards` is set,
    /// so racing advancers never fail each other. Scheduled callbacks are
    /// not fired; the next sleep drains them.
    pub fn set_time(&mut self, target: f64, allow_backwards: bool) -> Result<()> {
        let target = ensure_finite("target time", target)?;
        let now = self.time();
        if target < now && !allow_backwards {
            debug!(target, now, "timeline.set_time.backwards_ignored");
            return Ok(());
        }
        self.move_to(target);
        Ok(())
    }

    fn move_to(&mut self, target: f64) {
        if let Some(forced) = self.forced_time.as_mut() {
            // Keep the callback's view and the live reading moving together.
            let delta = target - *forced;
            *forced = target;
            self.correction.shift_by(delta);
        } else if self.time_factor == 0.0 {
            let real_now = self.real.now();
            self.correction.reanchor(target, real_now);
        } else {
            let delta = target - self.live_time();
            self.correction.shift_by(delta);
        }
        self.modified = true;
    }

    /// Sleeps `seconds` of virtual time, then fires every due callback.
    ///
    /// Frozen timelines move instantly. Live timelines wait
    /// `seconds / factor` of real time.
    pub fn sleep(&mut self, seconds: f64) -> Result<()> {
        let seconds = ensure_non_negative("sleep duration", seconds)?;
        let target = ensure_finite("sleep end time", self.time() + seconds)?;
        self.sleep_until(target)
    }

    /// Returns a future that sleeps `seconds`, then yields to the executor
    /// once before completing.
    pub fn async_sleep(&mut self, seconds: f64) -> AsyncSleep<'_> {
        AsyncSleep::new(self, seconds)
    }

    /// Sleeps until every scheduled callback, including ones scheduled by
    /// callbacks along the way, has fired.
    pub fn sleep_wait_all_scheduled(&mut self) -> Result<()> {
        while let Some(next) = self.scheduled.peek_trigger_time() {
            let target = next.max(self.time());
            self.sleep_until(target)?;
        }
        Ok(())
    }

    /// Sleeps `seconds`, but wakes early at the first scheduled callback.
    pub fn sleep_stop_first_scheduled(&mut self, seconds: f64) -> Result<()> {
        let seconds = ensure_non_negative("sleep duration", seconds)?;
        let now = self.time();
        let mut target = ensure_finite("sleep end time", now + seconds)?;
        if let Some(next) = self.scheduled.peek_trigger_time() {
            target = target.min(next.max(now));
        }
        self.sleep_until(target)
    }

    fn sleep_until(&mut self, target: f64) -> Result<()> {
        self.modified = true;
        if self.time_factor == 0.0 || self.forced_time.is_some() {
            // A forced reading cannot be moved by waiting in real time.
            if target > self.time() {
                self.move_to(target);
            }
        } else {
            self.wait_until(target);
        }
        self.trigger_past_callbacks()?;
        self.real.sleep(0.0);
        Ok(())
    }

    /// Really waits until the live reading reaches `end`.
    fn wait_until(&mut self, end: f64) {
        loop {
            let now = self.live_time();
            if now >= end {
                return;
            }
            self.real.sleep((end - now) / self.time_factor);
            if self.live_time() <= now {
                // The real wait made no progress: the gap is below what the
                // real clock can represent, or the real clock went backwards.
                debug!(end, now, "timeline.sleep.reanchored");
                let real_now = self.real.now();
                self.correction.reanchor(end, real_now);
                return;
            }
        }
    }

    /// Registers `callback` to fire `delay` seconds from now.
    ///
    /// Arguments are bound by capturing them in the closure. The callback
    /// receives the firing timeline and may sleep, move time or schedule
    /// further callbacks.
    pub fn schedule_callback<F>(&mut self, delay: f64, callback: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()> + Send + 'static,
    {
        self.schedule_boxed(delay, Box::new(callback))
    }

    /// Registers an already boxed callback.
    pub fn schedule_boxed(&mut self, delay: f64, callback: Callback) -> Result<()> {
        let delay = ensure_non_negative("schedule delay", delay)?;
        let trigger_time = ensure_finite("trigger time", self.time() + delay)?;
        trace!(delay, trigger_time, "timeline.schedule");
        self.scheduled.push(trigger_time, callback);
        Ok(())
    }

    /// Fires every callback whose trigger time has passed.
    ///
    /// Callbacks scheduled by a firing callback at or before the drain's
    /// start time fire in the same drain. If a callback fails, the error is
    /// returned and the remaining callbacks stay queued.
    ///
    /// Returns the number of callbacks fired.
    pub fn trigger_past_callbacks(&mut self) -> Result<usize> {
        let now = self.time();
        let mut fired = 0;
        while let Some(event) = self.scheduled.pop_due(now) {
            let trigger_time = event.trigger_time();
            trace!(trigger_time, now, "timeline.fire");
            let previous = self.forced_time.replace(trigger_time);
            let outcome = (event.into_callback())(self);
            self.forced_time = previous;
            outcome?;
            fired += 1;
        }
        Ok(fired)
    }

    /// Returns the number of callbacks waiting to fire.
    #[must_use]
    pub fn scheduled_count(&self) -> usize {
        self.scheduled.len()
    }

    /// Returns the trigger time of the next callback, if any.
    #[must_use]
    pub fn next_trigger_time(&self) -> Option<f64> {
        self.scheduled.peek_trigger_time()
    }

    /// Returns the real clock driving this timeline.
    #[must_use]
    pub fn real_clock(&self) -> &Arc<dyn RealClock> {
        &self.real
    }
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("time", &self.time())
            .field("time_factor", &self.time_factor)
            .field("forced_time", &self.forced_time)
            .field("scheduled", &self.scheduled.len())
            .field("modified", &self.modified)
            .finish()
    }
}

/// Builder for [`Timeline`].
#[derive(Debug, Clone)]
pub struct TimelineBuilder {
    start_time: Option<f64>,
    time_factor: f64,
    real_clock: Option<Arc<dyn RealClock>>,
}

impl TimelineBuilder {
    /// Creates a builder for a system-clock timeline at factor 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: None,
            time_factor: DEFAULT_TIME_FACTOR,
            real_clock: None,
        }
    }

    /// Sets the virtual start time.
    #[must_use]
    pub fn start_time(mut self, start_time: f64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    /// Sets the initial time factor.
    #[must_use]
    pub fn time_factor(mut self, factor: f64) -> Self {
        self.time_factor = factor;
        self
    }

    /// Sets the real clock the timeline reads and waits on.
    #[must_use]
    pub fn real_clock(mut self, real: Arc<dyn RealClock>) -> Self {
        self.real_clock = Some(real);
        self
    }

    /// Builds the timeline, validating the start time and factor.
    pub fn build(self) -> Result<Timeline> {
        let factor = ensure_non_negative("time factor", self.time_factor)?;
        let start_time = self
            .start_time
            .map(|start| ensure_finite("start time", start))
            .transpose()?;
        let real = self.real_clock.unwrap_or_else(|| Arc::new(SystemClock));
        Ok(Timeline::anchored(real, start_time, factor))
    }
}

impl Default for TimelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
