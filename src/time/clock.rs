//! Object-safe clock interface and the swappable proxy.
//!
//! [`Clock`] is the dynamic face of a [`Timeline`]: everything the timeline
//! can do, callable through `dyn Clock`. [`ClockProxy`] owns a boxed clock
//! and forwards every call to it, so the clock behind a long-lived handle can
//! be replaced without the holders noticing.

use super::event::Callback;
use super::timeline::Timeline;
use crate::error::Result;
use std::fmt;

/// Dynamic interface over a virtual clock.
pub trait Clock: fmt::Debug {
    /// Current virtual time in seconds since the epoch.
    fn time(&self) -> f64;

    /// Sleeps `seconds` of virtual time and fires due callbacks.
    fn sleep(&mut self, seconds: f64) -> Result<()>;

    /// Sleeps until every scheduled callback has fired.
    fn sleep_wait_all_scheduled(&mut self) -> Result<()>;

    /// Sleeps `seconds`, waking early at the first scheduled callback.
    fn sleep_stop_first_scheduled(&mut self, seconds: f64) -> Result<()>;

    /// Moves virtual time to `target`; see [`Timeline::set_time`].
    fn set_time(&mut self, target: f64, allow_backwards: bool) -> Result<()>;

    /// Changes the time factor without a jump in the reading.
    fn set_time_factor(&mut self, factor: f64) -> Result<()>;

    /// Current time factor.
    fn time_factor(&self) -> f64;

    /// Stops virtual time from advancing on its own.
    fn freeze(&mut self);

    /// True once the clock was explicitly anchored or moved.
    fn is_modified(&self) -> bool;

    /// Registers a boxed callback `delay` seconds from now.
    fn schedule_boxed(&mut self, delay: f64, callback: Callback) -> Result<()>;
}

impl Clock for Timeline {
    fn time(&self) -> f64 {
        Self::time(self)
    }

    fn sleep(&mut self, seconds: f64) -> Result<()> {
        Self::sleep(self, seconds)
    }

    fn sleep_wait_all_scheduled(&mut self) -> Result<()> {
        Self::sleep_wait_all_scheduled(self)
    }

    fn sleep_stop_first_scheduled(&mut self, seconds: f64) -> Result<()> {
        Self::sleep_stop_first_scheduled(self, seconds)
    }

    fn set_time(&mut self, target: f64, allow_backwards: bool) -> Result<()> {
        Self::set_time(self, target, allow_backwards)
    }

    fn set_time_factor(&mut self, factor: f64) -> Result<()> {
        Self::set_time_factor(self, factor)
    }

    fn time_factor(&self) -> f64 {
        Self::time_factor(self)
    }

    fn freeze(&mut self) {
        Self::freeze(self);
    }

    fn is_modified(&self) -> bool {
        Self::is_modified(self)
    }

    fn schedule_boxed(&mut self, delay: f64, callback: Callback) -> Result<()> {
        Self::schedule_boxed(self, delay, callback)
    }
}

/// A clock slot whose occupant can be swapped at runtime.
///
/// # Example
///
/// ```
/// use timewarp::{Clock, ClockProxy, Timeline};
///
/// let mut proxy = ClockProxy::new(Timeline::frozen_at(10.0)?);
/// proxy.sleep(5.0)?;
/// assert_eq!(proxy.time(), 15.0);
///
/// let previous = proxy.set(Timeline::frozen_at(99.0)?);
/// assert_eq!(previous.time(), 15.0);
/// assert_eq!(proxy.time(), 99.0);
/// # Ok::<(), timewarp::Error>(())
/// ```
pub struct ClockProxy {
    inner: Box<dyn Clock + Send>,
}

impl ClockProxy {
    /// Creates a proxy around `clock`.
    #[must_use]
    pub fn new(clock: impl Clock + Send + 'static) -> Self {
        Self::from_boxed(Box::new(clock))
    }

    /// Creates a proxy around an already boxed clock.
    #[must_use]
    pub fn from_boxed(inner: Box<dyn Clock + Send>) -> Self {
        Self { inner }
    }

    /// Installs `clock`, returning the clock it replaces.
    pub fn set(&mut self, clock: impl Clock + Send + 'static) -> Box<dyn Clock + Send> {
        self.replace(Box::new(clock))
    }

    /// Installs an already boxed clock, returning the one it replaces.
    pub fn replace(&mut self, clock: Box<dyn Clock + Send>) -> Box<dyn Clock + Send> {
        std::mem::replace(&mut self.inner, clock)
    }

    /// Returns the wrapped clock.
    #[must_use]
    pub fn get(&self) -> &(dyn Clock + Send) {
        self.inner.as_ref()
    }

    /// Returns the wrapped clock mutably.
    pub fn get_mut(&mut self) -> &mut (dyn Clock + Send) {
        self.inner.as_mut()
    }

    /// Unwraps the proxy.
    #[must_use]
    pub fn into_inner(self) -> Box<dyn Clock + Send> {
        self.inner
    }
}

impl Default for ClockProxy {
    fn default() -> Self {
        Self::new(Timeline::new())
    }
}

impl fmt::Debug for ClockProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClockProxy").field(&self.inner).finish()
    }
}

impl Clock for ClockProxy {
    fn time(&self) -> f64 {
        self.inner.time()
    }

    fn sleep(&mut self, seconds: f64) -> Result<()> {
        self.inner.sleep(seconds)
    }

    fn sleep_wait_all_scheduled(&mut self) -> Result<()> {
        self.inner.sleep_wait_all_scheduled()
    }

    fn sleep_stop_first_scheduled(&mut self, seconds: f64) -> Result<()> {
        self.inner.sleep_stop_first_scheduled(seconds)
    }

    fn set_time(&mut self, target: f64, allow_backwards: bool) -> Result<()> {
        self.inner.set_time(target, allow_backwards)
    }

    fn set_time_factor(&mut self, factor: f64) -> Result<()> {
        self.inner.set_time_factor(factor)
    }

    fn time_factor(&self) -> f64 {
        self.inner.time_factor()
    }

    fn freeze(&mut self) {
        self.inner.freeze();
    }

    fn is_modified(&self) -> bool {
        self.inner.is_modified()
    }

    fn schedule_boxed(&mut self, delay: f64, callback: Callback) -> Result<()> {
        self.inner.schedule_boxed(delay, callback)
    }
}
