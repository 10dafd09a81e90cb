//! The active clock of the current thread.
//!
//! Code that wants ambient access to time reads through this module instead
//! of holding a [`Timeline`] itself, so tests can swap the clock underneath
//! it. The registry is thread-confined: every thread starts with its own
//! unmodified timeline tracking the system clock, and swaps on one thread
//! are invisible to others.
//!
//! ```
//! use timewarp::{current, Timeline};
//!
//! let _guard = current::scoped(Timeline::frozen_at(1_000.0)?)?;
//! current::sleep(60.0)?;
//! assert_eq!(current::time()?, 1_060.0);
//! # Ok::<(), timewarp::Error>(())
//! ```
//!
//! Callbacks fired by the active clock run while the registry is borrowed.
//! They must use the `&mut Timeline` they receive; calling back into this
//! module from a callback returns [`ErrorKind::Reentrant`].

use crate::error::{Error, ErrorKind, Result};
use crate::time::{Clock, ClockProxy, Timeline};
use crate::tracing_compat::debug;
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

thread_local! {
    static ACTIVE: RefCell<ClockProxy> = RefCell::new(ClockProxy::default());
}

fn reentrant() -> Error {
    Error::new(ErrorKind::Reentrant)
        .with_context("the active clock is already in use on this thread")
}

/// Runs `f` with mutable access to the active clock.
pub fn with<R>(f: impl FnOnce(&mut dyn Clock) -> R) -> Result<R> {
    ACTIVE.with(|active| {
        let mut proxy = active.try_borrow_mut().map_err(|_| reentrant())?;
        Ok(f(&mut *proxy))
    })
}

/// Runs `f` with shared access to the active clock.
fn with_ref<R>(f: impl FnOnce(&dyn Clock) -> R) -> Result<R> {
    ACTIVE.with(|active| {
        let proxy = active.try_borrow().map_err(|_| reentrant())?;
        Ok(f(&*proxy))
    })
}

/// Installs `clock` as the active clock, returning the previous one.
pub fn set(clock: impl Clock + Send + 'static) -> Result<Box<dyn Clock + Send>> {
    set_boxed(Box::new(clock))
}

/// Installs an already boxed clock, returning the previous one.
pub fn set_boxed(clock: Box<dyn Clock + Send>) -> Result<Box<dyn Clock + Send>> {
    debug!("current.set");
    ACTIVE.with(|active| {
        let mut proxy = active.try_borrow_mut().map_err(|_| reentrant())?;
        Ok(proxy.replace(clock))
    })
}

/// Installs `clock` until the returned guard is dropped.
pub fn scoped(clock: impl Clock + Send + 'static) -> Result<CurrentGuard> {
    let previous = set(clock)?;
    Ok(CurrentGuard {
        previous: Some(previous),
        _not_send: PhantomData,
    })
}

/// Restores the previously active clock when dropped.
///
/// Guards are tied to the thread that created them. Do not drop a guard
/// inside [`with`]: the registry is borrowed there, so the previous clock
/// cannot be restored and is discarded with a `debug` event.
#[must_use = "dropping the guard immediately restores the previous clock"]
pub struct CurrentGuard {
    previous: Option<Box<dyn Clock + Send>>,
    _not_send: PhantomData<Rc<()>>,
}

impl std::fmt::Debug for CurrentGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentGuard")
            .field("previous", &self.previous)
            .finish()
    }
}

impl Drop for CurrentGuard {
    fn drop(&mut self) {
        let Some(previous) = self.previous.take() else {
            return;
        };
        // The thread-local may already be gone during thread teardown.
        let _ = ACTIVE.try_with(|active| match active.try_borrow_mut() {
            Ok(mut proxy) => {
                proxy.replace(previous);
            }
            Err(_) => {
                debug!(previous = ?previous, "current.guard.restore_skipped");
            }
        });
    }
}

/// Current virtual time of the active clock.
pub fn time() -> Result<f64> {
    with_ref(|clock| clock.time())
}

/// Time factor of the active clock.
pub fn time_factor() -> Result<f64> {
    with_ref(|clock| clock.time_factor())
}

/// Whether the active clock was ever explicitly moved.
pub fn is_modified() -> Result<bool> {
    with_ref(|clock| clock.is_modified())
}

/// Sleeps the active clock.
pub fn sleep(seconds: f64) -> Result<()> {
    with(|clock| clock.sleep(seconds))?
}

/// Sleeps the active clock until its scheduled callbacks have all fired.
pub fn sleep_wait_all_scheduled() -> Result<()> {
    with(|clock| clock.sleep_wait_all_scheduled())?
}

/// Sleeps the active clock, waking early at its first scheduled callback.
pub fn sleep_stop_first_scheduled(seconds: f64) -> Result<()> {
    with(|clock| clock.sleep_stop_first_scheduled(seconds))?
}

/// Moves the active clock to `target`.
pub fn set_time(target: f64, allow_backwards: bool) -> Result<()> {
    with(|clock| clock.set_time(target, allow_backwards))?
}

/// Changes the time factor of the active clock.
pub fn set_time_factor(factor: f64) -> Result<()> {
    with(|clock| clock.set_time_factor(factor))?
}

/// Freezes the active clock.
pub fn freeze() -> Result<()> {
    with(|clock| clock.freeze())
}

/// Schedules `callback` on the active clock.
pub fn schedule_callback<F>(delay: f64, callback: F) -> Result<()>
where
    F: FnOnce(&mut Timeline) -> Result<()> + Send + 'static,
{
    with(|clock| clock.schedule_boxed(delay, Box::new(callback)))?
}

/// Calendar values read from the active clock.
///
/// An unmodified clock defers to the system clock, so these behave exactly
/// like `chrono`'s own constructors until a test moves time.
#[cfg(feature = "datetime")]
pub mod datetime {
    use super::with_ref;
    use crate::error::{Error, Result};
    use chrono::{DateTime, Local, NaiveDate, Utc};

    fn snapshot() -> Result<Option<f64>> {
        with_ref(|clock| clock.is_modified().then(|| clock.time()))
    }

    /// Converts seconds since the epoch into a UTC timestamp.
    pub fn from_seconds(seconds: f64) -> Result<DateTime<Utc>> {
        let out_of_range =
            || Error::invalid_argument(format!("time {seconds} is out of range for a date"));
        if !seconds.is_finite() {
            return Err(out_of_range());
        }
        let whole = seconds.floor();
        if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
            return Err(out_of_range());
        }
        let nanos = ((seconds - whole) * 1e9).round().min(999_999_999.0) as u32;
        DateTime::from_timestamp(whole as i64, nanos).ok_or_else(out_of_range)
    }

    /// Current UTC date and time.
    pub fn utcnow() -> Result<DateTime<Utc>> {
        match snapshot()? {
            Some(seconds) => from_seconds(seconds),
            None => Ok(Utc::now()),
        }
    }

    /// Current local date and time.
    pub fn now() -> Result<DateTime<Local>> {
        match snapshot()? {
            Some(seconds) => Ok(from_seconds(seconds)?.with_timezone(&Local)),
            None => Ok(Local::now()),
        }
    }

    /// Current local date.
    pub fn today() -> Result<NaiveDate> {
        now().map(|moment| moment.date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_test_logging;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn init_test(name: &str) {
        init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn default_clock_is_unmodified() {
        init_test("default_clock_is_unmodified");
        let modified = is_modified().unwrap();
        crate::assert_with_log!(!modified, "fresh thread", false, modified);
        let factor = time_factor().unwrap();
        crate::assert_with_log!(factor == 1.0, "default factor", 1.0, factor);
        crate::test_complete!("default_clock_is_unmodified");
    }

    #[test]
    fn scoped_clock_is_restored_on_drop() {
        init_test("scoped_clock_is_restored_on_drop");
        {
            let _guard = scoped(Timeline::frozen_at(50.0).unwrap()).unwrap();
            sleep(10.0).unwrap();
            let now = time().unwrap();
            crate::assert_with_log!(now == 60.0, "scoped clock", 60.0, now);
        }
        let modified = is_modified().unwrap();
        crate::assert_with_log!(!modified, "restored", false, modified);
        crate::test_complete!("scoped_clock_is_restored_on_drop");
    }

    #[test]
    fn set_returns_previous_clock() {
        init_test("set_returns_previous_clock");
        set(Timeline::frozen_at(1.0).unwrap()).unwrap();
        let previous = set(Timeline::frozen_at(2.0).unwrap()).unwrap();
        crate::assert_with_log!(previous.time() == 1.0, "previous", 1.0, previous.time());
        let now = time().unwrap();
        crate::assert_with_log!(now == 2.0, "active", 2.0, now);
        crate::test_complete!("set_returns_previous_clock");
    }

    #[test]
    fn forwarders_drive_the_active_clock() {
        init_test("forwarders_drive_the_active_clock");
        let _guard = scoped(Timeline::frozen_at(0.0).unwrap()).unwrap();
        let fired = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&fired);
        schedule_callback(100.0, move |timeline| {
            sink.lock().push(timeline.time());
            Ok(())
        })
        .unwrap();
        sleep_stop_first_scheduled(500.0).unwrap();
        crate::assert_with_log!(time().unwrap() == 100.0, "stopped early", 100.0, time().unwrap());

        set_time(90.0, false).unwrap();
        crate::assert_with_log!(time().unwrap() == 100.0, "forward only", 100.0, time().unwrap());
        set_time(90.0, true).unwrap();
        crate::assert_with_log!(time().unwrap() == 90.0, "rewound", 90.0, time().unwrap());

        set_time_factor(0.0).unwrap();
        freeze().unwrap();
        crate::assert_with_log!(time_factor().unwrap() == 0.0, "frozen", 0.0, time_factor().unwrap());

        schedule_callback(5.0, |_| Ok(())).unwrap();
        sleep_wait_all_scheduled().unwrap();
        crate::assert_with_log!(time().unwrap() == 95.0, "waited all", 95.0, time().unwrap());
        let recorded = fired.lock().clone();
        crate::assert_with_log!(recorded == vec![100.0], "fired once", vec![100.0], recorded);
        crate::test_complete!("forwarders_drive_the_active_clock");
    }

    #[test]
    fn callback_reentering_registry_gets_error() {
        init_test("callback_reentering_registry_gets_error");
        let _guard = scoped(Timeline::frozen_at(0.0).unwrap()).unwrap();
        let observed = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&observed);
        schedule_callback(1.0, move |_| {
            *sink.lock() = Some(time().map_err(|err| err.kind()));
            Ok(())
        })
        .unwrap();
        sleep(1.0).unwrap();
        let recorded = *observed.lock();
        crate::assert_with_log!(
            recorded == Some(Err(ErrorKind::Reentrant)),
            "reentrant",
            Some(Err::<f64, _>(ErrorKind::Reentrant)),
            recorded
        );
        crate::test_complete!("callback_reentering_registry_gets_error");
    }

    #[test]
    fn guard_dropped_while_borrowed_leaves_active_clock() {
        init_test("guard_dropped_while_borrowed_leaves_active_clock");
        let outer = scoped(Timeline::frozen_at(1.0).unwrap()).unwrap();
        let inner = scoped(Timeline::frozen_at(2.0).unwrap()).unwrap();
        with(move |_| drop(inner)).unwrap();
        let now = time().unwrap();
        crate::assert_with_log!(now == 2.0, "restore skipped", 2.0, now);
        drop(outer);
        let modified = is_modified().unwrap();
        crate::assert_with_log!(!modified, "outer restores default", false, modified);
        crate::test_complete!("guard_dropped_while_borrowed_leaves_active_clock");
    }

    #[test]
    fn threads_do_not_share_the_active_clock() {
        init_test("threads_do_not_share_the_active_clock");
        let _guard = scoped(Timeline::frozen_at(7.0).unwrap()).unwrap();
        let other = std::thread::spawn(|| is_modified().unwrap()).join().unwrap();
        crate::assert_with_log!(!other, "other thread untouched", false, other);
        crate::test_complete!("threads_do_not_share_the_active_clock");
    }

    #[cfg(feature = "datetime")]
    #[test]
    fn datetime_reads_virtual_time_when_modified() {
        init_test("datetime_reads_virtual_time_when_modified");
        let _guard = scoped(Timeline::frozen_at(86_400.5).unwrap()).unwrap();
        let utc = datetime::utcnow().unwrap();
        crate::assert_with_log!(utc.timestamp() == 86_400, "seconds", 86_400, utc.timestamp());
        crate::assert_with_log!(
            utc.timestamp_subsec_millis() == 500,
            "millis",
            500,
            utc.timestamp_subsec_millis()
        );
        let local = datetime::now().unwrap();
        crate::assert_with_log!(local.timestamp() == 86_400, "local instant", 86_400, local.timestamp());
        let today = datetime::today().unwrap();
        crate::assert_with_log!(today == local.date_naive(), "today", local.date_naive(), today);
        crate::test_complete!("datetime_reads_virtual_time_when_modified");
    }

    #[cfg(feature = "datetime")]
    #[test]
    fn datetime_defers_to_system_clock_when_unmodified() {
        init_test("datetime_defers_to_system_clock_when_unmodified");
        let before = chrono::Utc::now();
        let reading = datetime::utcnow().unwrap();
        let after = chrono::Utc::now();
        let within = before <= reading && reading <= after;
        crate::assert_with_log!(within, "system clock", true, within);
        crate::test_complete!("datetime_defers_to_system_clock_when_unmodified");
    }

    #[cfg(feature = "datetime")]
    #[test]
    fn from_seconds_rejects_out_of_range() {
        init_test("from_seconds_rejects_out_of_range");
        let err = datetime::from_seconds(1e30).unwrap_err();
        crate::assert_with_log!(err.is_invalid_argument(), "range", true, err.is_invalid_argument());
        crate::test_complete!("from_seconds_rejects_out_of_range");
    }
}
