//! Timed step sequences driven by a timeline.
//!
//! A [`Sequence`] runs user step logic one step at a time. Each step ends by
//! asking to sleep; the sequence then schedules its own resumption on the
//! timeline, so the logic only progresses when the timeline's clock does.
//!
//! Step logic is an explicit state machine: [`StepLogic::resume`] runs the
//! code up to the next sleep point and returns the requested delay, or `None`
//! once there is nothing left to do.
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use timewarp::{Sequence, Step, Timeline};
//!
//! let mut timeline = Timeline::frozen_at(0.0)?;
//! let ticks = Arc::new(AtomicUsize::new(0));
//!
//! let counter = Arc::clone(&ticks);
//! let sequence = Sequence::new(move |_: &Timeline| {
//!     let done = counter.fetch_add(1, Ordering::SeqCst);
//!     (done < 3).then_some(Step::sleep(10.0))
//! });
//! sequence.run(&mut timeline)?;
//!
//! timeline.sleep(25.0)?;
//! assert_eq!(ticks.load(Ordering::SeqCst), 3);
//! assert!(sequence.is_running());
//!
//! timeline.sleep(5.0)?;
//! assert_eq!(ticks.load(Ordering::SeqCst), 4);
//! assert!(!sequence.is_running());
//! # Ok::<(), timewarp::Error>(())
//! ```

use crate::error::{Error, ErrorKind, Result};
use crate::time::Timeline;
use crate::tracing_compat::{debug, trace};
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// A suspension request yielded by step logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Step {
    /// Resume after this many seconds of virtual time.
    Sleep(f64),
}

impl Step {
    /// Requests a resumption `seconds` from now.
    #[must_use]
    pub const fn sleep(seconds: f64) -> Self {
        Self::Sleep(seconds)
    }

    /// Delay requested by this step.
    #[must_use]
    pub const fn delay(self) -> f64 {
        match self {
            Self::Sleep(seconds) => seconds,
        }
    }
}

/// Resumable step logic.
pub trait StepLogic: Send + 'static {
    /// Runs until the next sleep point.
    ///
    /// Returns `None` when the logic is exhausted.
    fn resume(&mut self, timeline: &Timeline) -> Option<Step>;
}

impl<F> StepLogic for F
where
    F: FnMut(&Timeline) -> Option<Step> + Send + 'static,
{
    fn resume(&mut self, timeline: &Timeline) -> Option<Step> {
        self(timeline)
    }
}

/// Step logic that replays a fixed list of delays.
#[derive(Debug, Clone)]
pub struct StepIter<I> {
    steps: I,
}

impl<I> StepLogic for StepIter<I>
where
    I: Iterator<Item = Step> + Send + 'static,
{
    fn resume(&mut self, _timeline: &Timeline) -> Option<Step> {
        self.steps.next()
    }
}

/// Lifecycle of a [`Sequence`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceState {
    /// Created but not yet run.
    NotStarted,
    /// Running; a resumption is pending on the timeline.
    Running,
    /// Step logic returned `None`.
    Completed,
    /// Stopped by [`Sequence::stop`] or by an invalid step.
    Stopped,
}

impl SequenceState {
    /// True for `Completed` and `Stopped`.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Stopped)
    }
}

impl fmt::Display for SequenceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

struct Shared<S> {
    // Held separately from the logic so `stop` works from inside `resume`.
    state: Mutex<SequenceState>,
    logic: Mutex<S>,
}

/// Handle to a timed step sequence.
///
/// Clones share the same sequence, so one handle can be moved into the step
/// logic or elsewhere to stop it.
pub struct Sequence<S> {
    shared: Arc<Shared<S>>,
}

impl<I> Sequence<StepIter<I>>
where
    I: Iterator<Item = Step> + Send + 'static,
{
    /// Creates a sequence that sleeps through `steps` in order.
    pub fn from_steps(steps: impl IntoIterator<IntoIter = I>) -> Self {
        Self::new(StepIter {
            steps: steps.into_iter(),
        })
    }
}

impl<S: StepLogic> Sequence<S> {
    /// Creates a sequence that has not started yet.
    #[must_use]
    pub fn new(logic: S) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SequenceState::NotStarted),
                logic: Mutex::new(logic),
            }),
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SequenceState {
        *self.shared.state.lock()
    }

    /// True only while running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state() == SequenceState::Running
    }

    /// Stops the sequence.
    ///
    /// A resumption already on the timeline still fires but does nothing.
    /// Stopping a completed sequence has no effect.
    pub fn stop(&self) {
        let mut state = self.shared.state.lock();
        if !matches!(*state, SequenceState::Completed) {
            debug!(previous = %*state, "sequence.stop");
            *state = SequenceState::Stopped;
        }
    }

    /// Starts the sequence on `timeline`.
    ///
    /// The first step runs immediately. Every later step runs from a
    /// callback scheduled on `timeline`.
    pub fn run(&self, timeline: &mut Timeline) -> Result<()> {
        {
            let mut state = self.shared.state.lock();
            if *state != SequenceState::NotStarted {
                return Err(Error::new(ErrorKind::SequenceState)
                    .with_context(format!("cannot run a sequence that is {}", *state)));
            }
            *state = SequenceState::Running;
        }
        Self::tick(&self.shared, timeline)
    }

    /// Calls `f` with the step logic, for inspecting its state.
    ///
    /// Must not be called from inside the logic's own `resume`.
    pub fn with_logic<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.shared.logic.lock())
    }

    fn tick(shared: &Arc<Shared<S>>, timeline: &mut Timeline) -> Result<()> {
        if *shared.state.lock() != SequenceState::Running {
            trace!("sequence.tick.skipped");
            return Ok(());
        }

        let step = shared.logic.lock().resume(timeline);

        let mut state = shared.state.lock();
        // The logic may have stopped the sequence while it ran.
        if *state != SequenceState::Running {
            return Ok(());
        }
        let Some(step) = step else {
            debug!("sequence.completed");
            *state = SequenceState::Completed;
            return Ok(());
        };
        drop(state);

        let next = Arc::clone(shared);
        let scheduled = timeline.schedule_callback(step.delay(), move |timeline| {
            Self::tick(&next, timeline)
        });
        if scheduled.is_err() {
            *shared.state.lock() = SequenceState::Stopped;
        }
        scheduled
    }
}

impl<S> Clone for Sequence<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S> fmt::Debug for Sequence<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sequence")
            .field("state", &*self.shared.state.lock())
            .finish_non_exhaustive()
    }
}
