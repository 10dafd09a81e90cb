//! Virtual time.
//!
//! - [`Timeline`]: the controllable clock with its scheduled-event queue
//! - [`Clock`] / [`ClockProxy`]: dynamic interface and swappable slot
//! - [`RealClock`] and its implementations: where real time comes from and
//!   how the timeline really waits
//! - [`AsyncSleep`]: awaitable sleep for async callers
//! - [`EventQueue`] / [`TimeCorrection`]: the building blocks, exposed for
//!   callers composing their own clocks

pub mod clock;
pub mod correction;
pub mod event;
pub mod real;
pub mod sleep;
pub mod timeline;

pub use clock::{Clock, ClockProxy};
pub use correction::TimeCorrection;
pub use event::{Callback, EventQueue, ScheduledEvent};
pub use real::{
    CooperativeClock, CooperativeScheduler, ManualClock, RealClock, SystemClock, ThreadYield,
};
pub use sleep::AsyncSleep;
pub use timeline::{DEFAULT_TIME_FACTOR, Timeline, TimelineBuilder};
