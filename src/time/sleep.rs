//! Awaitable sleep for timelines driven from async code.

use super::timeline::Timeline;
use crate::error::Result;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Future returned by [`Timeline::async_sleep`].
///
/// The first poll sleeps the timeline, firing due callbacks, then wakes the
/// task and yields once so other tasks on the executor get to run. The next
/// poll completes. A live timeline still blocks the polling thread for the
/// real wait.
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct AsyncSleep<'a> {
    timeline: &'a mut Timeline,
    seconds: f64,
    slept: bool,
}

impl<'a> AsyncSleep<'a> {
    pub(crate) fn new(timeline: &'a mut Timeline, seconds: f64) -> Self {
        Self {
            timeline,
            seconds,
            slept: false,
        }
    }
}

impl Future for AsyncSleep<'_> {
    type Output = Result<()>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.slept {
            return Poll::Ready(Ok(()));
        }
        self.slept = true;
        let seconds = self.seconds;
        if let Err(err) = self.timeline.sleep(seconds) {
            return Poll::Ready(Err(err));
        }
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}
