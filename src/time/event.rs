//! Scheduled events and the queue that orders them.
//!
//! This module provides a min-heap of `(trigger_time, callback)` pairs. Events
//! with equal trigger times pop in insertion order.

use crate::Timeline;
use crate::error::Result;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

/// Callback invoked when a scheduled event fires.
///
/// The callback receives the timeline that fired it, so it can sleep,
/// schedule further callbacks or move time while the drain is in progress.
pub type Callback = Box<dyn FnOnce(&mut Timeline) -> Result<()> + Send + 'static>;

/// A callback registered to fire at a fixed virtual time.
pub struct ScheduledEvent {
    trigger_time: f64,
    sequence: u64,
    callback: Callback,
}

impl ScheduledEvent {
    /// Virtual time at which the event fires.
    #[must_use]
    pub fn trigger_time(&self) -> f64 {
        self.trigger_time
    }

    /// Insertion sequence number used to order equal trigger times.
    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Consumes the event, returning its callback.
    #[must_use]
    pub fn into_callback(self) -> Callback {
        self.callback
    }
}

impl fmt::Debug for ScheduledEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledEvent")
            .field("trigger_time", &self.trigger_time)
            .field("sequence", &self.sequence)
            .finish_non_exhaustive()
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledEvent {}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (earliest trigger first).
        other
            .trigger_time
            .total_cmp(&self.trigger_time)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A min-heap of scheduled events ordered by trigger time.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<ScheduledEvent>,
    next_sequence: u64,
}

impl EventQueue {
    /// Creates a new empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns true if no events are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Adds an event firing at `trigger_time`.
    pub fn push(&mut self, trigger_time: f64, callback: Callback) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(ScheduledEvent {
            trigger_time,
            sequence,
            callback,
        });
    }

    /// Returns the earliest trigger time, if any.
    #[must_use]
    pub fn peek_trigger_time(&self) -> Option<f64> {
        self.heap.peek().map(ScheduledEvent::trigger_time)
    }

    /// Pops the earliest event if it is due at `now`.
    pub fn pop_due(&mut self, now: f64) -> Option<ScheduledEvent> {
        if self.heap.peek()?.trigger_time <= now {
            self.heap.pop()
        } else {
            None
        }
    }
}
