//! Anchor bookkeeping for drift-free virtual time.
//!
//! Virtual time is never accumulated step by step. It is recomputed on every
//! read from the last anchor:
//!
//! ```text
//! virtual = virtual_anchor + shift + (real_now - real_anchor) * factor
//! ```
//!
//! Re-anchoring folds the elapsed real time and the shift into a new virtual
//! anchor, so a factor change never makes the reading jump.

/// Record of the last time the timeline was anchored to real time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeCorrection {
    /// Virtual time reported at the moment of anchoring.
    pub virtual_time: f64,
    /// Real time read at the moment of anchoring.
    pub real_time: f64,
    /// Explicit shifts applied since anchoring.
    pub shift: f64,
}

impl TimeCorrection {
    /// Anchors `virtual_time` to `real_time` with no shift.
    #[must_use]
    pub const fn new(virtual_time: f64, real_time: f64) -> Self {
        Self {
            virtual_time,
            real_time,
            shift: 0.0,
        }
    }

    /// Virtual time at `real_now` when advancing `factor` times real speed.
    #[must_use]
    pub fn virtual_at(&self, real_now: f64, factor: f64) -> f64 {
        let elapsed = real_now - self.real_time;
        // Skip the product when frozen so a regressing real clock can't leak in.
        let drift = if factor == 0.0 { 0.0 } else { elapsed * factor };
        self.virtual_time + self.shift + drift
    }

    /// Resets the anchor so `virtual_time` corresponds to `real_time`.
    pub fn reanchor(&mut self, virtual_time: f64, real_time: f64) {
        self.virtual_time = virtual_time;
        self.real_time = real_time;
        self.shift = 0.0;
    }

    /// Adds an explicit jump to the reading.
    pub fn shift_by(&mut self, delta: f64) {
        self.shift += delta;
    }
}
