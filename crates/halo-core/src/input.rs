//! Pointer and scroll coupling.
//!
//! [`PointerTracker`] holds the page-wide raw samples (last value wins).
//! Every instance owns an [`InputState`] that eases toward those samples once
//! per tick with a single-pole low-pass filter.

use crate::constants::{POINTER_SMOOTHING, POINTER_TO_ROTATION, SCROLL_TO_ROTATION};
use crate::viewport::ViewportState;

/// Raw pointer offset from the viewport centre (CSS px) and scroll offset.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct PointerTracker {
    pub x: f32,
    pub y: f32,
    pub scroll: f32,
}

impl PointerTracker {
    /// Store a pointer-move sample given in client (CSS px) coordinates.
    pub fn set_pointer(&mut self, client_x: f32, client_y: f32, viewport: &ViewportState) {
        if !(client_x.is_finite() && client_y.is_finite()) {
            return;
        }
        self.x = client_x - viewport.width * 0.5;
        self.y = client_y - viewport.height * 0.5;
    }

    pub fn set_scroll(&mut self, offset_y: f32) {
        if offset_y.is_finite() {
            self.scroll = offset_y;
        }
    }
}

/// Per-instance view of the pointer: raw target, eased value and clock.
#[derive(Default, Clone, Copy, Debug, PartialEq)]
pub struct InputState {
    pub raw_x: f32,
    pub raw_y: f32,
    pub smoothed_x: f32,
    pub smoothed_y: f32,
    pub raw_scroll: f32,
    pub smoothed_scroll: f32,
    /// Seconds since this instance's scheduler started.
    pub elapsed: f32,
}

impl InputState {
    /// Pull the latest raw samples and advance the filter by one tick.
    pub fn tick(&mut self, tracker: &PointerTracker, elapsed: f32) {
        self.raw_x = tracker.x * POINTER_TO_ROTATION;
        self.raw_y = tracker.y * POINTER_TO_ROTATION;
        self.raw_scroll = tracker.scroll * SCROLL_TO_ROTATION;
        self.smoothed_x = ease_toward(self.smoothed_x, self.raw_x);
        self.smoothed_y = ease_toward(self.smoothed_y, self.raw_y);
        self.smoothed_scroll = ease_toward(self.smoothed_scroll, self.raw_scroll);
        if elapsed.is_finite() {
            self.elapsed = self.elapsed.max(elapsed);
        }
    }
}

/// `current += (target - current) * α`; lags but never overshoots for α in (0, 1].
#[inline]
pub fn ease_toward(current: f32, target: f32) -> f32 {
    current + (target - current) * POINTER_SMOOTHING
}
