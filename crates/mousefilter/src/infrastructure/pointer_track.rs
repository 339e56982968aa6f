//! Pointer bookkeeping that emulates hardware/cursor decoupling.
//!
//! # Why this exists (for beginners)
//!
//! The smoothing engine expects the platform to *decouple* the mouse from the
//! cursor while smoothing is on: hardware motion is reported as deltas, but
//! only warps actually move the cursor.  The OS then folds each warp jump into
//! the delta of the next motion event, and the engine's warp ledger subtracts
//! it again.
//!
//! Some platforms (X11 among them) have no such switch: the hardware always
//! drags the cursor along.  [`PointerTrack`] recreates the decoupled picture
//! from raw samples.  It remembers where the cursor was last put (by a warp or
//! by a previous sample), so it can split every new sample into
//!
//! - the hardware motion since then, and
//! - the warp jumps issued since the previous event (the *echo*).
//!
//! While decoupled it reports the event at the last warp target (the
//! *virtual* cursor) with `delta = hardware + echo`, exactly as a decoupled
//! desktop would.  While coupled it reports the sampled position and the
//! hardware delta unchanged.
//!
//! The input source thread and the cursor controller share one track through
//! [`SharedPointerTrack`].

use std::sync::{Arc, Mutex, PoisonError};

use mousefilter_core::{Point, Vector};

/// A [`PointerTrack`] shared between the input thread and the cursor host.
pub type SharedPointerTrack = Arc<Mutex<PointerTrack>>;

/// Wraps a fresh track for sharing.
pub fn shared(initial: Point) -> SharedPointerTrack {
    Arc::new(Mutex::new(PointerTrack::new(initial)))
}

/// Locks a shared track, recovering from a poisoned lock.
///
/// The track holds plain values that are valid after any partial update.
pub fn lock(track: &SharedPointerTrack) -> std::sync::MutexGuard<'_, PointerTrack> {
    track.lock().unwrap_or_else(PoisonError::into_inner)
}

/// See the module docs.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerTrack {
    decoupled: bool,
    /// Where the cursor was last put, by a warp or by a sample.
    baseline: Point,
    /// Last warp target; what a decoupled desktop shows as the cursor.
    virtual_position: Point,
    /// Warp jumps not yet folded into an event.
    pending_echo: Vector,
}

impl PointerTrack {
    /// Creates a coupled track with the cursor at `initial`.
    pub fn new(initial: Point) -> Self {
        Self {
            decoupled: false,
            baseline: initial,
            virtual_position: initial,
            pending_echo: Vector::ZERO,
        }
    }

    /// Returns `true` while hardware motion is decoupled from the cursor.
    pub fn is_decoupled(&self) -> bool {
        self.decoupled
    }

    /// The cursor position a decoupled desktop would report.
    pub fn cursor_position(&self) -> Point {
        if self.decoupled {
            self.virtual_position
        } else {
            self.baseline
        }
    }

    /// Switches decoupling on or off with the real cursor at `real_position`.
    ///
    /// Any echo still pending belongs to the previous session and is dropped.
    pub fn set_decoupled(&mut self, decoupled: bool, real_position: Point) {
        self.decoupled = decoupled;
        self.baseline = real_position;
        self.virtual_position = real_position;
        self.pending_echo = Vector::ZERO;
    }

    /// Records a warp to `to`.
    ///
    /// `landed` is where the platform actually put the cursor; integer-only
    /// platforms round the target.
    pub fn record_warp(&mut self, to: Point, landed: Point) {
        self.pending_echo += to - self.virtual_position;
        self.virtual_position = to;
        self.baseline = landed;
    }

    /// Splits a sampled absolute position into `(position, delta)`.
    ///
    /// Returns `None` when the hardware did not move; any pending echo is
    /// then kept for the next real movement.
    pub fn observe(&mut self, sampled: Point) -> Option<(Point, Vector)> {
        self.observe_motion(sampled - self.baseline)
    }

    /// Like [`observe`](Self::observe) for platforms that report hardware
    /// deltas directly.
    pub fn observe_motion(&mut self, hardware: Vector) -> Option<(Point, Vector)> {
        if hardware == Vector::ZERO {
            return None;
        }
        self.baseline += hardware;

        if !self.decoupled {
            self.virtual_position = self.baseline;
            return Some((self.baseline, hardware));
        }

        let echo = std::mem::take(&mut self.pending_echo);
        Some((self.virtual_position, hardware + echo))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coupled_track_reports_samples_verbatim() {
        // Arrange
        let mut track = PointerTrack::new(Point::new(100.0, 100.0));

        // Act
        let observed = track.observe(Point::new(104.0, 97.0));

        // Assert
        assert_eq!(observed, Some((Point::new(104.0, 97.0), Vector::new(4.0, -3.0))));
        assert_eq!(track.cursor_position(), Point::new(104.0, 97.0));
    }

    #[test]
    fn test_unchanged_sample_produces_no_event() {
        let mut track = PointerTrack::new(Point::new(5.0, 5.0));
        assert_eq!(track.observe(Point::new(5.0, 5.0)), None);
    }

    #[test]
    fn test_decoupled_track_reports_virtual_position_and_folds_echo() {
        // Arrange
        let mut track = PointerTrack::new(Point::new(0.0, 0.0));
        track.set_decoupled(true, Point::new(400.0, 300.0));
        track.record_warp(Point::new(402.5, 300.0), Point::new(403.0, 300.0));

        // Act – hardware moved 6 px right of where the warp landed
        let observed = track.observe(Point::new(409.0, 300.0));

        // Assert
        let (position, delta) = observed.expect("hardware moved");
        assert_eq!(position, Point::new(402.5, 300.0));
        assert_eq!(delta, Vector::new(6.0 + 2.5, 0.0));
    }

    #[test]
    fn test_echo_waits_for_next_hardware_motion() {
        // Arrange
        let mut track = PointerTrack::new(Point::new(0.0, 0.0));
        track.set_decoupled(true, Point::new(10.0, 10.0));
        track.record_warp(Point::new(12.0, 10.0), Point::new(12.0, 10.0));

        // Act – the sample only shows the warp itself
        let first = track.observe(Point::new(12.0, 10.0));
        let second = track.observe(Point::new(13.0, 10.0));

        // Assert
        assert_eq!(first, None);
        assert_eq!(second, Some((Point::new(12.0, 10.0), Vector::new(3.0, 0.0))));
    }

    #[test]
    fn test_set_decoupled_drops_pending_echo() {
        let mut track = PointerTrack::new(Point::new(0.0, 0.0));
        track.set_decoupled(true, Point::new(0.0, 0.0));
        track.record_warp(Point::new(50.0, 0.0), Point::new(50.0, 0.0));

        track.set_decoupled(false, Point::new(50.0, 0.0));
        let observed = track.observe_motion(Vector::new(1.0, 0.0));

        assert_eq!(observed, Some((Point::new(51.0, 0.0), Vector::new(1.0, 0.0))));
        assert!(!track.is_decoupled());
    }

    #[test]
    fn test_shared_track_is_usable_from_two_handles() {
        let track = shared(Point::new(1.0, 1.0));
        let other = Arc::clone(&track);

        lock(&track).set_decoupled(true, Point::new(1.0, 1.0));

        assert!(lock(&other).is_decoupled());
    }
}
