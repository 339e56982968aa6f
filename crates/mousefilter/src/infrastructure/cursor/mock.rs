//! In-memory cursor for tests and the `--mock` headless mode.
//!
//! Cloning a [`MockCursor`] yields another handle to the same cursor, so a
//! test can hand one clone to the filter and inspect the warps through the
//! other.

use std::sync::{Arc, Mutex, PoisonError};

use mousefilter_core::{CursorHost, DisplayBounds, Point, Timestamp};

use crate::infrastructure::clock::MonotonicClock;
use crate::infrastructure::pointer_track::{self, SharedPointerTrack};

#[derive(Debug)]
struct MockCursorState {
    warps: Vec<Point>,
    decouple_calls: Vec<bool>,
}

/// A [`CursorHost`] backed by a [`PointerTrack`](pointer_track::PointerTrack).
#[derive(Debug, Clone)]
pub struct MockCursor {
    track: SharedPointerTrack,
    bounds: DisplayBounds,
    clock: MonotonicClock,
    state: Arc<Mutex<MockCursorState>>,
}

impl MockCursor {
    /// Creates a cursor at `position` on a display of the given bounds.
    pub fn new(position: Point, bounds: DisplayBounds) -> Self {
        Self::with_track(pointer_track::shared(position), bounds, MonotonicClock::new())
    }

    /// Creates a cursor over an existing track and clock, so a mock input
    /// source can share them.
    pub fn with_track(track: SharedPointerTrack, bounds: DisplayBounds, clock: MonotonicClock) -> Self {
        Self {
            track,
            bounds,
            clock,
            state: Arc::new(Mutex::new(MockCursorState {
                warps: Vec::new(),
                decouple_calls: Vec::new(),
            })),
        }
    }

    /// The shared pointer track.
    pub fn track(&self) -> SharedPointerTrack {
        Arc::clone(&self.track)
    }

    /// Every warp target, in issue order.
    pub fn warps(&self) -> Vec<Point> {
        self.lock_state().warps.clone()
    }

    /// Every `set_decoupled` argument, in call order.
    pub fn decouple_calls(&self) -> Vec<bool> {
        self.lock_state().decouple_calls.clone()
    }

    /// Moves the cursor as if the user had, bypassing the engine.
    pub fn place(&self, position: Point) {
        let mut track = pointer_track::lock(&self.track);
        let decoupled = track.is_decoupled();
        track.set_decoupled(decoupled, position);
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, MockCursorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CursorHost for MockCursor {
    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn cursor_position(&self) -> Point {
        pointer_track::lock(&self.track).cursor_position()
    }

    fn display_bounds(&self) -> DisplayBounds {
        self.bounds
    }

    fn warp_cursor(&mut self, to: Point) {
        pointer_track::lock(&self.track).record_warp(to, to);
        self.lock_state().warps.push(to);
    }

    fn set_decoupled(&mut self, decoupled: bool) {
        {
            let mut track = pointer_track::lock(&self.track);
            let at = track.cursor_position();
            track.set_decoupled(decoupled, at);
        }
        self.lock_state().decouple_calls.push(decoupled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mousefilter_core::Vector;

    #[test]
    fn test_clones_share_recorded_warps() {
        // Arrange
        let cursor = MockCursor::new(Point::new(0.0, 0.0), DisplayBounds::default());
        let mut handle = cursor.clone();

        // Act
        handle.warp_cursor(Point::new(5.0, 6.0));

        // Assert
        assert_eq!(cursor.warps(), vec![Point::new(5.0, 6.0)]);
    }

    #[test]
    fn test_decoupled_cursor_reports_last_warp_target() {
        // Arrange
        let mut cursor = MockCursor::new(Point::new(100.0, 100.0), DisplayBounds::default());
        cursor.set_decoupled(true);

        // Act
        cursor.warp_cursor(Point::new(101.5, 99.0));
        let observed = pointer_track::lock(&cursor.track()).observe_motion(Vector::new(1.0, 0.0));

        // Assert
        assert_eq!(cursor.cursor_position(), Point::new(101.5, 99.0));
        assert_eq!(observed, Some((Point::new(101.5, 99.0), Vector::new(2.5, -1.0))));
        assert_eq!(cursor.decouple_calls(), vec![true]);
    }

    #[test]
    fn test_place_moves_cursor_without_warping() {
        let cursor = MockCursor::new(Point::new(0.0, 0.0), DisplayBounds::default());

        cursor.place(Point::new(400.0, 300.0));

        assert_eq!(cursor.cursor_position(), Point::new(400.0, 300.0));
        assert!(cursor.warps().is_empty());
    }

    #[test]
    fn test_clock_is_monotonic_across_calls() {
        let cursor = MockCursor::new(Point::new(0.0, 0.0), DisplayBounds::default());
        let a = cursor.now();
        let b = cursor.now();
        assert!(b >= a);
    }
}
