//! Motion accumulator: the free-running "synthesized" cursor track.
//!
//! The synthesized position integrates the corrected (warp-free) deltas and
//! is what the smoothing filter chases.  It is allowed to drift away from the
//! real cursor, but two rules keep it anchored:
//!
//! - After a pause longer than the idle timeout, it snaps back to the observed
//!   cursor position.  Otherwise resuming motion would apply corrections
//!   measured against a stale, far-away baseline.
//! - It is clamped to the display bounds plus [`OVERSCAN_MARGIN`].

use std::time::Duration;

use super::geometry::{DisplayBounds, Point, Vector, OVERSCAN_MARGIN};
use super::timestamp::Timestamp;

/// Integrates corrected deltas into the synthesized position.
#[derive(Debug, Default, Clone)]
pub struct MotionAccumulator {
    synthesized: Option<Point>,
    last_movement: Option<Timestamp>,
    seeded: bool,
}

impl MotionAccumulator {
    /// Creates an accumulator with no position yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current synthesized position, `None` before the first event.
    pub fn position(&self) -> Option<Point> {
        self.synthesized
    }

    /// Event time of the last integrated movement.
    pub fn last_movement(&self) -> Option<Timestamp> {
        self.last_movement
    }

    /// Seeds the synthesized position, discarding any history.
    ///
    /// Seeding counts as movement: the next event integrates its delta from
    /// `position` whenever it arrives.
    pub fn reset_to(&mut self, position: Point) {
        self.synthesized = Some(position);
        self.last_movement = None;
        self.seeded = true;
    }

    /// Integrates one event and returns the new synthesized position.
    pub fn advance(
        &mut self,
        event_time: Timestamp,
        corrected_delta: Vector,
        event_position: Point,
        bounds: &DisplayBounds,
        idle_timeout: Duration,
    ) -> Point {
        let idle = match self.last_movement {
            Some(last) => event_time.saturating_since(last) > idle_timeout,
            None => !self.seeded,
        };

        let next = match self.synthesized {
            Some(current) if !idle => current + corrected_delta,
            // Unseeded, or resuming after a pause: re-anchor on the cursor.
            _ => event_position,
        };

        let clamped = bounds.clamp_with_margin(next, OVERSCAN_MARGIN);
        self.synthesized = Some(clamped);
        self.last_movement = Some(event_time);
        self.seeded = false;
        clamped
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
