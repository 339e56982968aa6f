//! The motion engine: per-event orchestration of the smoothing pipeline.
//!
//! # Pipeline
//!
//! ```text
//! MotionEvent
//!   └─ WarpLedger::reconcile      strip deltas caused by our own warps
//!   └─ MotionAccumulator::advance integrate into the synthesized track
//!   └─ smoothing::blend           low-pass toward the synthesized track
//!   └─ CursorHost::warp_cursor    move the real cursor (if it differs)
//!   └─ WarpLedger::record         remember the warp for later reconciliation
//! ```
//!
//! # Threading
//!
//! The engine is a plain synchronous state machine.  All mutation goes through
//! `&mut self`, so the borrow checker enforces the single-writer rule: exactly
//! one thread consumes the event stream and owns the engine.  Nothing here
//! blocks or suspends.
//!
//! # Host seam
//!
//! Everything the engine needs from the operating system goes through the
//! [`CursorHost`] trait.  The daemon provides X11 and mock implementations;
//! tests provide simulated desktops.

use thiserror::Error;
use tracing::{info, trace};

use crate::domain::accumulator::MotionAccumulator;
use crate::domain::geometry::{DisplayBounds, Point, Vector};
use crate::domain::smoothing::{self, FilterConfig};
use crate::domain::timestamp::Timestamp;
use crate::domain::warp_ledger::{WarpLedger, WarpRecord};

/// Errors surfaced to the host.  None of them corrupt engine state: the
/// offending event is simply not applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// A motion event arrived with a timestamp earlier than the previous one.
    ///
    /// This is a host-layer contract violation (clock non-monotonicity or
    /// interleaved event sources).
    #[error("motion event at {received} precedes previously processed event at {previous}")]
    NonMonotonicTimestamp {
        previous: Timestamp,
        received: Timestamp,
    },
}

/// Services the engine requires from its host.
pub trait CursorHost {
    /// Reads the monotonic clock used to stamp motion events.
    fn now(&self) -> Timestamp;

    /// Current position of the real cursor.
    fn cursor_position(&self) -> Point;

    /// Bounds of the display the cursor is on.
    fn display_bounds(&self) -> DisplayBounds;

    /// Moves the real cursor to `to`.  Must not block on the resulting
    /// motion event being delivered.
    fn warp_cursor(&mut self, to: Point);

    /// Decouples (or re-couples) hardware motion from the cursor, where the
    /// platform supports it.  While decoupled, only warps move the cursor.
    fn set_decoupled(&mut self, _decoupled: bool) {}
}

/// One pointer movement sample as delivered by the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionEvent {
    /// Monotonic time the event was generated.
    pub timestamp: Timestamp,
    /// Absolute cursor position reported with the event.
    pub position: Point,
    /// Raw delta since the previous event.
    pub delta: Vector,
}

impl MotionEvent {
    /// Creates an event.
    pub fn new(timestamp: Timestamp, position: Point, delta: Vector) -> Self {
        Self {
            timestamp,
            position,
            delta,
        }
    }
}

/// What the host should do with an event after the engine processed it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionOutput {
    /// Delta to report downstream in place of the raw delta.
    pub corrected_delta: Vector,
    /// The warp issued for this event, if any.
    pub warp: Option<WarpRecord>,
    /// Synthesized position after this event; `None` while disabled.
    pub synthesized_position: Option<Point>,
    /// Absolute position to report downstream: the warp target when a warp
    /// was issued, otherwise the observed position.
    pub reported_position: Point,
    /// Number of ledger records this event reconciled.
    pub resolved_warps: usize,
}

impl MotionOutput {
    fn passthrough(event: &MotionEvent) -> Self {
        Self {
            corrected_delta: event.delta,
            warp: None,
            synthesized_position: None,
            reported_position: event.position,
            resolved_warps: 0,
        }
    }
}

/// Smoothing on/off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmoothingState {
    #[default]
    Disabled,
    Enabled,
}

/// Mutable state owned by the engine.
#[derive(Debug, Default, Clone)]
pub struct EngineState {
    accumulator: MotionAccumulator,
    filtered: Option<Point>,
    last_event_time: Option<Timestamp>,
    smoothing: SmoothingState,
}

impl EngineState {
    /// The free-running synthesized position.
    pub fn synthesized_position(&self) -> Option<Point> {
        self.accumulator.position()
    }

    /// The smoothed position the cursor is driven toward.
    pub fn filtered_position(&self) -> Option<Point> {
        self.filtered
    }

    /// Event time of the last integrated movement.
    pub fn last_movement_time(&self) -> Option<Timestamp> {
        self.accumulator.last_movement()
    }

    /// Timestamp of the last accepted event, enabled or not.
    pub fn last_event_time(&self) -> Option<Timestamp> {
        self.last_event_time
    }

    /// Current smoothing state.
    pub fn smoothing(&self) -> SmoothingState {
        self.smoothing
    }

    /// Shorthand for `smoothing() == SmoothingState::Enabled`.
    pub fn is_enabled(&self) -> bool {
        self.smoothing == SmoothingState::Enabled
    }
}

/// The orchestrator.  See the module docs for the pipeline.
#[derive(Debug, Default)]
pub struct MotionEngine {
    state: EngineState,
    ledger: WarpLedger,
}

impl MotionEngine {
    /// Creates an engine in the [`SmoothingState::Disabled`] state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the engine state.
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Read-only view of the outstanding warps.
    pub fn ledger(&self) -> &WarpLedger {
        &self.ledger
    }

    /// Returns `true` when smoothing is enabled.
    pub fn is_enabled(&self) -> bool {
        self.state.is_enabled()
    }

    /// Flips the smoothing state and returns the new one.
    pub fn toggle_smoothing(&mut self, host: &mut dyn CursorHost) -> SmoothingState {
        let enable = !self.is_enabled();
        self.set_enabled(enable, host);
        self.state.smoothing
    }

    /// Enables or disables smoothing.
    ///
    /// Entering the enabled state discards all history: both positions are
    /// seeded from the real cursor so no stale drift survives a
    /// disable/enable cycle.  Every transition clears the ledger, since
    /// warps from a previous session can no longer be matched reliably.
    pub fn set_enabled(&mut self, enabled: bool, host: &mut dyn CursorHost) {
        if enabled == self.is_enabled() {
            return;
        }
        self.ledger.clear();

        if enabled {
            let position = host.cursor_position();
            self.state.accumulator.reset_to(position);
            self.state.filtered = Some(position);
            self.state.smoothing = SmoothingState::Enabled;
            host.set_decoupled(true);
            info!(x = position.x, y = position.y, "smoothing enabled");
        } else {
            self.state.smoothing = SmoothingState::Disabled;
            host.set_decoupled(false);
            info!("smoothing disabled");
        }
    }

    /// Processes one motion event.
    ///
    /// While disabled the event passes through untouched.  While enabled the
    /// raw delta is reconciled, integrated, smoothed, and the cursor is warped
    /// to the filtered position if it differs from the observed one.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NonMonotonicTimestamp`] if the event is older
    /// than the previously processed one.  State and ledger are untouched.
    pub fn process_event(
        &mut self,
        event: &MotionEvent,
        config: &FilterConfig,
        host: &mut dyn CursorHost,
    ) -> Result<MotionOutput, EngineError> {
        if let Some(previous) = self.state.last_event_time {
            if event.timestamp < previous {
                return Err(EngineError::NonMonotonicTimestamp {
                    previous,
                    received: event.timestamp,
                });
            }
        }
        self.state.last_event_time = Some(event.timestamp);

        if !self.is_enabled() {
            return Ok(MotionOutput::passthrough(event));
        }

        let config = config.sanitized();

        let reconciled = self
            .ledger
            .reconcile(event.timestamp, event.position, event.delta);

        let synthesized = self.state.accumulator.advance(
            event.timestamp,
            reconciled.corrected,
            event.position,
            &host.display_bounds(),
            config.idle_timeout(),
        );

        // `set_enabled` seeds the filtered position, so it is always present here.
        let previous = self.state.filtered.unwrap_or(synthesized);
        let filtered = smoothing::blend(Some(previous), synthesized, &config);
        self.state.filtered = Some(filtered);
        let corrected_delta = filtered - previous;

        // Exact comparison: any sub-pixel difference still needs a warp.
        let warp = if filtered != event.position {
            let time_before = host.now();
            host.warp_cursor(filtered);
            let time_after = host.now();

            let record = WarpRecord {
                time_before,
                time_after,
                from: event.position,
                to: filtered,
                dx: corrected_delta.dx,
                dy: corrected_delta.dy,
            };
            self.ledger.record(record);
            trace!(
                to_x = filtered.x,
                to_y = filtered.y,
                outstanding = self.ledger.len(),
                "warp issued"
            );
            Some(record)
        } else {
            None
        };

        Ok(MotionOutput {
            corrected_delta,
            warp,
            synthesized_position: Some(synthesized),
            reported_position: if warp.is_some() { filtered } else { event.position },
            resolved_warps: reconciled.resolved,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
