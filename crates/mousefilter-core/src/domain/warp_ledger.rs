//! The warp ledger: bookkeeping for cursor repositions the engine issued itself.
//!
//! # Why a ledger? (for beginners)
//!
//! The engine smooths the pointer by *warping* the real cursor to a filtered
//! position.  The OS reports that warp back to us as if it were ordinary
//! movement: a later motion event arrives whose raw delta contains the jump
//! we caused.  If that echo were fed into the filter it would be amplified on
//! the next tick, then echoed again, and the cursor would run away.
//!
//! Every warp is therefore written into this ledger.  When a motion event
//! arrives, [`WarpLedger::reconcile`] decides which outstanding warps the
//! event already reflects and subtracts their deltas from the raw delta.
//!
//! # Matching rules
//!
//! A warp call is not atomic from the OS's point of view: some unknown but
//! bounded time passes between "we asked" and "it happened".  Each record
//! stores the clock readings taken right before and right after the call.
//! The oldest outstanding record is resolved if either:
//!
//! - the warp provably finished before the event (`time_after < event_time`), or
//! - the event falls inside or after the warp window
//!   (`time_before <= event_time`) **and** reports exactly the warp target as
//!   its position, which only an echo of that warp can do.
//!
//! Records are consumed strictly oldest-first.  Resolving a newer record while
//! an older one is still pending would subtract deltas in the wrong order and
//! desynchronise the accounting, so the walk stops at the first record that
//! does not match.

use std::collections::VecDeque;

use super::geometry::{Point, Vector};
use super::timestamp::Timestamp;

/// One cursor reposition issued by the engine.
///
/// Created right after the warp call returns; removed the first time a
/// later motion event is matched to it; never mutated in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpRecord {
    /// Clock reading taken immediately before the warp call.
    pub time_before: Timestamp,
    /// Clock reading taken immediately after the warp call returned.
    pub time_after: Timestamp,
    /// Observed cursor position of the event that triggered the warp.
    pub from: Point,
    /// Absolute position the cursor was moved to.
    pub to: Point,
    /// Horizontal delta the warp is expected to induce.
    pub dx: f64,
    /// Vertical delta the warp is expected to induce.
    pub dy: f64,
}

impl WarpRecord {
    /// The induced delta as a vector.
    pub fn delta(&self) -> Vector {
        Vector::new(self.dx, self.dy)
    }

    /// Returns `true` if an event stamped `event_time` at `event_position`
    /// can be attributed to this warp.
    pub fn is_reflected_by(&self, event_time: Timestamp, event_position: Point) -> bool {
        self.time_after < event_time
            || (self.time_before <= event_time && event_position == self.to)
    }
}

/// Result of reconciling one event against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Reconciled {
    /// Raw delta with every resolved warp's contribution removed.
    pub corrected: Vector,
    /// Sum of the deltas that were removed.
    pub correction: Vector,
    /// How many records were consumed.
    pub resolved: usize,
}

/// Ordered log of outstanding (not yet reconciled) warps.
///
/// Insertion order equals issuance order because warps are issued serially
/// from the single thread that owns the engine.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct WarpLedger {
    records: VecDeque<WarpRecord>,
}

impl WarpLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a newly issued warp.
    pub fn record(&mut self, record: WarpRecord) {
        self.records.push_back(record);
    }

    /// Strips self-induced motion out of `raw_delta`.
    ///
    /// Walks the ledger from the oldest record, consuming every record the
    /// event already reflects and stopping at the first one it does not.
    pub fn reconcile(
        &mut self,
        event_time: Timestamp,
        event_position: Point,
        raw_delta: Vector,
    ) -> Reconciled {
        let mut result = Reconciled {
            corrected: raw_delta,
            ..Reconciled::default()
        };

        while let Some(oldest) = self.records.front() {
            if !oldest.is_reflected_by(event_time, event_position) {
                break;
            }
            let delta = oldest.delta();
            result.corrected -= delta;
            result.correction += delta;
            result.resolved += 1;
            self.records.pop_front();
        }

        result
    }

    /// Drops every outstanding record.
    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Number of outstanding records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` when no warp is awaiting reconciliation.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The oldest outstanding record, if any.
    pub fn oldest(&self) -> Option<&WarpRecord> {
        self.records.front()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
