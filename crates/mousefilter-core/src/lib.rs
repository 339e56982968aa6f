//! # mousefilter-core
//!
//! Platform-independent core of MouseFilter, a pointer smoother that drives the
//! real cursor toward a low-passed copy of the user's hand movement.
//!
//! This crate has zero dependencies on OS APIs.  Every interaction with the
//! desktop (reading the cursor, warping it, reading the clock) goes through the
//! [`CursorHost`] trait, which the daemon crate implements per platform.
//!
//! # Architecture overview (for beginners)
//!
//! - **`domain`** – Pure value types and algorithms: geometry, timestamps, the
//!   warp ledger, the motion accumulator, and the smoothing filters.
//!
//! - **`engine`** – [`MotionEngine`], the per-event orchestrator.  It owns one
//!   ledger and one accumulator, consumes [`MotionEvent`]s, and tells the host
//!   where to warp the cursor.
//!
//! The engine is synchronous and single-owner: one thread consumes the motion
//! event stream and holds `&mut MotionEngine`.  The borrow checker is what
//! rules out concurrent mutation of the ledger.

pub mod domain;
pub mod engine;

pub use domain::accumulator::MotionAccumulator;
pub use domain::geometry::{DisplayBounds, Point, Vector, OVERSCAN_MARGIN};
pub use domain::one_euro::{OneEuroFilter, OneEuroFilter2D};
pub use domain::smoothing::{FilterConfig, TuningPolicy, DEFAULT_SMOOTHING, MAX_SMOOTHING};
pub use domain::timestamp::Timestamp;
pub use domain::warp_ledger::{Reconciled, WarpLedger, WarpRecord};
pub use engine::{
    CursorHost, EngineError, EngineState, MotionEngine, MotionEvent, MotionOutput, SmoothingState,
};
