//! Domain entities for MouseFilter.
//!
//! Everything in this module is pure arithmetic over positions, deltas, and
//! timestamps.  Nothing here touches an OS API, a clock, or a thread.
//!
//! # How the pieces fit (for beginners)
//!
//! Smoothing a pointer means the cursor you see is not where the hardware put
//! it.  The engine keeps three notions of "where the cursor is":
//!
//! - the **observed** position, reported with each OS motion event;
//! - the **synthesized** position, the integral of every genuine (user)
//!   movement, kept by [`accumulator::MotionAccumulator`];
//! - the **filtered** position, a low-passed copy of the synthesized one
//!   computed by [`smoothing::blend`].  This is where the cursor is warped to.
//!
//! Because warping the cursor produces motion events of its own, every warp is
//! logged in the [`warp_ledger::WarpLedger`] so its echo can be subtracted
//! before it contaminates the synthesized position.

/// Points, vectors, and display bounds.
pub mod geometry;

/// Monotonic event timestamps.
pub mod timestamp;

/// Bookkeeping for self-induced cursor warps.
pub mod warp_ledger;

/// Integration of corrected deltas into the synthesized position.
pub mod accumulator;

/// The rubber-band low-pass filter and its configuration.
pub mod smoothing;

/// Speed-adaptive One Euro filter.
pub mod one_euro;
