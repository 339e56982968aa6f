//! Cursor controllers: implementations of the engine's
//! [`CursorHost`](mousefilter_core::CursorHost) seam.
//!
//! A cursor controller reads and warps the real cursor, reports the display
//! bounds, and stamps warps with the same [`MonotonicClock`] the input source
//! uses.  It also flips the shared
//! [`PointerTrack`](crate::infrastructure::pointer_track::PointerTrack)
//! between coupled and decoupled reporting when the engine asks.
//!
//! [`MonotonicClock`]: crate::infrastructure::clock::MonotonicClock

use thiserror::Error;

pub mod mock;

#[cfg(target_os = "linux")]
pub mod linux;

pub use mock::MockCursor;

/// Error type for cursor controller construction.
#[derive(Debug, Error)]
pub enum CursorError {
    #[error("cannot connect to display server: {0}")]
    DisplayUnavailable(String),
}
