//! # mousefilter
//!
//! Host daemon around [`mousefilter_core`]: captures pointer input, feeds it
//! through the smoothing engine, and warps the real cursor to the filtered
//! position.
//!
//! - [`application`] – the per-event use case and the idle indicator.
//! - [`infrastructure`] – X11 and mock adapters, config storage, settings.

pub mod application;
pub mod infrastructure;
