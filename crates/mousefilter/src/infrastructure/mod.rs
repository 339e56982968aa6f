//! Infrastructure layer for the MouseFilter daemon.
//!
//! Contains OS-facing adapters: pointer/keyboard capture, cursor warping,
//! the monotonic clock, file-system storage, and the live settings store.
//!
//! **Dependency rule**: this layer may depend on `mousefilter_core`, but MUST
//! NOT be imported by the domain layer.  The `application` layer uses only
//! the event and settings types defined here.

pub mod clock;
pub mod cursor;
pub mod input_capture;
pub mod pointer_track;
pub mod settings;
pub mod storage;
