//! Application layer use cases for the MouseFilter daemon.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (the pure smoothing engine in `mousefilter_core`) and the infrastructure
//! (X11, files, clocks).
//!
//! Use cases in this layer:
//!
//! - **Orchestrate** domain objects to fulfil a user goal (e.g., "smooth this
//!   pointer movement and put the cursor where the filter says").
//! - **Depend on abstractions** (`CursorHost`, `IndicatorSink`) rather than
//!   concrete implementations, so a mock cursor can stand in for X11.
//! - **Contain no OS calls and no file system access**.
//!
//! # Sub-modules
//!
//! - **`filter_input`** – Receives raw input events, handles the toggle
//!   hotkey, runs pointer motion through the engine, and decides what gets
//!   forwarded.  It runs on every keystroke and mouse movement.
//!
//! - **`indicator`** – Shows the on-screen position marker while the pointer
//!   moves and hides it once the pointer has been idle long enough.

pub mod filter_input;
pub mod indicator;
