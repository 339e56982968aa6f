//! Input capture infrastructure.
//!
//! An [`InputSource`] runs on its own thread and delivers [`RawInputEvent`]s
//! over a `std::sync::mpsc` channel to the filter thread, which owns the
//! motion engine.  Events therefore arrive serially and in capture order.
//!
//! # Platforms
//!
//! - Linux: [`linux::X11InputSource`] polls the X server for the pointer
//!   position, button mask and keymap.
//! - Everywhere: [`mock::MockInputSource`] accepts injected events and backs
//!   the `--mock` headless mode as well as the tests.

use std::fmt;
use std::str::FromStr;
use std::sync::mpsc;

use mousefilter_core::{MotionEvent, Point, Timestamp, Vector};
use thiserror::Error;

pub mod mock;

#[cfg(target_os = "linux")]
pub mod linux;

/// A raw input event produced by the input capture infrastructure.
#[derive(Debug, Clone, PartialEq)]
pub enum RawInputEvent {
    /// A key was pressed down.
    KeyDown {
        key: Key,
        /// `true` for repeats generated while the key is held.
        autorepeat: bool,
        timestamp: Timestamp,
    },
    /// A key was released.
    KeyUp { key: Key, timestamp: Timestamp },
    /// The pointer moved with no button held.
    MouseMove {
        position: Point,
        delta: Vector,
        timestamp: Timestamp,
    },
    /// The pointer moved while `button` was held.
    MouseDrag {
        button: MouseButton,
        position: Point,
        delta: Vector,
        timestamp: Timestamp,
    },
    /// A mouse button was pressed.
    MouseButtonDown {
        button: MouseButton,
        position: Point,
        timestamp: Timestamp,
    },
    /// A mouse button was released.
    MouseButtonUp {
        button: MouseButton,
        position: Point,
        timestamp: Timestamp,
    },
    /// The wheel was scrolled; positive = away from the user.
    MouseWheel {
        delta: i32,
        position: Point,
        timestamp: Timestamp,
    },
}

impl RawInputEvent {
    /// Capture time of the event.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            Self::KeyDown { timestamp, .. }
            | Self::KeyUp { timestamp, .. }
            | Self::MouseMove { timestamp, .. }
            | Self::MouseDrag { timestamp, .. }
            | Self::MouseButtonDown { timestamp, .. }
            | Self::MouseButtonUp { timestamp, .. }
            | Self::MouseWheel { timestamp, .. } => *timestamp,
        }
    }

    /// The motion sample carried by pointer moves and drags.
    ///
    /// Every other event type returns `None` and is never smoothed.
    pub fn as_motion(&self) -> Option<MotionEvent> {
        match *self {
            Self::MouseMove {
                position,
                delta,
                timestamp,
            }
            | Self::MouseDrag {
                position,
                delta,
                timestamp,
                ..
            } => Some(MotionEvent::new(timestamp, position, delta)),
            _ => None,
        }
    }

    /// Replaces the position and delta of a motion event.
    ///
    /// Non-motion events are returned unchanged.
    pub fn with_motion(self, new_position: Point, new_delta: Vector) -> Self {
        match self {
            Self::MouseMove { timestamp, .. } => Self::MouseMove {
                position: new_position,
                delta: new_delta,
                timestamp,
            },
            Self::MouseDrag {
                button, timestamp, ..
            } => Self::MouseDrag {
                button,
                position: new_position,
                delta: new_delta,
                timestamp,
            },
            other => other,
        }
    }
}

/// Mouse button identifier used in [`RawInputEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
    /// Any further button, by platform number.
    Other(u8),
}

/// A keyboard key, as far as hotkey matching needs to know it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    /// Function key `F1`..`F35`.
    Function(u8),
    /// Any other key, by platform key symbol.
    Other(u32),
}

/// Returned when a hotkey name in the config cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown key name `{0}`; expected F1..F35")]
pub struct UnknownKey(pub String);

impl FromStr for Key {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        trimmed
            .strip_prefix('F')
            .or_else(|| trimmed.strip_prefix('f'))
            .and_then(|n| n.parse::<u8>().ok())
            .filter(|n| (1..=35).contains(n))
            .map(Key::Function)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Function(n) => write!(f, "F{n}"),
            Key::Other(sym) => write!(f, "key 0x{sym:x}"),
        }
    }
}

/// Error type for input capture operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("cannot connect to display server: {0}")]
    DisplayUnavailable(String),
    #[error("input source is already running")]
    AlreadyStarted,
    #[error("input source has not been started")]
    NotStarted,
    #[error("platform not supported: {0}")]
    UnsupportedPlatform(String),
}

/// Trait abstracting input event production.
pub trait InputSource: Send + Sync {
    /// Starts the input source and returns a receiver for captured events.
    fn start(&self) -> Result<mpsc::Receiver<RawInputEvent>, CaptureError>;
    /// Stops the input source and releases all OS resources.
    ///
    /// The receiver returned by `start` disconnects once the source is gone.
    fn stop(&self);
}

// ── Tests ─────────────────────────────────────────────────────────────────────
