//! Mock input source for tests and the `--mock` headless mode.
//!
//! Allows callers to inject synthetic [`RawInputEvent`]s without a display
//! server.  [`spawn_synthetic_motion`] drives it with a jittery pointer path
//! that goes through a [`PointerTrack`](crate::infrastructure::pointer_track)
//! the same way the X11 source does, so warps issued by the engine come back
//! as echoes.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc::{self, Sender},
    Arc, Mutex, PoisonError,
};
use std::thread::JoinHandle;
use std::time::Duration;

use mousefilter_core::Vector;
use tracing::debug;

use super::{CaptureError, InputSource, RawInputEvent};
use crate::infrastructure::clock::MonotonicClock;
use crate::infrastructure::pointer_track::{self, SharedPointerTrack};

/// A mock implementation of [`InputSource`] that allows callers to inject events.
pub struct MockInputSource {
    sender: Mutex<Option<Sender<RawInputEvent>>>,
}

impl MockInputSource {
    /// Creates a new mock input source.
    pub fn new() -> Self {
        Self {
            sender: Mutex::new(None),
        }
    }

    /// Injects a synthetic event, as if captured from hardware.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError::NotStarted`] before `start()`, after `stop()`,
    /// or once the receiver has been dropped.
    pub fn inject_event(&self, event: RawInputEvent) -> Result<(), CaptureError> {
        let guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        match guard.as_ref() {
            Some(sender) => sender.send(event).map_err(|_| CaptureError::NotStarted),
            None => Err(CaptureError::NotStarted),
        }
    }

    /// Returns `true` between `start()` and `stop()`.
    pub fn is_running(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Default for MockInputSource {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSource for MockInputSource {
    fn start(&self) -> Result<mpsc::Receiver<RawInputEvent>, CaptureError> {
        let mut guard = self.sender.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.is_some() {
            return Err(CaptureError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::channel();
        *guard = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Drop the sender to close the channel
        *self.sender.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

// ── Synthetic motion ──────────────────────────────────────────────────────────

/// Hardware delta for frame `step` of the synthetic path: a slow drift to the
/// right with a few pixels of deterministic jitter on both axes.
pub fn synthetic_delta(step: u64) -> Vector {
    let s = step as f64;
    Vector::new(
        2.0 + 3.0 * (s * 1.7).sin() + 1.5 * (s * 0.13).sin(),
        2.5 * (s * 2.3).cos() + 0.8 * (s * 0.07).sin(),
    )
}

/// Feeds `source` with [`synthetic_delta`] frames every `frame` until
/// `running` is cleared or the source stops accepting events.
pub fn spawn_synthetic_motion(
    source: Arc<MockInputSource>,
    track: SharedPointerTrack,
    clock: MonotonicClock,
    frame: Duration,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    std::thread::spawn(move || {
        let mut step = 0u64;
        while running.load(Ordering::Relaxed) {
            let observed = pointer_track::lock(&track).observe_motion(synthetic_delta(step));
            if let Some((position, delta)) = observed {
                let event = RawInputEvent::MouseMove {
                    position,
                    delta,
                    timestamp: clock.now(),
                };
                if source.inject_event(event).is_err() {
                    debug!("synthetic motion stopped: source closed");
                    break;
                }
            }
            step += 1;
            std::thread::sleep(frame);
        }
    })
}
