//! Linux input capture by polling the X server.
//!
//! A dedicated thread opens its own Xlib connection and, once per poll
//! interval, reads
//!
//! - the pointer position and button mask (`XQueryPointer`), and
//! - the 256-bit keyboard state vector (`XQueryKeymap`).
//!
//! Differences between consecutive polls become [`RawInputEvent`]s.  Pointer
//! samples go through the shared [`PointerTrack`] so that, while smoothing is
//! enabled, the engine sees decoupled motion (see
//! [`pointer_track`](crate::infrastructure::pointer_track)).
//!
//! # Limitations
//!
//! Polling observes input; it cannot intercept it.  Applications still see
//! the original key and pointer events, and the hotkey is not swallowed.
//! Key repeats are invisible to a keymap poll, so every key-down is reported
//! with `autorepeat: false`.
//!
//! # Why a separate connection?
//!
//! An Xlib `Display` must not be used from two threads at once.  The cursor
//! controller on the filter thread owns a second connection.

use std::os::raw::{c_char, c_int, c_uint};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    mpsc, Arc, Mutex, PoisonError,
};
use std::thread::JoinHandle;
use std::time::Duration;

use mousefilter_core::{Point, Timestamp, Vector};
use tracing::{debug, info, warn};
use x11::xlib;

use super::{CaptureError, InputSource, Key, MouseButton, RawInputEvent};
use crate::infrastructure::clock::MonotonicClock;
use crate::infrastructure::pointer_track::{self, SharedPointerTrack};

// ── X11 constants ─────────────────────────────────────────────────────────────

/// `XK_F1`; `XK_F2`..`XK_F35` follow consecutively.
const XK_F1: u64 = 0xFFBE;

/// Pointer buttons we track, with their `XQueryPointer` mask bits.
const BUTTONS: [(MouseButton, c_uint); 3] = [
    (MouseButton::Left, xlib::Button1Mask),
    (MouseButton::Middle, xlib::Button2Mask),
    (MouseButton::Right, xlib::Button3Mask),
];

/// Input source that polls an X11 display.
pub struct X11InputSource {
    track: SharedPointerTrack,
    clock: MonotonicClock,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl X11InputSource {
    /// Creates a source that will poll every `poll_interval` once started.
    pub fn new(track: SharedPointerTrack, clock: MonotonicClock, poll_interval: Duration) -> Self {
        Self {
            track,
            clock,
            poll_interval,
            running: Arc::new(AtomicBool::new(false)),
            worker: Mutex::new(None),
        }
    }
}

impl InputSource for X11InputSource {
    fn start(&self) -> Result<mpsc::Receiver<RawInputEvent>, CaptureError> {
        let mut worker = self.worker.lock().unwrap_or_else(PoisonError::into_inner);
        if worker.is_some() {
            return Err(CaptureError::AlreadyStarted);
        }

        let (tx, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), CaptureError>>();
        self.running.store(true, Ordering::Relaxed);

        let poller = Poller {
            track: Arc::clone(&self.track),
            clock: self.clock,
            poll_interval: self.poll_interval,
            running: Arc::clone(&self.running),
        };
        let handle = std::thread::Builder::new()
            .name("mousefilter-x11-input".to_string())
            .spawn(move || poller.run(tx, ready_tx))
            .map_err(|e| CaptureError::DisplayUnavailable(format!("spawn failed: {e}")))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {
                *worker = Some(handle);
                info!(interval = ?self.poll_interval, "X11 input polling started");
                Ok(rx)
            }
            Ok(Err(e)) => {
                self.running.store(false, Ordering::Relaxed);
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                self.running.store(false, Ordering::Relaxed);
                let _ = handle.join();
                Err(CaptureError::DisplayUnavailable(
                    "input thread exited during startup".to_string(),
                ))
            }
        }
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if handle.join().is_err() {
                warn!("X11 input thread panicked");
            }
        }
    }
}

impl Drop for X11InputSource {
    fn drop(&mut self) {
        self.stop();
    }
}

// ── Poll loop ─────────────────────────────────────────────────────────────────

struct Poller {
    track: SharedPointerTrack,
    clock: MonotonicClock,
    poll_interval: Duration,
    running: Arc<AtomicBool>,
}

/// One `XQueryPointer` reading.
struct PointerSample {
    position: Point,
    mask: c_uint,
}

impl Poller {
    fn run(self, tx: mpsc::Sender<RawInputEvent>, ready: mpsc::Sender<Result<(), CaptureError>>) {
        // SAFETY: XOpenDisplay accepts a null name (use $DISPLAY).  The
        // returned pointer is closed at the end of this function and never
        // leaves this thread.
        let display = unsafe { xlib::XOpenDisplay(std::ptr::null()) };
        if display.is_null() {
            let display_env = std::env::var("DISPLAY").unwrap_or_else(|_| "<unset>".to_string());
            let _ = ready.send(Err(CaptureError::DisplayUnavailable(format!(
                "XOpenDisplay failed; DISPLAY={display_env}"
            ))));
            return;
        }
        // SAFETY: `display` is a valid connection.
        let root = unsafe { xlib::XDefaultRootWindow(display) };

        let Some(first) = query_pointer(display, root) else {
            let _ = ready.send(Err(CaptureError::DisplayUnavailable(
                "pointer is not on the default screen".to_string(),
            )));
            // SAFETY: opened above, not used afterwards.
            unsafe { xlib::XCloseDisplay(display) };
            return;
        };
        pointer_track::lock(&self.track).set_decoupled(false, first.position);
        let mut last_mask = first.mask;
        let mut last_keys = query_keymap(display);
        let _ = ready.send(Ok(()));

        'poll: while self.running.load(Ordering::Relaxed) {
            std::thread::sleep(self.poll_interval);

            let mut events = Vec::new();
            // The track stays locked from query to observe so that a warp
            // cannot land between the two.
            let polled = {
                let mut track = pointer_track::lock(&self.track);
                query_pointer(display, root).map(|sample| {
                    let timestamp = self.clock.now();
                    let observed = track.observe(sample.position);
                    (sample, observed, timestamp)
                })
            };
            if let Some((sample, observed, timestamp)) = polled {
                pointer_events(&sample, observed, last_mask, timestamp, &mut events);
                last_mask = sample.mask;
            }

            let keys = query_keymap(display);
            if keys != last_keys {
                let timestamp = self.clock.now();
                key_events(display, &last_keys, &keys, timestamp, &mut events);
                last_keys = keys;
            }

            for event in events {
                if tx.send(event).is_err() {
                    debug!("input receiver dropped; stopping X11 polling");
                    break 'poll;
                }
            }
        }

        // SAFETY: `display` was opened above and is not used after this.
        unsafe { xlib::XCloseDisplay(display) };
    }
}

fn pointer_events(
    sample: &PointerSample,
    observed: Option<(Point, Vector)>,
    last_mask: c_uint,
    timestamp: Timestamp,
    out: &mut Vec<RawInputEvent>,
) {
    if let Some((position, delta)) = observed {
        let held = BUTTONS
            .iter()
            .find(|(_, bit)| sample.mask & bit != 0)
            .map(|(button, _)| *button);
        out.push(match held {
            Some(button) => RawInputEvent::MouseDrag {
                button,
                position,
                delta,
                timestamp,
            },
            None => RawInputEvent::MouseMove {
                position,
                delta,
                timestamp,
            },
        });
    }

    for (button, bit) in BUTTONS {
        let was = last_mask & bit != 0;
        let is = sample.mask & bit != 0;
        if was == is {
            continue;
        }
        let position = sample.position;
        out.push(if is {
            RawInputEvent::MouseButtonDown {
                button,
                position,
                timestamp,
            }
        } else {
            RawInputEvent::MouseButtonUp {
                button,
                position,
                timestamp,
            }
        });
    }
}

fn query_pointer(display: *mut xlib::Display, root: xlib::Window) -> Option<PointerSample> {
    let mut root_ret: xlib::Window = 0;
    let mut child_ret: xlib::Window = 0;
    let (mut root_x, mut root_y, mut win_x, mut win_y): (c_int, c_int, c_int, c_int) = (0, 0, 0, 0);
    let mut mask: c_uint = 0;

    // SAFETY: `display` is a valid connection owned by the calling thread and
    // every out-pointer refers to a live local.
    let on_screen = unsafe {
        xlib::XQueryPointer(
            display,
            root,
            &mut root_ret,
            &mut child_ret,
            &mut root_x,
            &mut root_y,
            &mut win_x,
            &mut win_y,
            &mut mask,
        )
    };
    (on_screen != 0).then(|| PointerSample {
        position: Point::new(f64::from(root_x), f64::from(root_y)),
        mask,
    })
}

fn query_keymap(display: *mut xlib::Display) -> [c_char; 32] {
    let mut keys: [c_char; 32] = [0; 32];
    // SAFETY: XQueryKeymap writes exactly 32 bytes into the buffer.
    unsafe { xlib::XQueryKeymap(display, keys.as_mut_ptr()) };
    keys
}

fn key_events(
    display: *mut xlib::Display,
    before: &[c_char; 32],
    after: &[c_char; 32],
    timestamp: Timestamp,
    out: &mut Vec<RawInputEvent>,
) {
    for (byte, (&old, &new)) in before.iter().zip(after.iter()).enumerate() {
        let changed = (old ^ new) as u8;
        if changed == 0 {
            continue;
        }
        for bit in 0..8u8 {
            if changed & (1 << bit) == 0 {
                continue;
            }
            let keycode = (byte * 8) as u8 + bit;
            let pressed = (new as u8) & (1 << bit) != 0;
            // SAFETY: `display` is valid; any keycode value is accepted.
            let keysym = unsafe { xlib::XKeycodeToKeysym(display, keycode, 0) };
            let key = key_from_keysym(keysym);
            out.push(if pressed {
                RawInputEvent::KeyDown {
                    key,
                    autorepeat: false,
                    timestamp,
                }
            } else {
                RawInputEvent::KeyUp { key, timestamp }
            });
        }
    }
}

fn key_from_keysym(keysym: xlib::KeySym) -> Key {
    let sym = keysym as u64;
    if (XK_F1..XK_F1 + 35).contains(&sym) {
        Key::Function((sym - XK_F1 + 1) as u8)
    } else {
        Key::Other(sym as u32)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
