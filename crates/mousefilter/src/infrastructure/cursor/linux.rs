//! Linux cursor control via Xlib.
//!
//! - `XQueryPointer` reads the real cursor.
//! - `XWarpPointer` with a `None` source window moves it to absolute root
//!   coordinates.  X11 positions are integers, so targets are rounded and the
//!   rounded landing point is handed to the pointer track.
//! - `XDisplayWidth` / `XDisplayHeight` give the bounds of the default screen.
//!   Xlib does not expose per-monitor layout without Xrandr, so the whole
//!   root window counts as one display.
//!
//! Warps run under the shared pointer-track lock and end with `XSync`, so the
//! input thread never samples between the warp and its bookkeeping.

use std::os::raw::{c_int, c_uint};

use mousefilter_core::{CursorHost, DisplayBounds, Point, Timestamp};
use tracing::{debug, info};
use x11::xlib;

use super::CursorError;
use crate::infrastructure::clock::MonotonicClock;
use crate::infrastructure::pointer_track::{self, SharedPointerTrack};

/// Xlib-backed [`CursorHost`].
pub struct X11Cursor {
    display: *mut xlib::Display,
    root: xlib::Window,
    bounds: DisplayBounds,
    track: SharedPointerTrack,
    clock: MonotonicClock,
}

// SAFETY: the `Display` connection is opened by and owned exclusively by this
// value.  It is only ever used through `&mut self` / `&self` of one owner, so
// moving the owner to another thread cannot produce concurrent Xlib calls on
// the connection.
unsafe impl Send for X11Cursor {}

impl X11Cursor {
    /// Opens a dedicated connection to the display named by `$DISPLAY`.
    ///
    /// # Errors
    ///
    /// Returns [`CursorError::DisplayUnavailable`] if the connection fails.
    pub fn open(track: SharedPointerTrack, clock: MonotonicClock) -> Result<Self, CursorError> {
        // SAFETY: null selects $DISPLAY.  The pointer is closed in `Drop`.
        let display = unsafe { xlib::XOpenDisplay(std::ptr::null()) };
        if display.is_null() {
            let display_env = std::env::var("DISPLAY").unwrap_or_else(|_| "<unset>".to_string());
            return Err(CursorError::DisplayUnavailable(format!(
                "XOpenDisplay failed; DISPLAY={display_env}"
            )));
        }

        // SAFETY: `display` is a valid connection.
        let (root, width, height) = unsafe {
            let screen = xlib::XDefaultScreen(display);
            (
                xlib::XDefaultRootWindow(display),
                xlib::XDisplayWidth(display, screen),
                xlib::XDisplayHeight(display, screen),
            )
        };
        let bounds = DisplayBounds::from_size(f64::from(width), f64::from(height));
        info!(width, height, "X11 cursor controller connected");

        Ok(Self {
            display,
            root,
            bounds,
            track,
            clock,
        })
    }

    fn query_position(&self) -> Option<Point> {
        let mut root_ret: xlib::Window = 0;
        let mut child_ret: xlib::Window = 0;
        let (mut root_x, mut root_y, mut win_x, mut win_y): (c_int, c_int, c_int, c_int) =
            (0, 0, 0, 0);
        let mut mask: c_uint = 0;

        // SAFETY: valid connection; all out-pointers refer to live locals.
        let on_screen = unsafe {
            xlib::XQueryPointer(
                self.display,
                self.root,
                &mut root_ret,
                &mut child_ret,
                &mut root_x,
                &mut root_y,
                &mut win_x,
                &mut win_y,
                &mut mask,
            )
        };
        (on_screen != 0).then(|| Point::new(f64::from(root_x), f64::from(root_y)))
    }
}

impl CursorHost for X11Cursor {
    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn cursor_position(&self) -> Point {
        let track = pointer_track::lock(&self.track);
        if track.is_decoupled() {
            return track.cursor_position();
        }
        drop(track);
        self.query_position()
            .unwrap_or_else(|| pointer_track::lock(&self.track).cursor_position())
    }

    fn display_bounds(&self) -> DisplayBounds {
        self.bounds
    }

    fn warp_cursor(&mut self, to: Point) {
        let landed = Point::new(to.x.round(), to.y.round());
        let mut track = pointer_track::lock(&self.track);
        // SAFETY: valid connection; a `None` (0) source window makes the
        // destination coordinates absolute within `root`.
        unsafe {
            xlib::XWarpPointer(
                self.display,
                0,
                self.root,
                0,
                0,
                0,
                0,
                landed.x as c_int,
                landed.y as c_int,
            );
            xlib::XSync(self.display, xlib::False);
        }
        track.record_warp(to, landed);
    }

    fn set_decoupled(&mut self, decoupled: bool) {
        let real = self
            .query_position()
            .unwrap_or_else(|| pointer_track::lock(&self.track).cursor_position());
        pointer_track::lock(&self.track).set_decoupled(decoupled, real);
        debug!(decoupled, x = real.x, y = real.y, "pointer decoupling changed");
    }
}

impl Drop for X11Cursor {
    fn drop(&mut self) {
        // SAFETY: `display` was opened in `open` and is not used after this.
        unsafe { xlib::XCloseDisplay(self.display) };
    }
}
