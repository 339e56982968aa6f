//! Idle indicator: a presentational marker that follows the synthesized
//! position while the pointer moves.
//!
//! Every movement shows the marker and re-arms a one-shot hide timer.  The
//! timer is a Tokio task; re-arming aborts the previous task and spawns a new
//! one, so the marker disappears `idle_timeout` after the *last* movement.
//!
//! Nothing here feeds back into filtering.  Dropping the indicator entirely
//! (passing `None` to the use case) changes no pointer behaviour.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use mousefilter_core::Point;
use tokio::{runtime::Handle, task::JoinHandle};
use tracing::debug;

/// Where indicator updates are drawn.
#[cfg_attr(test, mockall::automock)]
pub trait IndicatorSink: Send + Sync {
    /// Shows the marker at `position`, or moves it there if already shown.
    fn show_at(&self, position: Point);

    /// Hides the marker.
    fn hide(&self);
}

/// Sink for headless runs: updates are written to the debug log.
#[derive(Debug, Default)]
pub struct LogIndicatorSink;

impl IndicatorSink for LogIndicatorSink {
    fn show_at(&self, position: Point) {
        debug!(x = position.x, y = position.y, "indicator shown");
    }

    fn hide(&self) {
        debug!("indicator hidden");
    }
}

/// Debounced show/hide driver for an [`IndicatorSink`].
pub struct IdleIndicator {
    sink: Arc<dyn IndicatorSink>,
    runtime: Handle,
    visible: Arc<AtomicBool>,
    pending_hide: Option<JoinHandle<()>>,
}

impl IdleIndicator {
    /// Creates an indicator whose hide timers run on `runtime`.
    pub fn new(sink: Arc<dyn IndicatorSink>, runtime: Handle) -> Self {
        Self {
            sink,
            runtime,
            visible: Arc::new(AtomicBool::new(false)),
            pending_hide: None,
        }
    }

    /// Returns `true` while the marker is shown.
    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Acquire)
    }

    /// Shows the marker at `position` and re-arms the hide timer.
    pub fn on_movement(&mut self, position: Point, idle_timeout: Duration) {
        // The old timer must be gone before the marker is marked visible again.
        if let Some(previous) = self.pending_hide.take() {
            previous.abort();
        }

        self.sink.show_at(position);
        self.visible.store(true, Ordering::Release);

        let sink = Arc::clone(&self.sink);
        let visible = Arc::clone(&self.visible);
        self.pending_hide = Some(self.runtime.spawn(async move {
            tokio::time::sleep(idle_timeout).await;
            if visible.swap(false, Ordering::AcqRel) {
                sink.hide();
            }
        }));
    }

    /// Cancels any pending timer and hides the marker now.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending_hide.take() {
            pending.abort();
        }
        if self.visible.swap(false, Ordering::AcqRel) {
            self.sink.hide();
        }
    }
}

impl Drop for IdleIndicator {
    fn drop(&mut self) {
        if let Some(pending) = self.pending_hide.take() {
            pending.abort();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
