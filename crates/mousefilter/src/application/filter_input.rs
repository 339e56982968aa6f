//! FilterInputUseCase: decides what happens to each captured input event.
//!
//! This use case is the heart of the daemon.  It owns the [`MotionEngine`]
//! and the cursor it warps, and for every event from the capture service it:
//!
//! 1. Consumes the toggle hotkey and flips smoothing on a fresh press.
//! 2. Runs pointer moves and drags through the engine with the current
//!    settings snapshot, and rewrites the event with the corrected delta and
//!    (when the cursor was warped) the filtered position.
//! 3. Forwards every other event unchanged.
//!
//! # Architecture
//!
//! The cursor is injected as a boxed [`CursorHost`] and the indicator as an
//! [`IdleIndicator`] over any [`IndicatorSink`](super::indicator::IndicatorSink),
//! so the use case runs unchanged against X11 or the in-memory mock.

use mousefilter_core::{CursorHost, EngineError, MotionEngine, MotionEvent, SmoothingState};
use thiserror::Error;
use tracing::info;

use super::indicator::IdleIndicator;
use crate::infrastructure::input_capture::{Key, RawInputEvent};
use crate::infrastructure::settings::SettingsStore;

/// Error type for the filter-input use case.
#[derive(Debug, Error)]
pub enum FilterInputError {
    /// The engine rejected the motion event; it should be dropped.
    #[error("engine rejected event: {0}")]
    Engine(#[from] EngineError),
}

/// What the caller should do with an event after filtering.
#[derive(Debug, Clone, PartialEq)]
pub enum Disposition {
    /// Deliver this event (possibly rewritten) to the rest of the system.
    Forward(RawInputEvent),
    /// The event was handled here and must not be delivered.
    Consumed,
}

/// The Filter Input use case.
pub struct FilterInputUseCase {
    engine: MotionEngine,
    cursor: Box<dyn CursorHost + Send>,
    settings: SettingsStore,
    hotkey: Key,
    hotkey_held: bool,
    indicator: Option<IdleIndicator>,
}

impl FilterInputUseCase {
    /// Creates a new use case with smoothing disabled.
    pub fn new(
        cursor: Box<dyn CursorHost + Send>,
        settings: SettingsStore,
        hotkey: Key,
        indicator: Option<IdleIndicator>,
    ) -> Self {
        Self {
            engine: MotionEngine::new(),
            cursor,
            settings,
            hotkey,
            hotkey_held: false,
            indicator,
        }
    }

    /// Returns whether smoothing is currently enabled.
    pub fn is_enabled(&self) -> bool {
        self.engine.is_enabled()
    }

    /// Read access to the engine, for diagnostics and tests.
    pub fn engine(&self) -> &MotionEngine {
        &self.engine
    }

    /// Enables or disables smoothing.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.engine.set_enabled(enabled, self.cursor.as_mut());
        if !enabled {
            self.cancel_indicator();
        }
    }

    /// Handles a raw input event from the capture service.
    ///
    /// # Errors
    ///
    /// Returns [`FilterInputError::Engine`] if a motion event arrives out of
    /// order.  Engine state is unchanged and the event should be dropped.
    pub fn handle(&mut self, event: RawInputEvent) -> Result<Disposition, FilterInputError> {
        match event {
            RawInputEvent::KeyDown {
                key, autorepeat, ..
            } if key == self.hotkey => {
                if !autorepeat && !self.hotkey_held {
                    self.toggle();
                }
                self.hotkey_held = true;
                Ok(Disposition::Consumed)
            }
            RawInputEvent::KeyUp { key, .. } if key == self.hotkey => {
                self.hotkey_held = false;
                Ok(Disposition::Consumed)
            }
            _ => match event.as_motion() {
                Some(motion) => self.handle_motion(event, &motion),
                None => Ok(Disposition::Forward(event)),
            },
        }
    }

    // ── Private handlers ──────────────────────────────────────────────────────

    fn toggle(&mut self) {
        let state = self.engine.toggle_smoothing(self.cursor.as_mut());
        info!(hotkey = %self.hotkey, enabled = state == SmoothingState::Enabled, "hotkey toggled smoothing");
        if state == SmoothingState::Disabled {
            self.cancel_indicator();
        }
    }

    fn handle_motion(
        &mut self,
        event: RawInputEvent,
        motion: &MotionEvent,
    ) -> Result<Disposition, FilterInputError> {
        let config = self.settings.snapshot();
        let output = self
            .engine
            .process_event(motion, &config, self.cursor.as_mut())?;

        if self.engine.is_enabled() {
            match (config.show_indicator, output.synthesized_position) {
                (true, Some(position)) => {
                    if let Some(indicator) = self.indicator.as_mut() {
                        indicator.on_movement(position, config.sanitized().idle_timeout());
                    }
                }
                (false, _) => self.cancel_indicator(),
                _ => {}
            }
        }

        Ok(Disposition::Forward(
            event.with_motion(output.reported_position, output.corrected_delta),
        ))
    }

    fn cancel_indicator(&mut self) {
        if let Some(indicator) = self.indicator.as_mut() {
            indicator.cancel();
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::indicator::MockIndicatorSink;
    use crate::infrastructure::cursor::MockCursor;
    use crate::infrastructure::input_capture::MouseButton;
    use mousefilter_core::{DisplayBounds, FilterConfig, Point, Timestamp, Vector};
    use std::sync::Arc;

    const F12: Key = Key::Function(12);

    mockall::mock! {
        Host {}
        impl CursorHost for Host {
            fn now(&self) -> Timestamp;
            fn cursor_position(&self) -> Point;
            fn display_bounds(&self) -> DisplayBounds;
            fn warp_cursor(&mut self, to: Point);
            fn set_decoupled(&mut self, decoupled: bool);
        }
    }

    fn bounds() -> DisplayBounds {
        DisplayBounds::from_size(1920.0, 1080.0)
    }

    fn make_use_case(settings: SettingsStore) -> (FilterInputUseCase, MockCursor) {
        let cursor = MockCursor::new(Point::new(100.0, 100.0), bounds());
        let uc = FilterInputUseCase::new(Box::new(cursor.clone()), settings, F12, None);
        (uc, cursor)
    }

    fn key_down(key: Key, autorepeat: bool) -> RawInputEvent {
        RawInputEvent::KeyDown {
            key,
            autorepeat,
            timestamp: Timestamp::from_millis(1),
        }
    }

    fn key_up(key: Key) -> RawInputEvent {
        RawInputEvent::KeyUp {
            key,
            timestamp: Timestamp::from_millis(1),
        }
    }

    fn mouse_move(ms: u64, position: Point, delta: Vector) -> RawInputEvent {
        RawInputEvent::MouseMove {
            position,
            delta,
            timestamp: Timestamp::from_millis(ms),
        }
    }

    // ── Hotkey ────────────────────────────────────────────────────────────────

    #[test]
    fn test_hotkey_press_toggles_and_is_consumed() {
        // Arrange
        let (mut uc, cursor) = make_use_case(SettingsStore::default());
        assert!(!uc.is_enabled());

        // Act
        let down = uc.handle(key_down(F12, false)).unwrap();
        let up = uc.handle(key_up(F12)).unwrap();

        // Assert
        assert_eq!(down, Disposition::Consumed);
        assert_eq!(up, Disposition::Consumed);
        assert!(uc.is_enabled());
        assert_eq!(cursor.decouple_calls(), vec![true]);
    }

    #[test]
    fn test_second_hotkey_press_disables() {
        // Arrange
        let (mut uc, cursor) = make_use_case(SettingsStore::default());
        uc.set_enabled(true);

        // Act
        uc.handle(key_down(F12, false)).unwrap();
        uc.handle(key_up(F12)).unwrap();

        // Assert
        assert!(!uc.is_enabled());
        assert_eq!(cursor.decouple_calls(), vec![true, false]);
    }

    #[test]
    fn test_hotkey_autorepeat_is_consumed_without_toggling() {
        // Arrange
        let (mut uc, _) = make_use_case(SettingsStore::default());

        // Act – one physical press followed by repeats
        uc.handle(key_down(F12, false)).unwrap();
        let repeat = uc.handle(key_down(F12, true)).unwrap();
        uc.handle(key_down(F12, true)).unwrap();

        // Assert
        assert_eq!(repeat, Disposition::Consumed);
        assert!(uc.is_enabled(), "repeats must not toggle back");
    }

    #[test]
    fn test_hotkey_held_without_repeat_flag_toggles_once() {
        let (mut uc, _) = make_use_case(SettingsStore::default());

        uc.handle(key_down(F12, false)).unwrap();
        uc.handle(key_down(F12, false)).unwrap();

        assert!(uc.is_enabled());
    }

    // ── Pass-through ──────────────────────────────────────────────────────────

    #[test]
    fn test_non_motion_events_forwarded_unchanged() {
        // Arrange
        let (mut uc, cursor) = make_use_case(SettingsStore::default());
        uc.set_enabled(true);
        let events = vec![
            key_down(Key::Function(1), false),
            key_up(Key::Other(0x61)),
            RawInputEvent::MouseButtonDown {
                button: MouseButton::Left,
                position: Point::new(3.0, 4.0),
                timestamp: Timestamp::from_millis(2),
            },
            RawInputEvent::MouseWheel {
                delta: -120,
                position: Point::new(3.0, 4.0),
                timestamp: Timestamp::from_millis(3),
            },
        ];

        for event in events {
            // Act
            let disposition = uc.handle(event.clone()).unwrap();

            // Assert
            assert_eq!(disposition, Disposition::Forward(event));
        }
        assert!(cursor.warps().is_empty());
    }

    #[test]
    fn test_motion_forwarded_unchanged_when_disabled() {
        // Arrange
        let (mut uc, cursor) = make_use_case(SettingsStore::default());
        let event = mouse_move(5, Point::new(110.0, 100.0), Vector::new(10.0, 0.0));

        // Act
        let disposition = uc.handle(event.clone()).unwrap();

        // Assert
        assert_eq!(disposition, Disposition::Forward(event));
        assert!(cursor.warps().is_empty());
    }

    // ── Motion ────────────────────────────────────────────────────────────────

    #[test]
    fn test_motion_is_smoothed_and_rewritten_when_enabled() {
        // Arrange
        let (mut uc, cursor) = make_use_case(SettingsStore::default());
        uc.set_enabled(true);

        // Act
        let disposition = uc
            .handle(mouse_move(5, Point::new(110.0, 100.0), Vector::new(10.0, 0.0)))
            .unwrap();

        // Assert – the cursor lags behind and the event reports where it went
        let warps = cursor.warps();
        assert_eq!(warps.len(), 1);
        match disposition {
            Disposition::Forward(RawInputEvent::MouseMove {
                position, delta, ..
            }) => {
                assert_eq!(position, warps[0]);
                assert!(delta.dx > 0.0 && delta.dx < 10.0, "dx = {}", delta.dx);
                assert_eq!(delta.dy, 0.0);
            }
            other => panic!("expected rewritten move, got {other:?}"),
        }
        assert_eq!(uc.engine().ledger().len(), 1);
    }

    #[test]
    fn test_drag_is_smoothed_and_keeps_button() {
        // Arrange
        let (mut uc, cursor) = make_use_case(SettingsStore::default());
        uc.set_enabled(true);

        // Act
        let disposition = uc
            .handle(RawInputEvent::MouseDrag {
                button: MouseButton::Right,
                position: Point::new(100.0, 120.0),
                delta: Vector::new(0.0, 20.0),
                timestamp: Timestamp::from_millis(5),
            })
            .unwrap();

        // Assert
        assert_eq!(cursor.warps().len(), 1);
        assert!(matches!(
            disposition,
            Disposition::Forward(RawInputEvent::MouseDrag {
                button: MouseButton::Right,
                ..
            })
        ));
    }

    #[test]
    fn test_settings_change_applies_on_next_event() {
        // Arrange
        let settings = SettingsStore::default();
        let (mut uc, cursor) = make_use_case(settings.clone());
        uc.set_enabled(true);

        // Act – zero smoothing puts the filter exactly on the observed point
        settings.replace(FilterConfig::with_smoothing(0.0));
        let disposition = uc
            .handle(mouse_move(5, Point::new(110.0, 100.0), Vector::new(10.0, 0.0)))
            .unwrap();

        // Assert
        assert!(cursor.warps().is_empty());
        assert_eq!(
            disposition,
            Disposition::Forward(mouse_move(
                5,
                Point::new(110.0, 100.0),
                Vector::new(10.0, 0.0)
            ))
        );
    }

    #[test]
    fn test_out_of_order_motion_returns_engine_error() {
        // Arrange
        let (mut uc, _) = make_use_case(SettingsStore::default());
        uc.set_enabled(true);
        uc.handle(mouse_move(10, Point::new(101.0, 100.0), Vector::new(1.0, 0.0)))
            .unwrap();
        let ledger_before = uc.engine().ledger().len();

        // Act
        let result = uc.handle(mouse_move(4, Point::new(102.0, 100.0), Vector::new(1.0, 0.0)));

        // Assert
        assert!(matches!(
            result,
            Err(FilterInputError::Engine(EngineError::NonMonotonicTimestamp { .. }))
        ));
        assert_eq!(uc.engine().ledger().len(), ledger_before);
    }

    #[test]
    fn test_enable_decouples_and_warps_through_cursor_host() {
        // Arrange
        let mut host = MockHost::new();
        host.expect_cursor_position()
            .return_const(Point::new(50.0, 50.0));
        host.expect_display_bounds().return_const(bounds());
        host.expect_now().return_const(Timestamp::from_millis(7));
        host.expect_set_decoupled()
            .withf(|decoupled| *decoupled)
            .times(1)
            .return_const(());
        host.expect_warp_cursor()
            .withf(|to| to.x > 50.0 && to.x < 60.0 && (to.y - 50.0).abs() < 1e-9)
            .times(1)
            .return_const(());
        let mut uc =
            FilterInputUseCase::new(Box::new(host), SettingsStore::default(), F12, None);

        // Act
        uc.handle(key_down(F12, false)).unwrap();
        let result = uc.handle(mouse_move(5, Point::new(60.0, 50.0), Vector::new(10.0, 0.0)));

        // Assert
        tokio_test::assert_ok!(result);
        let record = uc.engine().ledger().oldest().copied().expect("warp recorded");
        assert_eq!(record.from, Point::new(60.0, 50.0));
        assert_eq!(record.time_before, Timestamp::from_millis(7));
    }

    // ── Indicator ─────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_motion_shows_indicator_at_synthesized_position() {
        // Arrange
        let mut sink = MockIndicatorSink::new();
        sink.expect_show_at()
            .withf(|p| *p == Point::new(110.0, 100.0))
            .times(1)
            .return_const(());
        sink.expect_hide().times(0..=1).return_const(());
        let indicator = IdleIndicator::new(Arc::new(sink), tokio::runtime::Handle::current());
        let cursor = MockCursor::new(Point::new(100.0, 100.0), bounds());
        let mut uc = FilterInputUseCase::new(
            Box::new(cursor),
            SettingsStore::default(),
            F12,
            Some(indicator),
        );
        uc.set_enabled(true);

        // Act
        uc.handle(mouse_move(5, Point::new(110.0, 100.0), Vector::new(10.0, 0.0)))
            .unwrap();

        // Assert – expectations are verified when the sink is dropped
        assert_eq!(
            uc.engine().state().synthesized_position(),
            Some(Point::new(110.0, 100.0))
        );
    }

    #[tokio::test]
    async fn test_indicator_hidden_when_setting_off_or_disabled() {
        // Arrange
        let mut sink = MockIndicatorSink::new();
        sink.expect_show_at().times(0);
        sink.expect_hide().times(0);
        let indicator = IdleIndicator::new(Arc::new(sink), tokio::runtime::Handle::current());
        let mut config = FilterConfig::default();
        config.show_indicator = false;
        let cursor = MockCursor::new(Point::new(100.0, 100.0), bounds());
        let mut uc = FilterInputUseCase::new(
            Box::new(cursor),
            SettingsStore::new(config),
            F12,
            Some(indicator),
        );

        // Act – disabled motion, then enabled motion with the marker switched off
        uc.handle(mouse_move(5, Point::new(110.0, 100.0), Vector::new(10.0, 0.0)))
            .unwrap();
        uc.set_enabled(true);
        uc.handle(mouse_move(9, Point::new(120.0, 100.0), Vector::new(10.0, 0.0)))
            .unwrap();

        // Assert
        assert!(uc.is_enabled());
    }

    #[tokio::test]
    async fn test_disabling_hides_visible_indicator() {
        // Arrange
        let mut sink = MockIndicatorSink::new();
        sink.expect_show_at().times(1).return_const(());
        sink.expect_hide().times(1).return_const(());
        let indicator = IdleIndicator::new(Arc::new(sink), tokio::runtime::Handle::current());
        let cursor = MockCursor::new(Point::new(100.0, 100.0), bounds());
        let mut uc = FilterInputUseCase::new(
            Box::new(cursor),
            SettingsStore::default(),
            F12,
            Some(indicator),
        );
        uc.set_enabled(true);
        uc.handle(mouse_move(5, Point::new(110.0, 100.0), Vector::new(10.0, 0.0)))
            .unwrap();

        // Act
        uc.handle(key_down(F12, false)).unwrap();

        // Assert
        assert!(!uc.is_enabled());
    }
}
