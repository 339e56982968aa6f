//! Adaptive smoothing filter and its configuration.
//!
//! The filter is a single-pole low-pass on the synthesized position:
//!
//! ```text
//! filtered' = w · filtered + (1 − w) · synthesized
//! ```
//!
//! where `w` is the *retention* weight of the previous filtered position.
//!
//! # Choosing `w`
//!
//! The user-facing `smoothing` value `a` is mapped through a cubic so that the
//! upper end of the slider has more resolution:
//!
//! ```text
//! w_base = 1 − (1 − a)³
//! ```
//!
//! Rubber-banding then attenuates the weight by up to 10% depending on how far
//! the filtered position trails the synthesized one, relative to the
//! rubber-band radius `r`:
//!
//! ```text
//! w = w_base · (1 − 0.1 · exp(−1 / (d / r)²))
//! ```
//!
//! When the two positions coincide the exponential vanishes and `w = w_base`
//! (maximum damping, small jitter is absorbed).  As the gap grows past `r` the
//! weight drops toward `0.9 · w_base` and the filtered position is pulled back
//! toward the synthesized one more aggressively.

use std::time::Duration;

use super::geometry::Point;

/// Default smoothing strength.
pub const DEFAULT_SMOOTHING: f64 = 0.75;

/// Largest accepted smoothing value.  At 1.0 the retention weight is exactly
/// one and the filtered position would never move again.
pub const MAX_SMOOTHING: f64 = 0.99;

/// Maximum fractional attenuation applied by rubber-banding.
const RUBBERBAND_ATTENUATION: f64 = 0.1;

/// Tunable constants used to derive time and distance scales from `smoothing`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TuningPolicy {
    /// Minimum idle span after which the synthesized position snaps back to
    /// the real cursor.
    pub idle_floor: Duration,
    /// Rubber-band radius per unit of smoothing, in pixels.
    pub radius_per_unit: f64,
}

impl Default for TuningPolicy {
    fn default() -> Self {
        Self {
            idle_floor: Duration::from_millis(200),
            radius_per_unit: 800.0,
        }
    }
}

/// Configuration snapshot consumed by the engine on every event.
///
/// The host reads this fresh from its settings store for each event; the
/// engine never caches it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterConfig {
    /// Steepness of the low-pass response.
    pub smoothing: f64,
    /// Whether the presentational indicator follows the synthesized position.
    pub show_indicator: bool,
    /// Constants for the derived scales.
    pub policy: TuningPolicy,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            smoothing: DEFAULT_SMOOTHING,
            show_indicator: true,
            policy: TuningPolicy::default(),
        }
    }
}

impl FilterConfig {
    /// Creates a config with the given smoothing and default policy.
    pub fn with_smoothing(smoothing: f64) -> Self {
        Self {
            smoothing,
            ..Self::default()
        }
    }

    /// Returns a copy with every field forced into its valid range.
    ///
    /// A real-time input path must never fail a tick, so out-of-range values
    /// are clamped rather than reported.
    pub fn sanitized(&self) -> Self {
        let smoothing = if self.smoothing.is_finite() {
            self.smoothing.clamp(0.0, MAX_SMOOTHING)
        } else {
            DEFAULT_SMOOTHING
        };
        let radius_per_unit =
            if self.policy.radius_per_unit.is_finite() && self.policy.radius_per_unit > 0.0 {
                self.policy.radius_per_unit
            } else {
                TuningPolicy::default().radius_per_unit
            };
        Self {
            smoothing,
            show_indicator: self.show_indicator,
            policy: TuningPolicy {
                idle_floor: self.policy.idle_floor,
                radius_per_unit,
            },
        }
    }

    /// Span of event-time silence after which the synthesized position
    /// snaps back to the observed cursor position.
    pub fn idle_timeout(&self) -> Duration {
        let from_smoothing = Duration::from_secs_f64((self.smoothing - 0.5).max(0.0));
        from_smoothing.max(self.policy.idle_floor)
    }

    /// Distance scale of the rubber-band attenuation.
    ///
    /// Never returns zero so the weight formula stays finite.
    pub fn rubberband_radius(&self) -> f64 {
        (self.policy.radius_per_unit * self.smoothing).max(f64::EPSILON)
    }

    /// Retention weight before rubber-banding.
    pub fn base_weight(&self) -> f64 {
        1.0 - (1.0 - self.smoothing).powi(3)
    }
}

/// Retention weight for a filtered/synthesized gap of `distance` pixels.
pub fn retention_weight(distance: f64, config: &FilterConfig) -> f64 {
    let base = config.base_weight();
    let ratio = distance / config.rubberband_radius();
    // ratio == 0 yields exp(-inf) == 0, which is exactly the limit we want.
    let attenuation = RUBBERBAND_ATTENUATION * (-1.0 / (ratio * ratio)).exp();
    base * (1.0 - attenuation)
}

/// Blends the synthesized position into the filtered one.
///
/// With no previous filtered position the synthesized position is taken
/// as-is.  [`MotionEngine`](crate::MotionEngine) seeds its filtered position
/// on enable and never passes `None`; only direct callers reach that case.
pub fn blend(filtered: Option<Point>, synthesized: Point, config: &FilterConfig) -> Point {
    let Some(filtered) = filtered else {
        return synthesized;
    };
    let w = retention_weight(filtered.distance_to(synthesized), config);
    Point::new(
        w * filtered.x + (1.0 - w) * synthesized.x,
        w * filtered.y + (1.0 - w) * synthesized.y,
    )
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_base_weight_for_default_smoothing() {
        let cfg = FilterConfig::with_smoothing(0.75);
        // 1 - 0.25^3 = 0.984375
        assert!((cfg.base_weight() - 0.984375).abs() < EPS);
    }

    #[test]
    fn test_weight_at_zero_distance_equals_base_weight() {
        // Arrange
        let cfg = FilterConfig::with_smoothing(0.75);

        // Act
        let w = retention_weight(0.0, &cfg);

        // Assert
        assert!((w - cfg.base_weight()).abs() < EPS);
    }

    #[test]
    fn test_weight_at_ten_radii_is_close_to_ninety_percent_of_base() {
        // Arrange
        let cfg = FilterConfig::with_smoothing(0.75);
        let r = cfg.rubberband_radius();

        // Act
        let w = retention_weight(10.0 * r, &cfg);

        // Assert – w_base · (1 − 0.1·e^(−0.01))
        let expected = cfg.base_weight() * (1.0 - 0.1 * (-0.01f64).exp());
        assert!((w - expected).abs() < EPS);
        assert!((w / (0.9 * cfg.base_weight()) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_weight_decreases_monotonically_with_distance() {
        let cfg = FilterConfig::default();
        let mut previous = retention_weight(0.0, &cfg);
        for step in 1..50 {
            let w = retention_weight(step as f64 * 50.0, &cfg);
            assert!(w <= previous, "weight must not grow with distance");
            assert!(w >= 0.9 * cfg.base_weight() - EPS);
            previous = w;
        }
    }

    #[test]
    fn test_blend_without_previous_returns_synthesized() {
        let p = Point::new(12.5, 40.0);
        assert_eq!(blend(None, p, &FilterConfig::default()), p);
    }

    #[test]
    fn test_blend_moves_toward_synthesized_by_one_minus_weight() {
        // Arrange
        let cfg = FilterConfig::with_smoothing(0.5);
        let filtered = Point::new(0.0, 0.0);
        let synthesized = Point::new(100.0, 0.0);
        let w = retention_weight(100.0, &cfg);

        // Act
        let out = blend(Some(filtered), synthesized, &cfg);

        // Assert
        assert!((out.x - (1.0 - w) * 100.0).abs() < EPS);
        assert_eq!(out.y, 0.0);
        assert!(out.x > 0.0 && out.x < 100.0);
    }

    #[test]
    fn test_zero_smoothing_tracks_synthesized_exactly() {
        let cfg = FilterConfig::with_smoothing(0.0).sanitized();
        let out = blend(Some(Point::new(0.0, 0.0)), Point::new(7.0, 9.0), &cfg);
        assert_eq!(out, Point::new(7.0, 9.0));
    }

    #[test]
    fn test_sanitized_clamps_out_of_range_smoothing() {
        assert_eq!(FilterConfig::with_smoothing(1.7).sanitized().smoothing, MAX_SMOOTHING);
        assert_eq!(FilterConfig::with_smoothing(-0.2).sanitized().smoothing, 0.0);
        assert_eq!(
            FilterConfig::with_smoothing(f64::NAN).sanitized().smoothing,
            DEFAULT_SMOOTHING
        );
    }

    #[test]
    fn test_sanitized_replaces_invalid_radius_scale() {
        let mut cfg = FilterConfig::default();
        cfg.policy.radius_per_unit = -3.0;
        assert_eq!(
            cfg.sanitized().policy.radius_per_unit,
            TuningPolicy::default().radius_per_unit
        );
    }

    #[test]
    fn test_idle_timeout_derivation() {
        // 0.75 - 0.5 = 250 ms, above the 200 ms floor
        assert_eq!(
            FilterConfig::with_smoothing(0.75).idle_timeout(),
            Duration::from_millis(250)
        );
        // 0.6 - 0.5 = 100 ms, floor wins
        assert_eq!(
            FilterConfig::with_smoothing(0.6).idle_timeout(),
            Duration::from_millis(200)
        );
    }

    #[test]
    fn test_rubberband_radius_matches_legacy_default() {
        // 800 px/unit × 0.75 = 600 px, same as 2000 − 1400
        assert!((FilterConfig::default().rubberband_radius() - 600.0).abs() < EPS);
    }

    #[test]
    fn test_rubberband_radius_never_zero() {
        let cfg = FilterConfig::with_smoothing(0.0);
        assert!(cfg.rubberband_radius() > 0.0);
        assert!(retention_weight(0.0, &cfg).is_finite());
    }
}
