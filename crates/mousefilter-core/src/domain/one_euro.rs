//! One Euro filter: a speed-adaptive low-pass filter for a single axis.
//!
//! Casiez, Roussel & Vogel (CHI 2012).  The cutoff frequency rises with the
//! (filtered) speed of the signal, so slow movements are smoothed heavily
//! while fast movements pass with little lag.
//!
//! This is an alternative to the rubber-band filter in
//! [`super::smoothing`]; it operates on scalar samples and is usually run
//! once per axis (see [`OneEuroFilter2D`]).

use std::f64::consts::PI;

use super::geometry::Point;
use super::timestamp::Timestamp;

/// Exponential smoother with a per-sample alpha.
#[derive(Debug, Clone, Default)]
struct LowPass {
    last: Option<f64>,
}

impl LowPass {
    fn filter(&mut self, value: f64, alpha: f64) -> f64 {
        let out = match self.last {
            Some(prev) => alpha * value + (1.0 - alpha) * prev,
            None => value,
        };
        self.last = Some(out);
        out
    }

    fn last(&self) -> Option<f64> {
        self.last
    }
}

/// Single-axis One Euro filter.
#[derive(Debug, Clone)]
pub struct OneEuroFilter {
    /// Assumed sample rate (Hz); replaced by the measured rate once two
    /// timestamped samples have been seen.
    freq: f64,
    min_cutoff: f64,
    beta: f64,
    d_cutoff: f64,
    x: LowPass,
    dx: LowPass,
    last_time: Option<Timestamp>,
}

impl OneEuroFilter {
    /// Creates a filter.
    ///
    /// Non-positive `freq`, `min_cutoff` or `d_cutoff` would make the alpha
    /// computation divide by zero; they are replaced by `1.0`.
    pub fn new(freq: f64, min_cutoff: f64, beta: f64, d_cutoff: f64) -> Self {
        let positive = |v: f64| if v.is_finite() && v > 0.0 { v } else { 1.0 };
        Self {
            freq: positive(freq),
            min_cutoff: positive(min_cutoff),
            beta: if beta.is_finite() { beta } else { 0.0 },
            d_cutoff: positive(d_cutoff),
            x: LowPass::default(),
            dx: LowPass::default(),
            last_time: None,
        }
    }

    fn alpha(&self, cutoff: f64) -> f64 {
        let te = 1.0 / self.freq;
        let tau = 1.0 / (2.0 * PI * cutoff);
        1.0 / (1.0 + tau / te)
    }

    /// Filters one sample taken at `time`.
    pub fn filter(&mut self, value: f64, time: Timestamp) -> f64 {
        if let Some(last) = self.last_time {
            if time > last {
                self.freq = 1.0 / time.saturating_since(last).as_secs_f64();
            }
        }
        self.last_time = Some(time);

        let speed = match self.x.last() {
            Some(prev) => (value - prev) * self.freq,
            None => 0.0,
        };
        let smoothed_speed = self.dx.filter(speed, self.alpha(self.d_cutoff));
        let cutoff = self.min_cutoff + self.beta * smoothed_speed.abs();
        self.x.filter(value, self.alpha(cutoff))
    }

    /// Last filtered value, if any.
    pub fn last_value(&self) -> Option<f64> {
        self.x.last()
    }

    /// Forgets all history.
    pub fn reset(&mut self) {
        self.x = LowPass::default();
        self.dx = LowPass::default();
        self.last_time = None;
    }
}

impl Default for OneEuroFilter {
    fn default() -> Self {
        Self::new(120.0, 1.0, 0.0, 1.0)
    }
}

/// Two independent [`OneEuroFilter`]s, one per axis.
#[derive(Debug, Clone, Default)]
pub struct OneEuroFilter2D {
    x: OneEuroFilter,
    y: OneEuroFilter,
}

impl OneEuroFilter2D {
    /// Creates a filter pair sharing the same parameters.
    pub fn new(freq: f64, min_cutoff: f64, beta: f64, d_cutoff: f64) -> Self {
        Self {
            x: OneEuroFilter::new(freq, min_cutoff, beta, d_cutoff),
            y: OneEuroFilter::new(freq, min_cutoff, beta, d_cutoff),
        }
    }

    /// Filters one position sample.
    pub fn filter(&mut self, point: Point, time: Timestamp) -> Point {
        Point::new(self.x.filter(point.x, time), self.y.filter(point.y, time))
    }

    /// Forgets all history.
    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    /// 120 Hz sample times.
    fn t(i: u64) -> Timestamp {
        Timestamp::from_nanos(i * 8_333_333)
    }

    #[test]
    fn test_first_sample_passes_through() {
        let mut f = OneEuroFilter::default();
        assert_eq!(f.filter(42.0, t(0)), 42.0);
        assert_eq!(f.last_value(), Some(42.0));
    }

    #[test]
    fn test_constant_input_converges() {
        // Arrange
        let mut f = OneEuroFilter::new(120.0, 1.0, 0.1, 1.0);
        f.filter(0.0, t(0));

        // Act
        let mut out = 0.0;
        for i in 1..600 {
            out = f.filter(10.0, t(i));
        }

        // Assert
        assert!((out - 10.0).abs() < 1e-3, "got {out}");
    }

    #[test]
    fn test_output_stays_between_previous_and_input() {
        let mut f = OneEuroFilter::default();
        f.filter(0.0, t(0));
        let out = f.filter(100.0, t(1));
        assert!(out > 0.0 && out < 100.0);
    }

    #[test]
    fn test_speed_coefficient_reduces_lag_on_fast_motion() {
        // Arrange – same ramp through a filter with and without beta
        let mut slow = OneEuroFilter::new(120.0, 1.0, 0.0, 1.0);
        let mut adaptive = OneEuroFilter::new(120.0, 1.0, 0.05, 1.0);

        // Act
        let mut lag_slow = 0.0;
        let mut lag_adaptive = 0.0;
        for i in 0..60 {
            let value = i as f64 * 20.0;
            lag_slow = value - slow.filter(value, t(i));
            lag_adaptive = value - adaptive.filter(value, t(i));
        }

        // Assert
        assert!(lag_adaptive < lag_slow, "{lag_adaptive} vs {lag_slow}");
    }

    #[test]
    fn test_reset_forgets_history() {
        let mut f = OneEuroFilter::default();
        f.filter(5.0, t(0));
        f.filter(6.0, t(1));

        f.reset();

        assert_eq!(f.last_value(), None);
        assert_eq!(f.filter(-3.0, t(2)), -3.0);
    }

    #[test]
    fn test_invalid_parameters_are_replaced() {
        let mut f = OneEuroFilter::new(0.0, -1.0, f64::NAN, 0.0);
        f.filter(1.0, t(0));
        assert!(f.filter(2.0, t(1)).is_finite());
    }

    #[test]
    fn test_2d_filter_runs_axes_independently() {
        let mut f = OneEuroFilter2D::new(120.0, 1.0, 0.0, 1.0);
        f.filter(Point::new(0.0, 50.0), t(0));
        let p = f.filter(Point::new(10.0, 50.0), t(1));
        assert!(p.x > 0.0 && p.x < 10.0);
        assert!((p.y - 50.0).abs() < 1e-9);
    }
}
