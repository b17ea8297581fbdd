//! Mouse-shake detection.
//!
//! A frequency/distance heuristic over the raw pointer stream:
//!
//! 1. Accumulate the travelled distance over consecutive move samples.
//! 2. Once more than [`ShakeConfig::max_sample_count`] samples have been
//!    collected, look at how long that took.
//!    - Longer than [`ShakeConfig::max_sample_window_ms`]: the pointer is
//!      merely moving, start over.
//!    - Within the window: the pointer is shaking if the accumulated
//!      distance exceeds [`ShakeConfig::max_distance_in_window`].
//! 3. Pointer-up clears everything.
//!
//! The detector is independent of the drag engine; hosts feed it the same
//! events and poll [`ShakeDetector::is_shaking`].

use crate::event::{Point, PointerEvent};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Tuning knobs for shake detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShakeConfig {
    /// Move samples collected before a decision is made.  Default: `300`.
    pub max_sample_count: u32,
    /// Time budget for collecting those samples (ms).  Default: `2000`.
    pub max_sample_window_ms: u64,
    /// Distance (px) that must be exceeded within the window.  Default: `1000.0`.
    pub max_distance_in_window: f64,
}

impl Default for ShakeConfig {
    fn default() -> Self {
        Self {
            max_sample_count: 300,
            max_sample_window_ms: 2000,
            max_distance_in_window: 1000.0,
        }
    }
}

/// Accumulator state of the detector.
#[derive(Debug)]
pub struct ShakeDetector {
    config: ShakeConfig,
    last: Option<Point>,
    window_start: Option<Instant>,
    samples: u32,
    distance: f64,
    shaking: bool,
}

impl ShakeDetector {
    pub fn new(config: ShakeConfig) -> Self {
        Self {
            config,
            last: None,
            window_start: None,
            samples: 0,
            distance: 0.0,
            shaking: false,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ShakeConfig::default())
    }

    pub fn is_shaking(&self) -> bool {
        self.shaking
    }

    /// Distance accumulated in the current window.
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Feed any pointer event.  Returns [`is_shaking`](Self::is_shaking)
    /// afterwards.
    pub fn handle(&mut self, event: &PointerEvent, now: Instant) -> bool {
        match event {
            PointerEvent::Move(p) => self.on_move(*p, now),
            PointerEvent::Up(_) | PointerEvent::Cancel => {
                self.on_idle();
                false
            }
            PointerEvent::Down(_) => self.shaking,
        }
    }

    /// Record a move sample taken at `now`.
    pub fn on_move(&mut self, point: Point, now: Instant) -> bool {
        if self.samples > self.config.max_sample_count {
            let start = self.window_start.unwrap_or(now);
            let elapsed = now.saturating_duration_since(start);
            if elapsed > Duration::from_millis(self.config.max_sample_window_ms) {
                debug!("shake window too slow ({} ms), restarting", elapsed.as_millis());
                self.set_shaking(false);
            } else {
                self.decide();
            }
            self.reset_window();
            return self.shaking;
        }

        match self.last {
            None => {
                self.last = Some(point);
                self.window_start = Some(now);
                self.distance = 0.0;
                self.samples = 0;
            }
            Some(last) => {
                self.distance += point.distance_to(last);
                self.last = Some(point);
                self.samples += 1;
            }
        }
        self.shaking
    }

    /// The pointer went idle (button released): drop the accumulator.
    pub fn on_idle(&mut self) {
        self.reset_window();
        self.set_shaking(false);
    }

    fn decide(&mut self) {
        debug!(
            "{} samples covered {:.0}px",
            self.samples, self.distance
        );
        let shaking = self.distance > self.config.max_distance_in_window;
        self.set_shaking(shaking);
    }

    fn set_shaking(&mut self, shaking: bool) {
        if shaking != self.shaking {
            if shaking {
                info!("mouse shaking");
            } else {
                info!("mouse shaking stopped");
            }
        }
        self.shaking = shaking;
    }

    fn reset_window(&mut self) {
        self.last = None;
        self.window_start = None;
        self.samples = 0;
        self.distance = 0.0;
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ShakeConfig {
        ShakeConfig {
            max_sample_count: 10,
            max_sample_window_ms: 100,
            max_distance_in_window: 500.0,
        }
    }

    /// Zig-zag `n` samples of `step` px, `dt_ms` apart.  Returns the final time.
    fn zigzag(d: &mut ShakeDetector, t0: Instant, n: u32, step: f64, dt_ms: u64) -> Instant {
        let mut t = t0;
        for i in 0..n {
            let x = if i % 2 == 0 { 0.0 } else { step };
            t = t0 + Duration::from_millis(dt_ms * i as u64);
            d.on_move(Point::new(x, 0.0), t);
        }
        t
    }

    #[test]
    fn default_config_values() {
        let cfg = ShakeConfig::default();
        assert_eq!(cfg.max_sample_count, 300);
        assert_eq!(cfg.max_sample_window_ms, 2000);
        assert_eq!(cfg.max_distance_in_window, 1000.0);
    }

    #[test]
    fn fast_wide_zigzag_is_a_shake() {
        let mut d = ShakeDetector::new(small_config());
        let t0 = Instant::now();
        // One anchor plus 11 samples exceeds the cap of 10; the next move decides.
        let t = zigzag(&mut d, t0, 12, 100.0, 5);
        assert!(!d.is_shaking());
        assert!(d.on_move(Point::new(0.0, 0.0), t + Duration::from_millis(5)));
    }

    #[test]
    fn slow_movement_is_not_a_shake() {
        let mut d = ShakeDetector::new(small_config());
        let t0 = Instant::now();
        let t = zigzag(&mut d, t0, 12, 100.0, 50);
        assert!(!d.on_move(Point::new(0.0, 0.0), t + Duration::from_millis(50)));
        assert_eq!(d.distance(), 0.0);
    }

    #[test]
    fn short_fast_jitter_is_not_a_shake() {
        let mut d = ShakeDetector::new(small_config());
        let t0 = Instant::now();
        let t = zigzag(&mut d, t0, 12, 2.0, 1);
        assert!(!d.on_move(Point::new(0.0, 0.0), t + Duration::from_millis(1)));
    }

    #[test]
    fn pointer_up_resets_everything() {
        let mut d = ShakeDetector::new(small_config());
        let t0 = Instant::now();
        let t = zigzag(&mut d, t0, 12, 100.0, 5);
        d.on_move(Point::new(0.0, 0.0), t + Duration::from_millis(5));
        assert!(d.is_shaking());
        assert!(!d.handle(&PointerEvent::Up(Point::default()), t));
        assert!(!d.is_shaking());
        assert_eq!(d.distance(), 0.0);
    }

    #[test]
    fn accumulates_distance_between_samples() {
        let mut d = ShakeDetector::with_defaults();
        let t0 = Instant::now();
        d.on_move(Point::new(0.0, 0.0), t0);
        d.on_move(Point::new(3.0, 4.0), t0);
        d.on_move(Point::new(3.0, 14.0), t0);
        assert_eq!(d.distance(), 15.0);
    }
}
