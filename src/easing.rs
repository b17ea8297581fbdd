//! CSS-like transition timing for reflow animations.
//!
//! Tiles glide into their new cells with `transform <duration>ms ease`.
//! [`Easing`] evaluates the timing curve and [`Tween`] interpolates a box
//! between two positions; hosts that have no native CSS transitions (the
//! GTK host, the in-memory host) drive their animation through these.

use crate::layout::Rect;
use std::time::Duration;

/// A timing function over normalised time `u ∈ [0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Easing {
    Linear,
    /// CSS `ease`, i.e. `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
    Ease,
    /// CSS `cubic-bezier(x1, y1, x2, y2)`.
    CubicBezier { x1: f64, y1: f64, x2: f64, y2: f64 },
}

impl Easing {
    /// Eased progress for normalised time `u` (clamped to `[0, 1]`).
    pub fn apply(&self, u: f64) -> f64 {
        let u = u.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => u,
            Easing::Ease => cubic_bezier(u, 0.25, 0.10, 0.25, 1.00),
            Easing::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(u, x1, y1, x2, y2),
        }
    }
}

/// Evaluate a cubic Bézier timing curve with endpoints `(0,0)` and `(1,1)`.
///
/// Solves `x(t) = u` for `t` (Newton first, bisection if that diverges)
/// and returns `y(t)`.
fn cubic_bezier(u: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    // Polynomial coefficients, B(t) = ((a*t + b)*t + c)*t.
    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;
    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    let sample = |a: f64, b: f64, c: f64, t: f64| ((a * t + b) * t + c) * t;

    let mut t = u;
    let mut solved = false;
    for _ in 0..8 {
        let x = sample(ax, bx, cx, t) - u;
        if x.abs() < 1e-7 {
            solved = true;
            break;
        }
        let dx = (3.0 * ax * t + 2.0 * bx) * t + cx;
        if dx.abs() < 1e-7 {
            break;
        }
        t -= x / dx;
        if !(0.0..=1.0).contains(&t) {
            break;
        }
    }

    if !solved {
        let (mut lo, mut hi) = (0.0, 1.0);
        t = u;
        for _ in 0..32 {
            let x = sample(ax, bx, cx, t);
            if (x - u).abs() < 1e-7 {
                break;
            }
            if x < u {
                lo = t;
            } else {
                hi = t;
            }
            t = 0.5 * (lo + hi);
        }
    }

    sample(ay, by, cy, t)
}

/// A transition applied to a tile's transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub duration: Duration,
    pub easing: Easing,
}

impl Transition {
    /// `transform <ms>ms ease`.
    pub fn ease_ms(ms: u64) -> Self {
        Self {
            duration: Duration::from_millis(ms),
            easing: Easing::Ease,
        }
    }

    /// The CSS declaration this transition corresponds to.
    pub fn to_css(&self) -> String {
        let timing = match self.easing {
            Easing::Linear => "linear".to_string(),
            Easing::Ease => "ease".to_string(),
            Easing::CubicBezier { x1, y1, x2, y2 } => {
                format!("cubic-bezier({}, {}, {}, {})", x1, y1, x2, y2)
            }
        };
        format!("transform {}ms {} 0s", self.duration.as_millis(), timing)
    }
}

/// Interpolation of a box from `from` to `to` over a [`Transition`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    pub from: Rect,
    pub to: Rect,
    pub transition: Transition,
}

impl Tween {
    /// Box after `elapsed` time.  Zero-length transitions jump immediately.
    pub fn at(&self, elapsed: Duration) -> Rect {
        if self.is_done(elapsed) {
            return self.to;
        }
        let total = self.transition.duration.as_secs_f64();
        let p = self.transition.easing.apply(elapsed.as_secs_f64() / total);
        let lerp = |a: f64, b: f64| a + (b - a) * p;
        Rect::new(
            lerp(self.from.x, self.to.x),
            lerp(self.from.y, self.to.y),
            lerp(self.from.width, self.to.width),
            lerp(self.from.height, self.to.height),
        )
    }

    pub fn is_done(&self, elapsed: Duration) -> bool {
        elapsed >= self.transition.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_fixed() {
        for easing in [Easing::Linear, Easing::Ease] {
            assert!(easing.apply(0.0).abs() < 1e-6);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn ease_is_monotonic_and_front_loaded() {
        let mut prev = 0.0;
        for i in 1..=20 {
            let v = Easing::Ease.apply(i as f64 / 20.0);
            assert!(v >= prev - 1e-9, "not monotonic at {}", i);
            prev = v;
        }
        // CSS `ease` is already ~80% done at half time.
        assert!(Easing::Ease.apply(0.5) > 0.75);
    }

    #[test]
    fn linear_bezier_matches_identity() {
        let e = Easing::CubicBezier {
            x1: 0.0,
            y1: 0.0,
            x2: 1.0,
            y2: 1.0,
        };
        for i in 0..=10 {
            let u = i as f64 / 10.0;
            assert!((e.apply(u) - u).abs() < 1e-4);
        }
    }

    #[test]
    fn out_of_range_time_is_clamped() {
        assert_eq!(Easing::Linear.apply(-1.0), 0.0);
        assert_eq!(Easing::Linear.apply(3.0), 1.0);
    }

    #[test]
    fn tween_interpolates_and_finishes() {
        let tween = Tween {
            from: Rect::new(0.0, 0.0, 100.0, 100.0),
            to: Rect::new(110.0, 0.0, 100.0, 100.0),
            transition: Transition {
                duration: Duration::from_millis(200),
                easing: Easing::Linear,
            },
        };
        assert_eq!(tween.at(Duration::from_millis(100)).x, 55.0);
        assert_eq!(tween.at(Duration::from_millis(400)), tween.to);
        assert!(tween.is_done(Duration::from_millis(200)));
        assert!(!tween.is_done(Duration::from_millis(199)));
    }

    #[test]
    fn zero_duration_jumps() {
        let tween = Tween {
            from: Rect::default(),
            to: Rect::new(5.0, 5.0, 1.0, 1.0),
            transition: Transition::ease_ms(0),
        };
        assert_eq!(tween.at(Duration::ZERO), tween.to);
    }

    #[test]
    fn css_declaration() {
        assert_eq!(Transition::ease_ms(200).to_css(), "transform 200ms ease 0s");
    }
}
