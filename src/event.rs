//! Pointer events and the supporting geometry shared by every component.
//!
//! [`PointerEvent`] is the only input the drag engine understands.  Hosts
//! (a GTK window, the in-memory host, a Unix socket) translate whatever
//! their platform delivers into this vocabulary.
//!
//! A [`Point`] on the wire accepts either `{"x": 10, "y": 20}` or the
//! shorthand string `"10 20"`.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A position in client (viewport) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    pub fn delta_from(self, other: Point) -> (f64, f64) {
        (self.x - other.x, self.y - other.y)
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(self, other: Point) -> f64 {
        let (dx, dy) = self.delta_from(other);
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::Visitor;
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = Point;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "object {{x, y}} or string \"x y\"")
            }
            fn visit_map<A>(self, mut map: A) -> Result<Point, A::Error>
            where
                A: serde::de::MapAccess<'de>,
            {
                let mut x = None;
                let mut y = None;
                while let Some(k) = map.next_key::<String>()? {
                    match k.as_str() {
                        "x" => x = Some(map.next_value()?),
                        "y" => y = Some(map.next_value()?),
                        _ => {
                            let _: serde::de::IgnoredAny = map.next_value()?;
                        }
                    }
                }
                Ok(Point {
                    x: x.ok_or_else(|| DeError::missing_field("x"))?,
                    y: y.ok_or_else(|| DeError::missing_field("y"))?,
                })
            }
            fn visit_str<E>(self, s: &str) -> Result<Point, E>
            where
                E: DeError,
            {
                let parts: Vec<&str> = s.split_whitespace().collect();
                if parts.len() != 2 {
                    return Err(DeError::custom(format!("point: expected \"x y\", got {:?}", s)));
                }
                let x: f64 = parts[0]
                    .parse()
                    .map_err(|_| DeError::custom("point: x must be a number"))?;
                let y: f64 = parts[1]
                    .parse()
                    .map_err(|_| DeError::custom("point: y must be a number"))?;
                if !Point::new(x, y).is_finite() {
                    return Err(DeError::custom(format!("point: {:?} is not finite", s)));
                }
                Ok(Point { x, y })
            }
        }
        deserializer.deserialize_any(V)
    }
}

/// The pointer listeners a host can attach on its global event target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointerKind {
    Down,
    Move,
    Up,
    Cancel,
}

impl PointerKind {
    /// Every kind the drag engine listens for.
    pub const ALL: [PointerKind; 4] = [
        PointerKind::Down,
        PointerKind::Move,
        PointerKind::Up,
        PointerKind::Cancel,
    ];
}

impl fmt::Display for PointerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointerKind::Down => write!(f, "pointerdown"),
            PointerKind::Move => write!(f, "pointermove"),
            PointerKind::Up => write!(f, "pointerup"),
            PointerKind::Cancel => write!(f, "pointercancel"),
        }
    }
}

/// A single pointer event in client coordinates.
///
/// # Wire format
///
/// ```json
/// {"Down":{"x":40,"y":40}}
/// {"Move":"150 40"}
/// {"Up":{"x":150,"y":40}}
/// "Cancel"
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PointerEvent {
    /// Primary button pressed.
    Down(Point),
    /// Pointer moved (button state is irrelevant to the engine).
    Move(Point),
    /// Primary button released.
    Up(Point),
    /// The platform took the pointer away (`pointercancel`).
    Cancel,
}

impl PointerEvent {
    pub fn kind(&self) -> PointerKind {
        match self {
            PointerEvent::Down(_) => PointerKind::Down,
            PointerEvent::Move(_) => PointerKind::Move,
            PointerEvent::Up(_) => PointerKind::Up,
            PointerEvent::Cancel => PointerKind::Cancel,
        }
    }

    /// The event position, if it carries one.
    pub fn point(&self) -> Option<Point> {
        match self {
            PointerEvent::Down(p) | PointerEvent::Move(p) | PointerEvent::Up(p) => Some(*p),
            PointerEvent::Cancel => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_point_object_and_string() {
        let a: Point = serde_json::from_str(r#"{"x": 1.5, "y": -2}"#).unwrap();
        assert_eq!(a, Point::new(1.5, -2.0));
        let b: Point = serde_json::from_str(r#""  30   40 ""#).unwrap();
        assert_eq!(b, Point::new(30.0, 40.0));
    }

    #[test]
    fn deserialize_point_rejects_garbage() {
        assert!(serde_json::from_str::<Point>(r#""1 2 3""#).is_err());
        assert!(serde_json::from_str::<Point>(r#""a b""#).is_err());
        assert!(serde_json::from_str::<Point>(r#"{"x": 1}"#).is_err());
    }

    #[test]
    fn deserialize_point_rejects_non_finite() {
        assert!(serde_json::from_str::<Point>(r#""NaN 50""#).is_err());
        assert!(serde_json::from_str::<Point>(r#""50 inf""#).is_err());
        assert!(serde_json::from_str::<Point>(r#""-infinity 0""#).is_err());
        let ev: Result<PointerEvent, _> = serde_json::from_str(r#"{"Move":"NaN 50"}"#);
        assert!(ev.is_err());
    }

    #[test]
    fn deserialize_events() {
        let down: PointerEvent = serde_json::from_str(r#"{"Down":{"x":40,"y":40}}"#).unwrap();
        assert_eq!(down, PointerEvent::Down(Point::new(40.0, 40.0)));
        let mv: PointerEvent = serde_json::from_str(r#"{"Move":"150 40"}"#).unwrap();
        assert_eq!(mv, PointerEvent::Move(Point::new(150.0, 40.0)));
        let cancel: PointerEvent = serde_json::from_str(r#""Cancel""#).unwrap();
        assert_eq!(cancel, PointerEvent::Cancel);
        assert_eq!(cancel.point(), None);
    }

    #[test]
    fn serialized_events_parse_back() {
        let ev = PointerEvent::Up(Point::new(3.0, 4.0));
        let text = serde_json::to_string(&ev).unwrap();
        assert_eq!(text, r#"{"Up":{"x":3.0,"y":4.0}}"#);
    }

    #[test]
    fn distance_and_delta() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(b.delta_from(a), (3.0, 4.0));
        assert_eq!(a.distance_to(b), 5.0);
    }

    #[test]
    fn kind_display_matches_dom_names() {
        assert_eq!(PointerKind::Down.to_string(), "pointerdown");
        assert_eq!(PointerEvent::Cancel.kind(), PointerKind::Cancel);
    }
}
