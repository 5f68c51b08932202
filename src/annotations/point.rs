use serde::{Deserialize, Serialize};
use std::fmt;

/// A struct representing a simple point.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Point { x, y }
    }

    /// True when both coordinates lie in `[0, width] x [0, height]`, edges included.
    pub fn is_within(&self, width: f32, height: f32) -> bool {
        (0.0..=width).contains(&self.x) && (0.0..=height).contains(&self.y)
    }

    pub fn clamped(&self, width: f32, height: f32) -> Point {
        Point {
            x: self.x.clamp(0.0, width),
            y: self.y.clamp(0.0, height),
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Point {{ x: {}, y: {} }}", self.x, self.y)
    }
}
