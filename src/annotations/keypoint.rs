use crate::annotations::point::Point;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single keypoint slot of a blade.
///
/// The network predicts a coordinate for every slot, but predictions far outside the canvas
/// are unreliable and are recorded as `Absent` instead of being clamped. Keeping the absence
/// as its own variant means a legitimate point at (-1, -1) can never be mistaken for it.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Keypoint {
    Present(Point),
    #[default]
    Absent,
}

impl Keypoint {
    pub fn point(&self) -> Option<Point> {
        match self {
            Keypoint::Present(p) => Some(*p),
            Keypoint::Absent => None,
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Keypoint::Present(_))
    }

    /// Applies `f` to a present point, absent keypoints pass through untouched.
    pub fn try_map<E>(self, f: impl FnOnce(Point) -> Result<Point, E>) -> Result<Keypoint, E> {
        match self {
            Keypoint::Present(p) => f(p).map(Keypoint::Present),
            Keypoint::Absent => Ok(Keypoint::Absent),
        }
    }
}

impl From<Option<Point>> for Keypoint {
    fn from(value: Option<Point>) -> Self {
        value.map_or(Keypoint::Absent, Keypoint::Present)
    }
}

impl fmt::Display for Keypoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Keypoint::Present(p) => write!(f, "({:.1}, {:.1})", p.x, p.y),
            Keypoint::Absent => write!(f, "absent"),
        }
    }
}
