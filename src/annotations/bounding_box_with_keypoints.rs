use crate::annotations::blade_class::BladeClass;
use crate::annotations::bounding_box::{BoundingBox, BoundingBoxGeometry};
use crate::annotations::keypoint::Keypoint;
use crate::annotations::point::Point;
use serde::{Deserialize, Serialize};

/// Number of keypoints the pose head predicts per blade.
pub const NUM_KEYPOINTS: usize = 4;

/// A struct representing a BoundingBox + Keypoints annotation.
///
/// Pose estimation models use a standard detection model as their base, and add on functionality
/// to place keypoints into the frame as well. The blade model predicts four corner keypoints for
/// every box, each of which may be absent.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct BoundingBoxWithKeypoints {
    pub bounding_box: BoundingBox,
    pub category: BladeClass,
    pub keypoints: [Keypoint; NUM_KEYPOINTS],
}

impl BoundingBoxWithKeypoints {
    pub fn new(
        bounding_box: BoundingBox,
        category: BladeClass,
        keypoints: [Keypoint; NUM_KEYPOINTS],
    ) -> Self {
        BoundingBoxWithKeypoints { bounding_box, category, keypoints }
    }

    /// All four corners, only when every keypoint is present.
    pub fn quadrilateral(&self) -> Option<[Point; NUM_KEYPOINTS]> {
        let mut corners = [Point::new(0.0, 0.0); NUM_KEYPOINTS];
        for (corner, keypoint) in corners.iter_mut().zip(self.keypoints.iter()) {
            *corner = keypoint.point()?;
        }
        Some(corners)
    }
}

/// Annotations that belong to one of the blade categories.
pub trait Categorized {
    fn category(&self) -> BladeClass;
}

impl Categorized for BoundingBoxWithKeypoints {
    fn category(&self) -> BladeClass {
        self.category
    }
}

impl BoundingBoxGeometry for BoundingBoxWithKeypoints {
    fn left(&self) -> f32 {
        self.bounding_box.left()
    }

    fn top(&self) -> f32 {
        self.bounding_box.top()
    }

    fn right(&self) -> f32 {
        self.bounding_box.right()
    }

    fn bottom(&self) -> f32 {
        self.bounding_box.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(keypoints: [Keypoint; NUM_KEYPOINTS]) -> BoundingBoxWithKeypoints {
        BoundingBoxWithKeypoints::new(
            BoundingBox::new(0.0, 0.0, 10.0, 10.0).unwrap(),
            BladeClass::RedRight,
            keypoints,
        )
    }

    #[test]
    fn quadrilateral_needs_every_corner() {
        let p = |x, y| Keypoint::Present(Point::new(x, y));
        let full = square([p(0.0, 0.0), p(10.0, 0.0), p(10.0, 10.0), p(0.0, 10.0)]);
        assert_eq!(full.quadrilateral().map(|q| q[2]), Some(Point::new(10.0, 10.0)));

        let partial = square([p(0.0, 0.0), Keypoint::Absent, p(10.0, 10.0), p(0.0, 10.0)]);
        assert_eq!(partial.quadrilateral(), None);
    }

    #[test]
    fn geometry_delegates_to_the_box() {
        let annotation = square([Keypoint::Absent; NUM_KEYPOINTS]);
        assert_eq!(annotation.as_xywh(), (0.0, 0.0, 10.0, 10.0));
        assert_eq!(annotation.category(), BladeClass::RedRight);
    }
}
