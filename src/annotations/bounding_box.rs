use crate::annotations::point::Point;
use crate::error::AnnotationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A struct representing a bounding box.
///
/// A bounding box is the axis-aligned rectangle an object detection model places around a
/// blade. Boxes are stored in corner form; the network emits center form and the decoder
/// converts once.
///
/// This project uses the standard convention of the left side of the image being x=0 and the top
/// of the image being y=0.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct BoundingBox {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl BoundingBox {
    /// Checks if a box has valid parameters before constructing.
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Result<Self, AnnotationError> {
        if left > right {
            Err(AnnotationError::LeftPastRight { left, right })
        } else if top > bottom {
            Err(AnnotationError::TopPastBottom { top, bottom })
        } else {
            Ok(BoundingBox { left, top, right, bottom })
        }
    }

    /// Builds a box from the center form the network emits.
    ///
    /// Negative extents are treated as zero so the result is always a valid box.
    pub fn from_center(center_x: f32, center_y: f32, width: f32, height: f32) -> Self {
        let width = width.max(0.0);
        let height = height.max(0.0);
        let left = center_x - width / 2.0;
        let top = center_y - height / 2.0;
        BoundingBox {
            left,
            top,
            right: left + width,
            bottom: top + height,
        }
    }

    pub fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Result<Self, AnnotationError> {
        Self::new(x, y, x + width, y + height)
    }

    pub fn from_corners(top_left: Point, bottom_right: Point) -> Result<Self, AnnotationError> {
        Self::new(top_left.x, top_left.y, bottom_right.x, bottom_right.y)
    }
}

/// Geometry shared by every annotation that carries a box.
pub trait BoundingBoxGeometry {
    fn left(&self) -> f32;
    fn top(&self) -> f32;
    fn right(&self) -> f32;
    fn bottom(&self) -> f32;

    fn width(&self) -> f32 {
        self.right() - self.left()
    }

    fn height(&self) -> f32 {
        self.bottom() - self.top()
    }

    fn area(&self) -> f32 {
        self.width().max(0.0) * self.height().max(0.0)
    }

    fn center(&self) -> Point {
        Point {
            x: (self.left() + self.right()) / 2.0,
            y: (self.top() + self.bottom()) / 2.0,
        }
    }

    fn top_left(&self) -> Point {
        Point { x: self.left(), y: self.top() }
    }

    fn bottom_right(&self) -> Point {
        Point { x: self.right(), y: self.bottom() }
    }

    fn as_xyxy(&self) -> (f32, f32, f32, f32) {
        (self.left(), self.top(), self.right(), self.bottom())
    }

    fn as_xywh(&self) -> (f32, f32, f32, f32) {
        (self.left(), self.top(), self.width(), self.height())
    }

    /// Standard intersection over union. Boxes without area overlap nothing.
    fn intersection_over_union<G: BoundingBoxGeometry + ?Sized>(&self, other: &G) -> f32 {
        let (self_area, other_area) = (self.area(), other.area());
        if self_area <= 0.0 || other_area <= 0.0 {
            return 0.0;
        }
        let inter_w = (self.right().min(other.right()) - self.left().max(other.left())).max(0.0);
        let inter_h = (self.bottom().min(other.bottom()) - self.top().max(other.top())).max(0.0);
        let intersection = inter_w * inter_h;
        let union = self_area + other_area - intersection;
        if union <= 0.0 { 0.0 } else { intersection / union }
    }
}

impl BoundingBoxGeometry for BoundingBox {
    fn left(&self) -> f32 {
        self.left
    }

    fn top(&self) -> f32 {
        self.top
    }

    fn right(&self) -> f32 {
        self.right
    }

    fn bottom(&self) -> f32 {
        self.bottom
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (x, y, w, h) = self.as_xywh();
        write!(f, "[x: {:.1}, y: {:.1}, w: {:.1}, h: {:.1}]", x, y, w, h)
    }
}
