use crate::annotations::bounding_box::{BoundingBox, BoundingBoxGeometry};
use crate::annotations::bounding_box_with_keypoints::BoundingBoxWithKeypoints;
use crate::annotations::detection::{Blade, Detection};
use crate::annotations::point::Point;
use crate::error::GeometryError;
use crate::image_utils::letterbox::Letterbox;

/// Maps a canvas-space candidate back onto the source image.
///
/// Both box corners and every present keypoint go through the inverse letterbox and are then
/// clamped to `[0, width] x [0, height]`. Absent keypoints pass through untouched.
pub fn remap_to_source(candidate: &Blade, letterbox: &Letterbox) -> Result<Blade, GeometryError> {
    let to_source = |point: Point| -> Result<Point, GeometryError> {
        Ok(letterbox.to_source(point)?.clamped(
            letterbox.source_width as f32,
            letterbox.source_height as f32,
        ))
    };
    let annotation = &candidate.annotation;
    let bounding_box = BoundingBox::from_corners(
        to_source(annotation.top_left())?,
        to_source(annotation.bottom_right())?,
    )?;
    let mut keypoints = annotation.keypoints;
    for keypoint in keypoints.iter_mut() {
        *keypoint = keypoint.try_map(to_source)?;
    }
    Ok(Detection {
        annotation: BoundingBoxWithKeypoints::new(bounding_box, annotation.category, keypoints),
        confidence: candidate.confidence,
    })
}
