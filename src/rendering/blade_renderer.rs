use crate::annotations::bounding_box::BoundingBoxGeometry;
use crate::annotations::bounding_box_with_keypoints::NUM_KEYPOINTS;
use crate::annotations::detection::Blade;
use crate::annotations::point::Point;
use crate::error::DetectorError;
use ab_glyph::{FontArc, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut, draw_text_mut,
};
use imageproc::rect::Rect;
use std::path::Path;

pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const QUAD_COLOR: Rgb<u8> = Rgb([255, 0, 255]);
/// One color per keypoint slot: green, blue, red, cyan.
pub const KEYPOINT_COLORS: [Rgb<u8>; NUM_KEYPOINTS] = [
    Rgb([0, 255, 0]),
    Rgb([0, 0, 255]),
    Rgb([255, 0, 0]),
    Rgb([0, 255, 255]),
];
const KEYPOINT_RADIUS: i32 = 5;

/// Draws final blades onto a frame.
///
/// Decoy categories are never drawn. Text labels need a font; without one only shapes are
/// drawn.
#[derive(Clone)]
pub struct BladeRenderer {
    font: Option<FontArc>,
    label_scale: PxScale,
    keypoint_scale: PxScale,
}

impl Default for BladeRenderer {
    fn default() -> Self {
        BladeRenderer::new()
    }
}

impl BladeRenderer {
    pub fn new() -> Self {
        BladeRenderer {
            font: None,
            label_scale: PxScale::from(16.0),
            keypoint_scale: PxScale::from(13.0),
        }
    }

    pub fn with_font(font: FontArc) -> Self {
        BladeRenderer { font: Some(font), ..BladeRenderer::new() }
    }

    pub fn from_font_file(path: &Path) -> Result<Self, DetectorError> {
        let bytes = std::fs::read(path).map_err(|source| DetectorError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let font = FontArc::try_from_vec(bytes).map_err(|err| DetectorError::Font {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;
        Ok(BladeRenderer::with_font(font))
    }

    pub fn font(&self) -> Option<&FontArc> {
        self.font.as_ref()
    }

    /// Returns an annotated copy of `image`.
    pub fn render(&self, image: &RgbImage, blades: &[Blade]) -> RgbImage {
        let mut canvas = image.clone();
        self.draw_blades(&mut canvas, blades);
        canvas
    }

    pub fn draw_blades(&self, image: &mut RgbImage, blades: &[Blade]) {
        for blade in blades.iter().filter(|b| !b.annotation.category.is_decoy()) {
            self.draw_blade(image, blade);
        }
    }

    fn draw_blade(&self, image: &mut RgbImage, blade: &Blade) {
        let annotation = &blade.annotation;
        let x = annotation.left() as i32;
        let y = annotation.top() as i32;
        let width = (annotation.width() as u32).max(1);
        let height = (annotation.height() as u32).max(1);
        draw_hollow_rect_mut(image, Rect::at(x, y).of_size(width, height), BOX_COLOR);
        if width > 2 && height > 2 {
            let inner = Rect::at(x + 1, y + 1).of_size(width - 2, height - 2);
            draw_hollow_rect_mut(image, inner, BOX_COLOR);
        }
        if let Some(font) = &self.font {
            let label = format!("{}: {}%", blade.label(), blade.confidence_percent());
            draw_text_mut(image, BOX_COLOR, x, (y - 20).max(0), self.label_scale, font, &label);
        }

        if let Some(corners) = annotation.quadrilateral() {
            for (k, start) in corners.iter().enumerate() {
                let end = corners[(k + 1) % NUM_KEYPOINTS];
                draw_thick_segment(image, *start, end);
            }
        }

        for (k, keypoint) in annotation.keypoints.iter().enumerate() {
            let Some(point) = keypoint.point() else {
                continue;
            };
            let (px, py) = (point.x as i32, point.y as i32);
            draw_filled_circle_mut(image, (px, py), KEYPOINT_RADIUS, KEYPOINT_COLORS[k]);
            if let Some(font) = &self.font {
                let name = format!("kpt{k}");
                let color = KEYPOINT_COLORS[k];
                draw_text_mut(image, color, px + 7, py - 7, self.keypoint_scale, font, &name);
            }
        }
    }
}

fn draw_thick_segment(image: &mut RgbImage, start: Point, end: Point) {
    for offset in [0.0, 1.0] {
        draw_line_segment_mut(
            image,
            (start.x + offset, start.y),
            (end.x + offset, end.y),
            QUAD_COLOR,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::blade_class::BladeClass;
    use crate::annotations::bounding_box::BoundingBox;
    use crate::annotations::bounding_box_with_keypoints::BoundingBoxWithKeypoints;
    use crate::annotations::detection::Detection;
    use crate::annotations::keypoint::Keypoint;

    const BACKGROUND: Rgb<u8> = Rgb([20, 20, 20]);

    fn diamond() -> [Keypoint; 4] {
        [
            Keypoint::Present(Point::new(50.0, 25.0)),
            Keypoint::Present(Point::new(75.0, 50.0)),
            Keypoint::Present(Point::new(50.0, 75.0)),
            Keypoint::Present(Point::new(25.0, 50.0)),
        ]
    }

    fn blade(category: BladeClass, keypoints: [Keypoint; 4]) -> Blade {
        Detection {
            annotation: BoundingBoxWithKeypoints::new(
                BoundingBox::new(10.0, 10.0, 90.0, 90.0).unwrap(),
                category,
                keypoints,
            ),
            confidence: 0.93,
        }
    }

    fn frame() -> RgbImage {
        RgbImage::from_pixel(100, 100, BACKGROUND)
    }

    #[test]
    fn draws_box_keypoints_and_outline() {
        let image = frame();
        let blades = [blade(BladeClass::RedRight, diamond())];
        let rendered = BladeRenderer::new().render(&image, &blades);
        assert_eq!(rendered.get_pixel(10, 10), &BOX_COLOR);
        assert_eq!(rendered.get_pixel(11, 50), &BOX_COLOR);
        assert_eq!(rendered.get_pixel(89, 89), &BOX_COLOR);
        for (k, color) in KEYPOINT_COLORS.iter().enumerate() {
            let point = diamond()[k].point().unwrap();
            assert_eq!(rendered.get_pixel(point.x as u32, point.y as u32), color);
        }
        // Midpoint of the kpt0 -> kpt1 edge, clear of both circles.
        assert_eq!(rendered.get_pixel(62, 37), &QUAD_COLOR);
        assert_eq!(image, frame());
    }

    #[test]
    fn text_is_skipped_without_a_font() {
        let renderer = BladeRenderer::new();
        assert!(renderer.font().is_none());
        let rendered = renderer.render(&frame(), &[blade(BladeClass::RedRight, diamond())]);
        // The label would sit above the box, the keypoint names right of each circle.
        for y in 0..10 {
            for x in 0..100 {
                assert_eq!(rendered.get_pixel(x, y), &BACKGROUND);
            }
        }
        assert_eq!(rendered.get_pixel(60, 20), &BACKGROUND);
    }

    #[test]
    fn decoys_are_not_drawn() {
        let blades = [
            blade(BladeClass::RedWrong, diamond()),
            blade(BladeClass::BlueWrong, diamond()),
        ];
        assert_eq!(BladeRenderer::new().render(&frame(), &blades), frame());
    }

    #[test]
    fn outline_needs_all_four_keypoints() {
        let mut keypoints = diamond();
        keypoints[3] = Keypoint::Absent;
        let blades = [blade(BladeClass::BlueRight, keypoints)];
        let rendered = BladeRenderer::new().render(&frame(), &blades);
        assert_eq!(rendered.get_pixel(62, 37), &BACKGROUND);
        assert_eq!(rendered.get_pixel(25, 50), &BACKGROUND);
        assert_eq!(rendered.get_pixel(50, 25), &KEYPOINT_COLORS[0]);
    }

    #[test]
    fn degenerate_boxes_do_not_panic() {
        let thin = Detection {
            annotation: BoundingBoxWithKeypoints::new(
                BoundingBox::new(99.0, 0.0, 99.0, 0.5).unwrap(),
                BladeClass::RedRight,
                [Keypoint::Absent; 4],
            ),
            confidence: 0.6,
        };
        let rendered = BladeRenderer::new().render(&frame(), &[thin]);
        assert_eq!(rendered.get_pixel(99, 0), &BOX_COLOR);
    }

    #[test]
    fn unreadable_font_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("font.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(matches!(
            BladeRenderer::from_font_file(&path),
            Err(DetectorError::Font { .. })
        ));
        assert!(matches!(
            BladeRenderer::from_font_file(&dir.path().join("missing.ttf")),
            Err(DetectorError::Io { .. })
        ));
    }
}
