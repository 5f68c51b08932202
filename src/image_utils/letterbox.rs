use crate::annotations::point::Point;
use crate::error::{Axis, GeometryError};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

/// Mid-gray used for the letterbox border.
pub const LETTERBOX_FILL: Rgb<u8> = Rgb([114, 114, 114]);

/// Scale and padding of one letterbox transform.
///
/// Padding is kept at sub-pixel precision so the inverse is exact; only the border actually
/// painted into the canvas is rounded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Letterbox {
    pub canvas_size: u32,
    pub source_width: u32,
    pub source_height: u32,
    pub scale: f32,
    pub scaled_width: u32,
    pub scaled_height: u32,
    pub pad_x: f32,
    pub pad_y: f32,
}

impl Letterbox {
    pub fn compute(
        source_width: u32,
        source_height: u32,
        canvas_size: u32,
    ) -> Result<Letterbox, GeometryError> {
        if source_width == 0 || source_height == 0 {
            return Err(GeometryError::EmptyImage {
                width: source_width,
                height: source_height,
            });
        }
        if canvas_size == 0 {
            return Err(GeometryError::EmptyCanvas);
        }
        let canvas = canvas_size as f32;
        let scale = (canvas / source_width as f32).min(canvas / source_height as f32);
        let scaled_width = ((source_width as f32 * scale).round() as u32).min(canvas_size);
        let scaled_height = ((source_height as f32 * scale).round() as u32).min(canvas_size);
        if scaled_width == 0 || scaled_height == 0 {
            return Err(GeometryError::DegenerateScale {
                width: source_width,
                height: source_height,
                canvas: canvas_size,
            });
        }
        Ok(Letterbox {
            canvas_size,
            source_width,
            source_height,
            scale,
            scaled_width,
            scaled_height,
            pad_x: (canvas_size - scaled_width) as f32 / 2.0,
            pad_y: (canvas_size - scaled_height) as f32 / 2.0,
        })
    }

    /// Left and top border in whole pixels. An odd remainder goes to the right/bottom side.
    pub fn border_offsets(&self) -> (u32, u32) {
        let left = (self.pad_x - 0.1).round().max(0.0) as u32;
        let top = (self.pad_y - 0.1).round().max(0.0) as u32;
        (left, top)
    }

    /// Projects a source-image point into canvas space.
    pub fn to_canvas(&self, point: Point) -> Point {
        Point {
            x: point.x * self.scaled_width as f32 / self.source_width as f32 + self.pad_x,
            y: point.y * self.scaled_height as f32 / self.source_height as f32 + self.pad_y,
        }
    }

    /// Projects a canvas point back into source-image space, without clamping.
    pub fn to_source(&self, point: Point) -> Result<Point, GeometryError> {
        Ok(Point {
            x: self.invert_axis(point.x, Axis::X)?,
            y: self.invert_axis(point.y, Axis::Y)?,
        })
    }

    fn invert_axis(&self, coord: f32, axis: Axis) -> Result<f32, GeometryError> {
        let (padding, source_dim) = match axis {
            Axis::X => (self.pad_x, self.source_width),
            Axis::Y => (self.pad_y, self.source_height),
        };
        let denominator = self.canvas_size as f32 - 2.0 * padding;
        if denominator <= 0.0 {
            return Err(GeometryError::DegenerateInverse { axis, padding });
        }
        let mapped = (coord - padding) * source_dim as f32 / denominator;
        if !mapped.is_finite() {
            return Err(GeometryError::NonFinite { axis });
        }
        Ok(mapped)
    }
}

/// Fits `image` into a `canvas_size` square, preserving aspect ratio and centering it on a
/// gray border.
pub fn letterbox(image: &RgbImage, canvas_size: u32) -> Result<(RgbImage, Letterbox), GeometryError> {
    let params = Letterbox::compute(image.width(), image.height(), canvas_size)?;
    let resized = if (params.scaled_width, params.scaled_height) == image.dimensions() {
        image.clone()
    } else {
        imageops::resize(image, params.scaled_width, params.scaled_height, FilterType::Triangle)
    };
    let mut canvas = RgbImage::from_pixel(canvas_size, canvas_size, LETTERBOX_FILL);
    let (left, top) = params.border_offsets();
    imageops::replace(&mut canvas, &resized, left as i64, top as i64);
    Ok((canvas, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn full_hd_frame_gets_vertical_bars() {
        let params = Letterbox::compute(1920, 1080, 640).unwrap();
        assert_abs_diff_eq!(params.scale, 1.0 / 3.0, epsilon = 1e-6);
        assert_eq!((params.scaled_width, params.scaled_height), (640, 360));
        assert_eq!(params.pad_x, 0.0);
        assert_eq!(params.pad_y, 140.0);
        assert_eq!(params.border_offsets(), (0, 140));
    }

    #[test]
    fn odd_padding_keeps_half_pixel_precision() {
        let params = Letterbox::compute(640, 635, 640).unwrap();
        assert_eq!(params.pad_y, 2.5);
        assert_eq!(params.border_offsets(), (0, 2));
    }

    #[test]
    fn canvas_is_always_square_and_padded_gray() {
        let image = RgbImage::from_pixel(200, 100, Rgb([10, 20, 30]));
        let (canvas, params) = letterbox(&image, 64).unwrap();
        assert_eq!(canvas.dimensions(), (64, 64));
        assert_eq!((params.scaled_width, params.scaled_height), (64, 32));
        assert_eq!(canvas.get_pixel(5, 0), &LETTERBOX_FILL);
        assert_eq!(canvas.get_pixel(5, 63), &LETTERBOX_FILL);
        assert_eq!(canvas.get_pixel(32, 32), &Rgb([10, 20, 30]));
    }

    #[test]
    fn odd_border_fills_exact_canvas() {
        let image = RgbImage::from_pixel(64, 61, Rgb([200, 0, 0]));
        let (canvas, _) = letterbox(&image, 64).unwrap();
        assert_eq!(canvas.dimensions(), (64, 64));
        assert_eq!(canvas.get_pixel(0, 0), &LETTERBOX_FILL);
        assert_eq!(canvas.get_pixel(0, 1), &Rgb([200, 0, 0]));
        assert_eq!(canvas.get_pixel(0, 61), &Rgb([200, 0, 0]));
        assert_eq!(canvas.get_pixel(0, 62), &LETTERBOX_FILL);
    }

    #[test]
    fn empty_image_is_rejected() {
        assert_eq!(
            Letterbox::compute(0, 10, 640),
            Err(GeometryError::EmptyImage { width: 0, height: 10 })
        );
        assert!(letterbox(&RgbImage::new(0, 0), 640).is_err());
    }

    #[test]
    fn sliver_image_is_a_degenerate_scale() {
        assert!(matches!(
            Letterbox::compute(1, 100_000, 640),
            Err(GeometryError::DegenerateScale { .. })
        ));
    }

    #[test]
    fn all_padding_axis_has_no_inverse() {
        let mut params = Letterbox::compute(640, 640, 640).unwrap();
        params.pad_x = 320.0;
        assert!(matches!(
            params.to_source(Point::new(1.0, 1.0)),
            Err(GeometryError::DegenerateInverse { axis: Axis::X, .. })
        ));
    }

    #[test]
    fn forward_then_inverse_recovers_source_points() {
        let sizes = [(1920, 1080), (1080, 1920), (640, 640), (333, 777), (1280, 721), (17, 5)];
        for (w, h) in sizes {
            let params = Letterbox::compute(w, h, 640).unwrap();
            for (fx, fy) in [(0.1, 0.1), (0.5, 0.5), (0.25, 0.9), (0.99, 0.01)] {
                let original = Point::new(w as f32 * fx, h as f32 * fy);
                let back = params.to_source(params.to_canvas(original)).unwrap();
                assert_abs_diff_eq!(back.x, original.x, epsilon = 1e-3 * w as f32);
                assert_abs_diff_eq!(back.y, original.y, epsilon = 1e-3 * h as f32);
            }
        }
    }

    #[test]
    fn inverse_matches_the_worked_example() {
        let params = Letterbox::compute(1920, 1080, 640).unwrap();
        let top_left = params.to_source(Point::new(300.0, 300.0)).unwrap();
        let bottom_right = params.to_source(Point::new(340.0, 340.0)).unwrap();
        assert_abs_diff_eq!(top_left.x, 900.0, epsilon = 0.01);
        assert_abs_diff_eq!(top_left.y, 480.0, epsilon = 0.01);
        assert_abs_diff_eq!(bottom_right.x - top_left.x, 120.0, epsilon = 0.01);
        assert_abs_diff_eq!(bottom_right.y - top_left.y, 120.0, epsilon = 0.01);
    }
}
