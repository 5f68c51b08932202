use image::RgbImage;
use ndarray::Array4;

/// Normalizes an rgb8 image into a `(1, 3, height, width)` tensor with values in `[0, 1]`.
pub fn convert_rgb_image_to_owned_array(rgb_image: &RgbImage) -> Array4<f32> {
    let mut image_array = Array4::zeros((
        1,
        3,
        rgb_image.height() as usize,
        rgb_image.width() as usize,
    ));
    for (x, y, pixel) in rgb_image.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        let [r, g, b] = pixel.0;
        image_array[[0, 0, y, x]] = (r as f32) / 255.;
        image_array[[0, 1, y, x]] = (g as f32) / 255.;
        image_array[[0, 2, y, x]] = (b as f32) / 255.;
    }
    image_array
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn non_square_images_keep_rows_and_columns() {
        let mut img = RgbImage::new(4, 2);
        img.put_pixel(3, 1, Rgb([255, 0, 51]));
        let arr = convert_rgb_image_to_owned_array(&img);
        assert_eq!(arr.shape(), &[1, 3, 2, 4]);
        assert_eq!(arr[[0, 0, 1, 3]], 1.0);
        assert_eq!(arr[[0, 1, 1, 3]], 0.0);
        assert_eq!(arr[[0, 2, 1, 3]], 0.2);
    }

    #[test]
    fn values_stay_in_the_unit_range() {
        let img = RgbImage::from_fn(5, 3, |x, y| Rgb([(x * 60) as u8, (y * 127) as u8, 114]));
        let arr = convert_rgb_image_to_owned_array(&img);
        assert!(arr.iter().all(|v| (0.0..=1.0).contains(v)));
        assert_eq!(arr[[0, 0, 0, 4]], 240.0 / 255.0);
        assert_eq!(arr[[0, 1, 2, 0]], 254.0 / 255.0);
        assert_eq!(arr[[0, 2, 1, 1]], 114.0 / 255.0);
    }
}
