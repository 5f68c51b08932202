use crate::error::DetectorError;
use image::{self, RgbImage};
use std::path::Path;

/// File extensions the batch front end treats as images.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "webp"];

pub fn read_image_as_rgb8(filepath: &Path) -> Result<RgbImage, DetectorError> {
    Ok(image::open(filepath)?.into_rgb8())
}

/// Saves an image, creating missing parent directories. The format follows the extension.
pub fn write_rgb8_image(image: &RgbImage, filepath: &Path) -> Result<(), DetectorError> {
    if let Some(parent) = filepath.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| DetectorError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    image.save(filepath)?;
    Ok(())
}

pub fn has_image_extension(filepath: &Path) -> bool {
    filepath
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.iter().any(|known| known.eq_ignore_ascii_case(ext)))
}
