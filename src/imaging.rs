//! Pixel operations delegated to the `image` crate.

use std::path::Path;

use anyhow::{Context, Result};
use image::RgbImage;

/// Decode an image file into tightly packed RGB.
pub fn load_rgb(path: &Path) -> Result<RgbImage> {
    let img = image::open(path)
        .with_context(|| format!("failed to decode image {}", path.display()))?;
    Ok(img.to_rgb8())
}

/// Linear upscale of both dimensions by `factor`.
pub fn upscale(img: &RgbImage, factor: u32) -> RgbImage {
    image::imageops::resize(
        img,
        img.width() * factor,
        img.height() * factor,
        image::imageops::FilterType::Triangle,
    )
}

/// Write an image as PNG.
pub fn write_png(path: &Path, img: &RgbImage) -> Result<()> {
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("failed to write {}", path.display()))
}
