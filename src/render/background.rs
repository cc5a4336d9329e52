//! Background image loading and dimension normalization.
//!
//! H.264's 4:2:0 chroma subsampling cannot encode odd pixel
//! dimensions, so every image entering the pipeline is forced to even
//! width and height up front.

use std::path::Path;

use image::{imageops::FilterType, RgbaImage};
use thiserror::Error;

/// Errors produced while preparing the background image.
#[derive(Debug, Error)]
pub enum BackgroundError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Image too small to normalize: {width}x{height}")]
    TooSmall { width: u32, height: u32 },
}

/// Truncate each odd dimension by one pixel; even dimensions are kept.
pub fn even_dimensions(width: u32, height: u32) -> (u32, u32) {
    (width & !1, height & !1)
}

/// Load a background image and normalize it to even dimensions.
///
/// Odd dimensions are truncated by one pixel (never rounded up) and
/// the image is resampled to the truncated size. An undecodable file
/// is a fatal error; no degenerate video is ever produced from a
/// guessed size.
pub fn load_background(path: &Path) -> Result<RgbaImage, BackgroundError> {
    let image = image::open(path)?.to_rgba8();
    let (width, height) = image.dimensions();
    log::debug!("background {}: {}x{}", path.display(), width, height);
    ensure_even(image)
}

/// Normalize an in-memory image to even dimensions.
///
/// Idempotent: an already-even image passes through untouched.
pub fn ensure_even(image: RgbaImage) -> Result<RgbaImage, BackgroundError> {
    let (width, height) = image.dimensions();
    let (even_w, even_h) = even_dimensions(width, height);

    if even_w == 0 || even_h == 0 {
        return Err(BackgroundError::TooSmall { width, height });
    }

    if (even_w, even_h) == (width, height) {
        return Ok(image);
    }

    log::info!(
        "resizing image from {}x{} to {}x{} for H.264 compatibility",
        width,
        height,
        even_w,
        even_h
    );
    Ok(image::imageops::resize(
        &image,
        even_w,
        even_h,
        FilterType::Triangle,
    ))
}
