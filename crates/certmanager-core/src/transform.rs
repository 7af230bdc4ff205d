//! Per-image transforms applied before the PDF write.
//!
//! Two normalizations run on every source image: page-orientation
//! correction driven by the configured [`PageOrientation`], and flattening
//! to plain three-channel RGB, since the PDF page stream cannot carry
//! alpha or palette data.

use image::{DynamicImage, GenericImageView, RgbImage};

use crate::config::PageOrientation;

/// Rotate the image by 90° when its aspect contradicts the requested
/// orientation.
///
/// `Portrait` rotates images wider than tall, `Landscape` rotates images
/// taller than wide, `Auto` leaves every image untouched. Square images
/// are never rotated.
pub fn correct_orientation(image: DynamicImage, orientation: PageOrientation) -> DynamicImage {
    let (width, height) = image.dimensions();
    match orientation {
        PageOrientation::Auto => image,
        PageOrientation::Portrait if width > height => image.rotate90(),
        PageOrientation::Landscape if height > width => image.rotate90(),
        _ => image,
    }
}

/// Flatten any color mode to 8-bit RGB.
///
/// Alpha channels are dropped (not composited) and palette or grayscale
/// data is expanded. Images already in RGB8 pass through without a copy.
pub fn flatten_to_rgb(image: DynamicImage) -> RgbImage {
    match image {
        DynamicImage::ImageRgb8(rgb) => rgb,
        other => other.to_rgb8(),
    }
}
