//! Single-page PDF generation.
//!
//! Each source image becomes one PDF whose page is exactly the image
//! footprint at the configured DPI. The pixels are JPEG-encoded at the
//! quality the configuration maps to and embedded as a DCT image stream,
//! so the PDF stays close to the size of an equivalent JPEG. The margin
//! setting is carried in the configuration but does not alter the page
//! geometry.

use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use printpdf::{
    ColorBits, ColorSpace, Image, ImageFilter, ImageTransform, ImageXObject, Mm, PdfDocument, Px,
};
use thiserror::Error;

use crate::config::PdfConfig;

const MM_PER_INCH: f32 = 25.4;

/// Errors that can occur while producing a PDF.
#[derive(Debug, Error)]
pub enum PdfError {
    /// Width or height is zero
    #[error("Invalid page image: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The page image could not be JPEG-encoded
    #[error("JPEG encoding failed: {0}")]
    EncodingFailed(String),

    /// The assembled document could not be serialized
    #[error("Failed to assemble PDF document: {0}")]
    Document(String),

    /// The output file could not be created or written
    #[error("Failed to write PDF file: {0}")]
    Io(#[from] std::io::Error),
}

/// Render an RGB image as a single-page PDF at `target`.
///
/// # Arguments
///
/// * `image` - Page content, already orientation-corrected and flattened
/// * `target` - Output path; an existing file is overwritten
/// * `config` - Supplies the DPI (page scale) and the JPEG quality
///
/// # Errors
///
/// Returns `PdfError::InvalidDimensions` for an empty image,
/// `PdfError::EncodingFailed` if JPEG encoding fails, and I/O or document
/// errors if the file cannot be written.
pub fn render_pdf(image: &RgbImage, target: &Path, config: &PdfConfig) -> Result<(), PdfError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(PdfError::InvalidDimensions { width, height });
    }

    let jpeg_data = encode_page_jpeg(image, config.quality.jpeg_quality())?;

    // Page dimensions so that the image at the configured DPI fills the
    // page exactly: 1 inch = 25.4 mm.
    let dpi = config.resolution.dpi() as f32;
    let page_width = Mm(width as f32 / dpi * MM_PER_INCH);
    let page_height = Mm(height as f32 / dpi * MM_PER_INCH);

    let title = target
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "certificado".to_string());
    let (doc, page, layer) = PdfDocument::new(title, page_width, page_height, "Layer 1");
    let layer = doc.get_page(page).get_layer(layer);

    let page_image = Image::from(ImageXObject {
        width: Px(width as usize),
        height: Px(height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: jpeg_data,
        image_filter: Some(ImageFilter::DCT),
        clipping_bbox: None,
        smask: None,
    });
    page_image.add_to_layer(
        layer,
        ImageTransform {
            dpi: Some(dpi),
            ..Default::default()
        },
    );

    let file = File::create(target)?;
    let mut writer = BufWriter::new(file);
    doc.save(&mut writer)
        .map_err(|e| PdfError::Document(e.to_string()))?;
    Ok(())
}

/// Encode the page image as JPEG at the given quality.
fn encode_page_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, PdfError> {
    let mut buffer = Cursor::new(Vec::new());
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);

    encoder
        .write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ExtendedColorType::Rgb8,
        )
        .map_err(|e| PdfError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}
