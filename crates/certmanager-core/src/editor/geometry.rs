//! Display-to-source coordinate mapping for the image editor.
//!
//! The editor shows the working image scaled to fit a viewport, preserving
//! aspect ratio and centered, so the displayed image may be inset by empty
//! margins on one axis. Everything here is pure geometry: no widget types,
//! no pixels, just the arithmetic that turns a rectangle dragged in display
//! coordinates into a rectangle in source-image pixels.
//!
//! # Coordinate Systems
//!
//! - *Viewport / display coordinates*: f64 positions as reported by the
//!   pointer, origin at the viewport's top-left corner.
//! - *Source coordinates*: u32 pixel positions in the working image.

/// A rectangle in viewport/display coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    /// Left edge in display coordinates
    pub x: f64,
    /// Top edge in display coordinates
    pub y: f64,
    /// Width in display pixels
    pub width: f64,
    /// Height in display pixels
    pub height: f64,
}

impl SelectionRect {
    /// Build a normalized rectangle from two drag endpoints.
    ///
    /// The points may come in any order (drags can move up-left as well as
    /// down-right); the result always has non-negative width and height.
    pub fn from_drag(start: (f64, f64), end: (f64, f64)) -> Self {
        let x = start.0.min(end.0);
        let y = start.1.min(end.1);
        Self {
            x,
            y,
            width: (start.0 - end.0).abs(),
            height: (start.1 - end.1).abs(),
        }
    }
}

/// A rectangle in source-image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    /// Left edge in source pixels
    pub x: u32,
    /// Top edge in source pixels
    pub y: u32,
    /// Width in source pixels
    pub width: u32,
    /// Height in source pixels
    pub height: u32,
}

/// Scale `source` to fit inside `viewport`, preserving aspect ratio.
///
/// Scales up as well as down, so a small image fills the viewport the same
/// way an oversized one is reduced. Each returned dimension is at least
/// 1 px. A zero-sized source yields 1x1.
pub fn fit_dimensions(source: (u32, u32), viewport: (u32, u32)) -> (u32, u32) {
    let (source_w, source_h) = source;
    if source_w == 0 || source_h == 0 {
        return (1, 1);
    }

    let scale_w = viewport.0 as f64 / source_w as f64;
    let scale_h = viewport.1 as f64 / source_h as f64;
    let scale = scale_w.min(scale_h);

    let width = (source_w as f64 * scale).round().max(1.0) as u32;
    let height = (source_h as f64 * scale).round().max(1.0) as u32;
    (width, height)
}

/// Offset of the displayed image's top-left corner inside the viewport.
///
/// The displayed image is centered, so each axis is inset by
/// `max(0, (viewport - displayed) / 2)` (integer division).
pub fn centering_offset(viewport: (u32, u32), displayed: (u32, u32)) -> (u32, u32) {
    (
        viewport.0.saturating_sub(displayed.0) / 2,
        viewport.1.saturating_sub(displayed.1) / 2,
    )
}

/// Map a selection in viewport coordinates to source-image pixels.
///
/// # Arguments
///
/// * `source` - Working image dimensions in pixels
/// * `displayed` - Dimensions the image is shown at (see [`fit_dimensions`])
/// * `viewport` - Dimensions of the display area
/// * `selection` - Rectangle dragged in viewport coordinates
///
/// # Behavior
///
/// - The centering offset is subtracted and the origin clamped to 0, so
///   selections that start in the empty margin snap to the image edge.
/// - Each axis scales independently by `source / displayed` and rounds to
///   whole pixels, so a selection covering the entire displayed image maps
///   to exactly the full source.
/// - The result is clamped into the source bounds
///   (`x + width <= source_w`, `y + height <= source_h`).
/// - `None` when either mapped dimension collapses to zero.
pub fn map_selection_to_source(
    source: (u32, u32),
    displayed: (u32, u32),
    viewport: (u32, u32),
    selection: SelectionRect,
) -> Option<CropRect> {
    let (source_w, source_h) = source;
    let (displayed_w, displayed_h) = displayed;
    if source_w == 0 || source_h == 0 || displayed_w == 0 || displayed_h == 0 {
        return None;
    }

    let (offset_x, offset_y) = centering_offset(viewport, displayed);
    let local_x = (selection.x - offset_x as f64).max(0.0);
    let local_y = (selection.y - offset_y as f64).max(0.0);

    let scale_x = source_w as f64 / displayed_w as f64;
    let scale_y = source_h as f64 / displayed_h as f64;

    let x = ((local_x * scale_x).round() as u32).min(source_w - 1);
    let y = ((local_y * scale_y).round() as u32).min(source_h - 1);
    let width = ((selection.width * scale_x).round() as u32).min(source_w - x);
    let height = ((selection.height * scale_y).round() as u32).min(source_h - y);

    if width == 0 || height == 0 {
        return None;
    }

    Some(CropRect {
        x,
        y,
        width,
        height,
    })
}


// ============================================================================
// Property-Based Tests
// ============================================================================
