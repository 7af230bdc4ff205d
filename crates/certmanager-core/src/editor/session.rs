//! Stateful editing session for a single image.
//!
//! An [`EditSession`] owns the pristine original, the working copy, and the
//! crop-selection state machine. Rotations apply to the working image
//! immediately; a crop goes through select-then-apply driven by pointer
//! events in viewport coordinates. Saving writes the working image as a
//! lossless PNG under the `_editada` sibling name.

use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, ImageFormat};
use thiserror::Error;

use super::geometry::{fit_dimensions, map_selection_to_source, SelectionRect};
use crate::edited_save_path;

/// Minimum drag size, in display pixels, for a crop selection to count.
/// Both dimensions must strictly exceed this.
pub const MIN_SELECTION_DISPLAY_PX: f64 = 10.0;

/// Errors from opening or saving the edited image.
#[derive(Debug, Error)]
pub enum EditorError {
    /// The source image could not be read or decoded
    #[error("Failed to open image: {0}")]
    Open(#[source] image::ImageError),

    /// The edited image could not be written
    #[error("Failed to save edited image: {0}")]
    Save(#[source] image::ImageError),
}

/// Crop-selection state.
///
/// `Idle` means crop mode is off. Enabling crop mode moves to `Selecting`;
/// a pointer-up with a large enough rectangle moves to `Ready`, from which
/// the crop can be applied. Disabling crop mode from any state discards
/// the selection.
#[derive(Debug, Clone, Copy, PartialEq)]
enum CropState {
    Idle,
    Selecting { drag: Option<Drag> },
    Ready { selection: SelectionRect },
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    start: (f64, f64),
    current: (f64, f64),
}

/// One rotate/crop session over a single image file.
pub struct EditSession {
    source_path: PathBuf,
    original: DynamicImage,
    working: DynamicImage,
    rotation_degrees: i32,
    viewport: Option<(u32, u32)>,
    crop: CropState,
}

impl EditSession {
    /// Open an image file for editing.
    ///
    /// The decoded image is kept twice: the pristine original used by
    /// [`EditSession::restore`] and the working copy the edits apply to.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, EditorError> {
        let source_path = path.into();
        let original = image::open(&source_path).map_err(EditorError::Open)?;
        let working = original.clone();
        Ok(Self {
            source_path,
            original,
            working,
            rotation_degrees: 0,
            viewport: None,
            crop: CropState::Idle,
        })
    }

    /// The file this session was opened from.
    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    /// Current working image.
    pub fn working(&self) -> &DynamicImage {
        &self.working
    }

    /// Pristine image as loaded at open time.
    pub fn original(&self) -> &DynamicImage {
        &self.original
    }

    /// Working image dimensions in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        self.working.dimensions()
    }

    /// Cumulative rotation in degrees, normalized to `0..360`. Informational
    /// only; the rotations are already baked into the working image.
    pub fn rotation_degrees(&self) -> i32 {
        self.rotation_degrees
    }

    /// Tell the session how large the display area is. Pointer events and
    /// crop application are inert until this has been called.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Some((width, height));
    }

    /// Size the working image is displayed at: scaled to fit the viewport,
    /// aspect preserved. `None` until a viewport is known.
    pub fn displayed_size(&self) -> Option<(u32, u32)> {
        self.viewport
            .map(|viewport| fit_dimensions(self.dimensions(), viewport))
    }

    /// Whether crop mode is currently active (selecting or ready).
    pub fn crop_mode(&self) -> bool {
        !matches!(self.crop, CropState::Idle)
    }

    /// Enter crop mode. No-op when already active.
    pub fn enable_crop_mode(&mut self) {
        if matches!(self.crop, CropState::Idle) {
            self.crop = CropState::Selecting { drag: None };
        }
    }

    /// Leave crop mode, discarding any in-progress or ready selection.
    pub fn disable_crop_mode(&mut self) {
        self.crop = CropState::Idle;
    }

    /// Pointer pressed at viewport coordinates. Starts a new drag, replacing
    /// any ready selection. Ignored outside crop mode or without a viewport.
    pub fn pointer_down(&mut self, x: f64, y: f64) {
        if matches!(self.crop, CropState::Idle) || self.viewport.is_none() {
            return;
        }
        self.crop = CropState::Selecting {
            drag: Some(Drag {
                start: (x, y),
                current: (x, y),
            }),
        };
    }

    /// Pointer moved while dragging; updates the pending rectangle.
    pub fn pointer_moved(&mut self, x: f64, y: f64) {
        if let CropState::Selecting { drag: Some(drag) } = &mut self.crop {
            drag.current = (x, y);
        }
    }

    /// Pointer released. Keeps the selection only when both its width and
    /// height exceed [`MIN_SELECTION_DISPLAY_PX`]; a smaller drag is
    /// discarded and crop mode stays armed for another attempt.
    pub fn pointer_up(&mut self, x: f64, y: f64) {
        let drag = match self.crop {
            CropState::Selecting { drag: Some(drag) } => drag,
            _ => return,
        };
        let rect = SelectionRect::from_drag(drag.start, (x, y));
        if rect.width > MIN_SELECTION_DISPLAY_PX && rect.height > MIN_SELECTION_DISPLAY_PX {
            self.crop = CropState::Ready { selection: rect };
        } else {
            self.crop = CropState::Selecting { drag: None };
        }
    }

    /// The rectangle to render as the rubber band: the live drag while
    /// selecting, or the ready selection.
    pub fn selection(&self) -> Option<SelectionRect> {
        match self.crop {
            CropState::Selecting { drag: Some(drag) } => {
                Some(SelectionRect::from_drag(drag.start, drag.current))
            }
            CropState::Ready { selection } => Some(selection),
            _ => None,
        }
    }

    /// Whether a validated selection is waiting to be applied.
    pub fn can_apply_crop(&self) -> bool {
        matches!(self.crop, CropState::Ready { .. })
    }

    /// Apply the ready selection to the working image.
    ///
    /// Maps the selection from viewport coordinates into the current
    /// working image, crops on success, and leaves crop mode either way.
    /// Returns `true` when the image was actually cropped; a degenerate
    /// mapping is a silent no-op returning `false`.
    pub fn apply_crop(&mut self) -> bool {
        let selection = match self.crop {
            CropState::Ready { selection } => selection,
            _ => return false,
        };
        self.crop = CropState::Idle;

        let viewport = match self.viewport {
            Some(viewport) => viewport,
            None => return false,
        };
        let source = self.dimensions();
        let displayed = fit_dimensions(source, viewport);
        let rect = match map_selection_to_source(source, displayed, viewport, selection) {
            Some(rect) => rect,
            None => return false,
        };

        self.working = self.working.crop_imm(rect.x, rect.y, rect.width, rect.height);
        true
    }

    /// Rotate the working image 90° clockwise.
    ///
    /// Applies immediately, composing with prior edits. Any crop selection
    /// is discarded: it was made against the previous display geometry.
    pub fn rotate_clockwise(&mut self) {
        self.working = self.working.rotate90();
        self.rotation_degrees = (self.rotation_degrees + 90).rem_euclid(360);
        self.crop = CropState::Idle;
    }

    /// Rotate the working image 90° counter-clockwise.
    pub fn rotate_counterclockwise(&mut self) {
        self.working = self.working.rotate270();
        self.rotation_degrees = (self.rotation_degrees - 90).rem_euclid(360);
        self.crop = CropState::Idle;
    }

    /// Throw away every edit: working image back to the pristine original,
    /// rotation counter to zero, crop state cleared. Saved files on disk
    /// are not touched.
    pub fn restore(&mut self) {
        self.working = self.original.clone();
        self.rotation_degrees = 0;
        self.crop = CropState::Idle;
    }

    /// Persist the working image as PNG under the `_editada` sibling name.
    ///
    /// The output is always PNG, so a non-`.png` source gets its extension
    /// rewritten to match the bytes (and the conversion worker only probes
    /// for `.png` variants). Re-saving a file that already carries the
    /// marker overwrites it instead of stacking suffixes. Returns the path
    /// written.
    pub fn save(&self) -> Result<PathBuf, EditorError> {
        let target = edited_save_path(&self.source_path).with_extension("png");
        self.working
            .save_with_format(&target, ImageFormat::Png)
            .map_err(EditorError::Save)?;
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn session_with(width: u32, height: u32) -> EditSession {
        let image =
            DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([50, 100, 150])));
        EditSession {
            source_path: PathBuf::from("photo.png"),
            original: image.clone(),
            working: image,
            rotation_degrees: 0,
            viewport: None,
            crop: CropState::Idle,
        }
    }

    /// Drive a full drag from `start` to `end`.
    fn drag(session: &mut EditSession, start: (f64, f64), end: (f64, f64)) {
        session.pointer_down(start.0, start.1);
        session.pointer_moved(end.0, end.1);
        session.pointer_up(end.0, end.1);
    }

    #[test]
    fn test_rotate_clockwise_swaps_dimensions() {
        let mut session = session_with(100, 80);
        session.rotate_clockwise();
        assert_eq!(session.dimensions(), (80, 100));
        assert_eq!(session.rotation_degrees(), 90);
    }

    #[test]
    fn test_rotation_counter_wraps() {
        let mut session = session_with(100, 80);
        for _ in 0..4 {
            session.rotate_clockwise();
        }
        assert_eq!(session.rotation_degrees(), 0);
        assert_eq!(session.dimensions(), (100, 80));

        session.rotate_counterclockwise();
        assert_eq!(session.rotation_degrees(), 270);
    }

    #[test]
    fn test_opposite_rotations_cancel() {
        let mut session = session_with(100, 80);
        session.rotate_clockwise();
        session.rotate_counterclockwise();
        assert_eq!(session.rotation_degrees(), 0);
        assert_eq!(session.dimensions(), (100, 80));
    }

    #[test]
    fn test_crop_lifecycle() {
        let mut session = session_with(100, 80);
        session.set_viewport(100, 80);
        session.enable_crop_mode();
        assert!(session.crop_mode());

        drag(&mut session, (10.0, 10.0), (60.0, 50.0));
        assert!(session.can_apply_crop());

        assert!(session.apply_crop());
        assert_eq!(session.dimensions(), (50, 40));
        assert!(!session.crop_mode());
        assert!(!session.can_apply_crop());
    }

    #[test]
    fn test_small_drag_is_discarded() {
        let mut session = session_with(100, 80);
        session.set_viewport(100, 80);
        session.enable_crop_mode();

        // Exactly the threshold is not enough: both sides must exceed it.
        drag(&mut session, (0.0, 0.0), (10.0, 10.0));
        assert!(!session.can_apply_crop());
        assert_eq!(session.selection(), None);
        // Crop mode stays armed for another attempt.
        assert!(session.crop_mode());

        drag(&mut session, (0.0, 0.0), (30.0, 10.0));
        assert!(!session.can_apply_crop());
    }

    #[test]
    fn test_pointer_events_need_crop_mode() {
        let mut session = session_with(100, 80);
        session.set_viewport(100, 80);

        drag(&mut session, (10.0, 10.0), (60.0, 50.0));
        assert_eq!(session.selection(), None);
        assert!(!session.can_apply_crop());
    }

    #[test]
    fn test_pointer_events_need_viewport() {
        let mut session = session_with(100, 80);
        session.enable_crop_mode();

        drag(&mut session, (10.0, 10.0), (60.0, 50.0));
        assert!(!session.can_apply_crop());
    }

    #[test]
    fn test_new_pointer_down_replaces_ready_selection() {
        let mut session = session_with(100, 80);
        session.set_viewport(100, 80);
        session.enable_crop_mode();

        drag(&mut session, (10.0, 10.0), (60.0, 50.0));
        assert!(session.can_apply_crop());

        session.pointer_down(20.0, 20.0);
        assert!(!session.can_apply_crop());
        // The fresh drag is now the live selection.
        assert_eq!(
            session.selection(),
            Some(SelectionRect {
                x: 20.0,
                y: 20.0,
                width: 0.0,
                height: 0.0
            })
        );
    }

    #[test]
    fn test_disable_crop_mode_discards_selection() {
        let mut session = session_with(100, 80);
        session.set_viewport(100, 80);
        session.enable_crop_mode();
        drag(&mut session, (10.0, 10.0), (60.0, 50.0));

        session.disable_crop_mode();
        assert!(!session.crop_mode());
        assert_eq!(session.selection(), None);
        assert!(!session.apply_crop());
        assert_eq!(session.dimensions(), (100, 80));
    }

    #[test]
    fn test_crop_accounts_for_centering_offset() {
        // 100x80 image centered in a 200x80 viewport: 50 px side margins.
        let mut session = session_with(100, 80);
        session.set_viewport(200, 80);
        session.enable_crop_mode();

        drag(&mut session, (70.0, 10.0), (120.0, 50.0));
        assert!(session.apply_crop());
        assert_eq!(session.dimensions(), (50, 40));
    }

    #[test]
    fn test_crop_scales_to_source_pixels() {
        // Source displayed at half size: display pixels count double.
        let mut session = session_with(200, 160);
        session.set_viewport(100, 80);
        session.enable_crop_mode();

        drag(&mut session, (10.0, 10.0), (40.0, 30.0));
        assert!(session.apply_crop());
        assert_eq!(session.dimensions(), (60, 40));
    }

    #[test]
    fn test_rotation_discards_selection() {
        let mut session = session_with(100, 80);
        session.set_viewport(100, 80);
        session.enable_crop_mode();
        drag(&mut session, (10.0, 10.0), (60.0, 50.0));
        assert!(session.can_apply_crop());

        session.rotate_clockwise();
        assert!(!session.crop_mode());
        assert!(!session.apply_crop());
        assert_eq!(session.dimensions(), (80, 100));
    }

    #[test]
    fn test_rotation_composes_with_crop() {
        let mut session = session_with(100, 80);
        session.set_viewport(100, 80);
        session.enable_crop_mode();
        drag(&mut session, (0.0, 0.0), (50.0, 40.0));
        assert!(session.apply_crop());

        session.rotate_clockwise();
        assert_eq!(session.dimensions(), (40, 50));
    }

    #[test]
    fn test_restore_resets_everything() {
        let mut session = session_with(100, 80);
        session.set_viewport(100, 80);
        session.rotate_clockwise();
        session.enable_crop_mode();
        drag(&mut session, (10.0, 10.0), (60.0, 50.0));
        assert!(session.apply_crop());

        session.restore();
        assert_eq!(session.dimensions(), (100, 80));
        assert_eq!(session.rotation_degrees(), 0);
        assert!(!session.crop_mode());
    }

    #[test]
    fn test_open_and_save_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.png");
        DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 30, Rgb([200, 10, 10])))
            .save_with_format(&source, ImageFormat::Png)
            .unwrap();

        let mut session = EditSession::open(&source).unwrap();
        assert_eq!(session.dimensions(), (40, 30));
        assert_eq!(session.rotation_degrees(), 0);

        session.rotate_clockwise();
        let saved = session.save().unwrap();
        assert_eq!(saved, dir.path().join("photo_editada.png"));

        let reloaded = image::open(&saved).unwrap();
        assert_eq!(reloaded.dimensions(), (30, 40));
    }

    #[test]
    fn test_save_rewrites_non_png_extension() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.jpg");
        DynamicImage::ImageRgb8(RgbImage::from_pixel(24, 18, Rgb([80, 90, 100])))
            .save_with_format(&source, ImageFormat::Jpeg)
            .unwrap();

        let session = EditSession::open(&source).unwrap();
        let saved = session.save().unwrap();

        // The bytes are PNG, so the name must say so.
        assert_eq!(saved, dir.path().join("photo_editada.png"));
        let header = std::fs::read(&saved).unwrap();
        assert_eq!(&header[..8], b"\x89PNG\r\n\x1a\n");
    }

    #[test]
    fn test_saving_edited_file_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo_editada.png");
        DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 20, Rgb([5, 5, 5])))
            .save_with_format(&source, ImageFormat::Png)
            .unwrap();

        let session = EditSession::open(&source).unwrap();
        let saved = session.save().unwrap();
        assert_eq!(saved, source);
        assert!(!dir.path().join("photo_editada_editada.png").exists());
    }

    #[test]
    fn test_save_failure_surfaces_error() {
        let mut session = session_with(10, 10);
        session.source_path = PathBuf::from("/nonexistent/directory/photo.png");
        assert!(matches!(session.save(), Err(EditorError::Save(_))));
    }

    #[test]
    fn test_open_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.png");
        assert!(matches!(
            EditSession::open(&missing),
            Err(EditorError::Open(_))
        ));
    }
}
