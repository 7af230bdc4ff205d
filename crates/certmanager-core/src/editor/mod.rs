//! Image editor: 90°-step rotation and a single rectangular crop.
//!
//! The editor is split in two layers:
//! - `geometry`: pure display-to-source coordinate mapping, testable
//!   without any UI,
//! - `session`: the stateful [`EditSession`] a shell drives with pointer
//!   events and button actions.
//!
//! # Interaction Model
//!
//! The shell reports its viewport size, forwards pointer down/move/up in
//! display coordinates, and calls `apply_crop`/`rotate_*`/`restore`/`save`.
//! Everything pixel-related (scaling for display excluded) happens here;
//! the shell never computes image coordinates itself.

mod geometry;
mod session;

pub use geometry::{
    centering_offset, fit_dimensions, map_selection_to_source, CropRect, SelectionRect,
};
pub use session::{EditSession, EditorError, MIN_SELECTION_DISPLAY_PX};
