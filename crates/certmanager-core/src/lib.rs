//! CertManager Core - Certificate conversion library
//!
//! This crate provides the core functionality for CertManager: loading the
//! original/nuevo mapping spreadsheet, batch-converting certificate images
//! into single-page PDFs on a background worker, and an interactive
//! crop/rotate session for touching up an image before conversion.

pub mod config;
pub mod editor;
pub mod event;
pub mod pdf;
pub mod sheet;
pub mod transform;
pub mod worker;

pub use config::{PageOrientation, PdfConfig, PdfMargin, PdfQuality, Resolution};
pub use editor::EditSession;
pub use event::{discover_events, EventDirs};
pub use worker::{ConversionHandle, ConversionJob, LogLevel, WorkerEvent};

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Marker inserted before the extension of an edited image's file name.
pub const EDITED_MARKER: &str = "_editada";

/// Edited-variant path for an image: `cert2.png` -> `cert2_editada.png`.
pub fn edited_variant(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(OsStr::to_str).unwrap_or_default();
    let name = match path.extension().and_then(OsStr::to_str) {
        Some(ext) => format!("{}{}.{}", stem, EDITED_MARKER, ext),
        None => format!("{}{}", stem, EDITED_MARKER),
    };
    path.with_file_name(name)
}

/// Save path for an editing session opened on `path`.
///
/// Same as [`edited_variant`], except a file that already carries the
/// marker keeps its name, so re-editing an edited image never stacks
/// markers.
pub fn edited_save_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(OsStr::to_str).unwrap_or_default();
    if stem.ends_with(EDITED_MARKER) {
        path.to_path_buf()
    } else {
        edited_variant(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edited_variant_inserts_marker() {
        assert_eq!(
            edited_variant(Path::new("eventos/boda/imagenes/cert2.png")),
            PathBuf::from("eventos/boda/imagenes/cert2_editada.png")
        );
    }

    #[test]
    fn test_edited_variant_without_extension() {
        assert_eq!(edited_variant(Path::new("cert2")), PathBuf::from("cert2_editada"));
    }

    #[test]
    fn test_edited_variant_keeps_inner_dots() {
        assert_eq!(
            edited_variant(Path::new("scan.v2.png")),
            PathBuf::from("scan.v2_editada.png")
        );
    }

    #[test]
    fn test_edited_save_path_is_idempotent() {
        let edited = edited_save_path(Path::new("imagenes/cert2.png"));
        assert_eq!(edited, PathBuf::from("imagenes/cert2_editada.png"));
        assert_eq!(edited_save_path(&edited), edited);
    }
}
