//! Event directory management.
//!
//! An event is a named project folder under a common root, with three
//! fixed subdirectories: `csv/` for the normalized mapping, `imagenes/`
//! for source images (and their edited variants), and `PDFs/` for the
//! generated output. Directories are created on demand and never deleted
//! here.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const CSV_DIR: &str = "csv";
const IMAGES_DIR: &str = "imagenes";
const PDFS_DIR: &str = "PDFs";
const MAPPING_CSV: &str = "imagenes.csv";

/// Path bundle for one event's directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDirs {
    event_dir: PathBuf,
}

impl EventDirs {
    /// Resolve the directory set for `name` under `events_root`.
    ///
    /// No filesystem access happens here; call [`EventDirs::ensure`] to
    /// create the tree.
    pub fn new(events_root: impl AsRef<Path>, name: &str) -> Self {
        Self {
            event_dir: events_root.as_ref().join(name),
        }
    }

    /// The event's own directory.
    pub fn root(&self) -> &Path {
        &self.event_dir
    }

    /// Directory holding the normalized mapping CSV.
    pub fn csv_dir(&self) -> PathBuf {
        self.event_dir.join(CSV_DIR)
    }

    /// Directory holding source images and edited variants.
    pub fn images_dir(&self) -> PathBuf {
        self.event_dir.join(IMAGES_DIR)
    }

    /// Directory receiving the generated PDFs.
    pub fn pdfs_dir(&self) -> PathBuf {
        self.event_dir.join(PDFS_DIR)
    }

    /// Path of the normalized mapping CSV (`csv/imagenes.csv`).
    pub fn mapping_csv(&self) -> PathBuf {
        self.csv_dir().join(MAPPING_CSV)
    }

    /// Create the event directory and its three subdirectories.
    ///
    /// Idempotent: existing directories are left untouched.
    pub fn ensure(&self) -> io::Result<()> {
        fs::create_dir_all(self.csv_dir())?;
        fs::create_dir_all(self.images_dir())?;
        fs::create_dir_all(self.pdfs_dir())?;
        Ok(())
    }

    /// Copy the given files into the event's image directory, keeping
    /// their file names. Returns the destination paths in input order.
    pub fn stage_images(&self, sources: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
        let images_dir = self.images_dir();
        let mut staged = Vec::with_capacity(sources.len());
        for source in sources {
            let name = source.file_name().ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("not a file path: {}", source.display()),
                )
            })?;
            let dest = images_dir.join(name);
            fs::copy(source, &dest)?;
            staged.push(dest);
        }
        Ok(staged)
    }
}

/// List event names under `events_root`, newest modification first.
///
/// Non-directories are skipped. A missing root is treated as "no events"
/// rather than an error.
pub fn discover_events(events_root: impl AsRef<Path>) -> io::Result<Vec<String>> {
    let events_root = events_root.as_ref();
    if !events_root.exists() {
        return Ok(Vec::new());
    }

    let mut entries: Vec<(String, SystemTime)> = Vec::new();
    for entry in fs::read_dir(events_root)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        entries.push((name, modified));
    }

    entries.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(entries.into_iter().map(|(name, _)| name).collect())
}
