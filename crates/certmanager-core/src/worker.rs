//! Background conversion worker.
//!
//! One conversion run = one worker thread, started from an immutable
//! [`ConversionJob`] snapshot. The thread never touches shell state; its
//! entire output is the [`WorkerEvent`] channel: log lines with a severity
//! class, a progress percentage after every row, and exactly one final
//! `Finished` flag.
//!
//! The batch is best-effort by design: only a structural problem (unusable
//! spreadsheet) or a top-level I/O failure flips the outcome to `false`.
//! A missing image or a row that fails to convert is logged and skipped,
//! and the run still finishes successfully. Cancellation is not supported;
//! a started batch runs to completion or to its first structural failure.

use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use thiserror::Error;

use crate::config::PdfConfig;
use crate::edited_variant;
use crate::event::EventDirs;
use crate::pdf::{self, PdfError};
use crate::sheet::{self, SheetError};
use crate::transform;

/// Severity class of a worker log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Messages streamed from the worker to the shell.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkerEvent {
    /// Human-readable event line tagged with a severity class.
    Log(LogLevel, String),
    /// Rows processed so far as a percentage, 0-100, non-decreasing.
    /// Emitted once after every row.
    Progress(u8),
    /// Overall outcome. Emitted exactly once, after everything else.
    Finished(bool),
}

/// Immutable description of one conversion run.
#[derive(Debug, Clone)]
pub struct ConversionJob {
    /// Spreadsheet holding the `original`/`nuevo` mapping.
    pub spreadsheet: PathBuf,
    /// Directory the event folders live under.
    pub events_root: PathBuf,
    /// Event whose `imagenes/` and `PDFs/` folders this run uses.
    pub event: String,
    /// PDF rendering options.
    pub config: PdfConfig,
}

impl ConversionJob {
    /// Spawn the worker thread for this job.
    ///
    /// The returned handle owns the event channel; the channel closes when
    /// the worker exits, which happens right after `Finished` is sent.
    pub fn start(self) -> ConversionHandle {
        let (tx, rx) = unbounded();
        let thread = thread::spawn(move || run(&self, &tx));
        ConversionHandle { events: rx, thread }
    }
}

/// Receiving end of a running (or finished) conversion.
pub struct ConversionHandle {
    events: Receiver<WorkerEvent>,
    thread: thread::JoinHandle<()>,
}

impl ConversionHandle {
    /// The worker's event stream. Iterating it blocks until the worker
    /// sends the next event and ends when the channel closes.
    pub fn events(&self) -> &Receiver<WorkerEvent> {
        &self.events
    }

    /// Join the worker thread. Call after draining the event stream.
    pub fn wait(self) -> thread::Result<()> {
        self.thread.join()
    }
}

/// Failures that abort the batch before or between rows.
#[derive(Debug, Error)]
enum BatchError {
    #[error(transparent)]
    Sheet(#[from] SheetError),

    #[error("Failed to prepare event directories: {0}")]
    EventDirs(#[from] std::io::Error),
}

/// Failures confined to a single row.
#[derive(Debug, Error)]
enum RowError {
    #[error("Failed to open image: {0}")]
    Open(#[source] image::ImageError),

    #[error(transparent)]
    Pdf(#[from] PdfError),
}

fn run(job: &ConversionJob, tx: &Sender<WorkerEvent>) {
    let success = match convert_batch(job, tx) {
        Ok(()) => true,
        Err(err) => {
            log(tx, LogLevel::Error, err.to_string());
            false
        }
    };
    let _ = tx.send(WorkerEvent::Finished(success));
}

fn log(tx: &Sender<WorkerEvent>, level: LogLevel, message: impl Into<String>) {
    let _ = tx.send(WorkerEvent::Log(level, message.into()));
}

fn convert_batch(job: &ConversionJob, tx: &Sender<WorkerEvent>) -> Result<(), BatchError> {
    let dirs = EventDirs::new(&job.events_root, &job.event);
    dirs.ensure()?;

    let table = sheet::load_mapping(&job.spreadsheet)?;
    if table.used_positional_fallback() {
        log(
            tx,
            LogLevel::Warning,
            "Columns 'original' and 'nuevo' not found; using the first two columns instead",
        );
    }

    let csv_path = dirs.mapping_csv();
    table.write_csv(&csv_path)?;
    log(
        tx,
        LogLevel::Success,
        format!("Mapping CSV saved to {}", csv_path.display()),
    );

    let total = table.row_count();
    log(tx, LogLevel::Info, format!("Converting {} rows", total));

    let images_dir = dirs.images_dir();
    let pdfs_dir = dirs.pdfs_dir();

    for (index, row) in table.mapping_rows().enumerate() {
        if !row.is_complete() {
            log(
                tx,
                LogLevel::Warning,
                format!("Row {}: empty 'original' or 'nuevo' value, skipped", index + 1),
            );
        } else {
            let source_name = row.source_file_name();
            let target_name = row.target_file_name();
            match resolve_source_image(&images_dir, &source_name) {
                None => log(
                    tx,
                    LogLevel::Error,
                    format!(
                        "Source image not found: {}",
                        images_dir.join(&source_name).display()
                    ),
                ),
                Some(source) => {
                    let target = pdfs_dir.join(&target_name);
                    match convert_row(&source, &target, &job.config) {
                        Ok(()) => log(
                            tx,
                            LogLevel::Success,
                            format!("Converted {} -> {}", source_name, target_name),
                        ),
                        Err(err) => log(
                            tx,
                            LogLevel::Warning,
                            format!("Failed to convert {}: {}", source_name, err),
                        ),
                    }
                }
            }
        }

        let _ = tx.send(WorkerEvent::Progress(progress_percent(index + 1, total)));
    }

    log(tx, LogLevel::Success, "Conversion finished");
    Ok(())
}

/// Locate the image for a row, preferring the edited variant when present.
fn resolve_source_image(images_dir: &Path, file_name: &str) -> Option<PathBuf> {
    let plain = images_dir.join(file_name);
    let edited = edited_variant(&plain);
    if edited.exists() {
        Some(edited)
    } else if plain.exists() {
        Some(plain)
    } else {
        None
    }
}

/// Convert one source image into a single-page PDF.
fn convert_row(source: &Path, target: &Path, config: &PdfConfig) -> Result<(), RowError> {
    let image = image::open(source).map_err(RowError::Open)?;
    let oriented = transform::correct_orientation(image, config.orientation);
    let rgb = transform::flatten_to_rgb(oriented);
    pdf::render_pdf(&rgb, target, config)?;
    Ok(())
}

/// Progress after `done` of `total` rows: `round(100 * done / total)`.
fn progress_percent(done: usize, total: usize) -> u8 {
    (100.0 * done as f64 / total as f64).round() as u8
}
