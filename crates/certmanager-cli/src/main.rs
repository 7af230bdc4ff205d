//! CertManager CLI - Certificate conversion tool
//!
//! Command-line shell over `certmanager-core`: batch-converts the images
//! named in a mapping spreadsheet into per-person PDFs, provides a
//! crop/rotate touch-up command, and lists existing events.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use certmanager_core::editor::MIN_SELECTION_DISPLAY_PX;
use certmanager_core::{
    discover_events, ConversionJob, EditSession, EventDirs, LogLevel, PageOrientation, PdfConfig,
    PdfMargin, PdfQuality, Resolution, WorkerEvent,
};

/// Verbosity level for output control
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verbosity {
    /// Suppress all output except errors
    Quiet,
    /// Normal output (default)
    Normal,
    /// Verbose output with extra details
    Verbose,
}

impl Verbosity {
    /// Create from CLI flags
    const fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Check if output should be shown (not quiet)
    const fn should_show_output(self) -> bool {
        !matches!(self, Self::Quiet)
    }

    /// Check if verbose output is requested
    const fn is_verbose(self) -> bool {
        matches!(self, Self::Verbose)
    }

    /// Default tracing level matching the requested verbosity
    const fn tracing_level(self) -> tracing::Level {
        match self {
            Self::Quiet => tracing::Level::ERROR,
            Self::Normal => tracing::Level::WARN,
            Self::Verbose => tracing::Level::DEBUG,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OrientationArg {
    /// Keep each image's own orientation (default)
    Auto,
    /// Force portrait pages, rotating wide images
    Portrait,
    /// Force landscape pages, rotating tall images
    Landscape,
}

impl From<OrientationArg> for PageOrientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Auto => PageOrientation::Auto,
            OrientationArg::Portrait => PageOrientation::Portrait,
            OrientationArg::Landscape => PageOrientation::Landscape,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum QualityArg {
    /// Largest files, best page image
    High,
    /// Balanced size and quality (default)
    Normal,
    /// Smallest files
    Low,
}

impl From<QualityArg> for PdfQuality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::High => PdfQuality::High,
            QualityArg::Normal => PdfQuality::Normal,
            QualityArg::Low => PdfQuality::Low,
        }
    }
}

/// Crop rectangle in image pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CropArg {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

/// Parse a crop rectangle given as "X,Y,WIDTH,HEIGHT" in image pixels.
fn parse_crop(s: &str) -> Result<CropArg, String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 4 {
        return Err("expected X,Y,WIDTH,HEIGHT".to_string());
    }

    let mut values = [0u32; 4];
    for (slot, part) in values.iter_mut().zip(&parts) {
        let trimmed = part.trim();
        *slot = trimmed
            .parse()
            .map_err(|_| format!("invalid number: '{trimmed}'"))?;
    }

    if values[2] == 0 || values[3] == 0 {
        return Err("crop width and height must be non-zero".to_string());
    }

    Ok(CropArg {
        x: values[0],
        y: values[1],
        width: values[2],
        height: values[3],
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "certmanager",
    about = "Convert certificate images to per-person PDFs",
    long_about = "Convert certificate images to per-person PDFs.\n\
                  \n\
                  Reads an .xlsx/.xls spreadsheet mapping image names ('original') to\n\
                  recipient names ('nuevo'), then renders every staged PNG in the event's\n\
                  imagenes/ folder into a single-page PDF named after the recipient.",
    version
)]
struct Args {
    /// Directory the event folders live under
    #[arg(long, value_name = "DIR", default_value = "eventos", global = true)]
    events_root: PathBuf,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show detailed processing information
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert every mapped image in an event to a PDF
    #[command(long_about = "Convert every mapped image in an event to a PDF.\n\
                      \n\
                      The spreadsheet's first sheet must map image names to recipient\n\
                      names; the first two columns are used when no 'original'/'nuevo'\n\
                      headers are present. Images edited with 'certmanager edit' are\n\
                      preferred over their originals automatically.")]
    Convert {
        /// Spreadsheet with the original/nuevo mapping (.xlsx or .xls)
        #[arg(value_name = "SPREADSHEET")]
        spreadsheet: PathBuf,

        /// Event name; its folders are created under the events root
        #[arg(short, long, value_name = "NAME")]
        event: String,

        /// Copy these images into the event's imagenes/ folder first
        #[arg(long, value_name = "IMAGE", num_args = 1..)]
        stage: Vec<PathBuf>,

        /// Output resolution in DPI (72, 100, 150, or 300)
        #[arg(long, value_name = "DPI", default_value_t = 100)]
        dpi: u32,

        /// Page orientation
        #[arg(long, value_enum, default_value_t = OrientationArg::Auto)]
        orientation: OrientationArg,

        /// Page margin in millimetres (0, 5, 10, or 20)
        #[arg(long, value_name = "MM", default_value_t = 5)]
        margin: u32,

        /// Quality of the page image embedded in each PDF
        #[arg(long, value_enum, default_value_t = QualityArg::Normal)]
        quality: QualityArg,
    },

    /// Crop and rotate an image, saving an edited copy next to it
    #[command(long_about = "Crop and rotate an image, saving an edited copy next to it.\n\
                      \n\
                      The edited copy gets an '_editada' suffix and is picked up by\n\
                      'certmanager convert' in place of the original. Rotations are\n\
                      applied first; the crop rectangle is given in pixels of the\n\
                      rotated image.")]
    Edit {
        /// Image to edit
        #[arg(value_name = "IMAGE")]
        image: PathBuf,

        /// Rotate 90 degrees clockwise this many times
        #[arg(long, value_name = "N", default_value_t = 0)]
        rotate_cw: u32,

        /// Rotate 90 degrees counter-clockwise this many times
        #[arg(long, value_name = "N", default_value_t = 0, conflicts_with = "rotate_cw")]
        rotate_ccw: u32,

        /// Crop rectangle in image pixels, as X,Y,WIDTH,HEIGHT
        #[arg(long, value_name = "RECT", value_parser = parse_crop)]
        crop: Option<CropArg>,
    },

    /// List events under the events root, newest first
    Events,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let verbosity = Verbosity::from_flags(args.quiet, args.verbose);

    // -v/-q pick the default level; RUST_LOG still overrides it.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(verbosity.tracing_level().into()),
        )
        .init();

    match args.command {
        Commands::Convert {
            spreadsheet,
            event,
            stage,
            dpi,
            orientation,
            margin,
            quality,
        } => {
            let config = PdfConfig {
                resolution: Resolution::from_dpi(dpi)
                    .with_context(|| format!("unsupported DPI {dpi}; choose 72, 100, 150, or 300"))?,
                orientation: orientation.into(),
                margin: PdfMargin::from_mm(margin)
                    .with_context(|| format!("unsupported margin {margin} mm; choose 0, 5, 10, or 20"))?,
                quality: quality.into(),
            };
            run_convert(args.events_root, spreadsheet, event, stage, config, verbosity)
        }
        Commands::Edit {
            image,
            rotate_cw,
            rotate_ccw,
            crop,
        } => run_edit(&image, rotate_cw, rotate_ccw, crop, verbosity),
        Commands::Events => run_events(&args.events_root),
    }
}

fn run_convert(
    events_root: PathBuf,
    spreadsheet: PathBuf,
    event: String,
    stage: Vec<PathBuf>,
    config: PdfConfig,
    verbosity: Verbosity,
) -> Result<()> {
    if !spreadsheet.exists() {
        bail!("spreadsheet not found: {}", spreadsheet.display());
    }

    let dirs = EventDirs::new(&events_root, &event);

    if !stage.is_empty() {
        dirs.ensure().with_context(|| {
            format!("failed to create event folders under {}", dirs.root().display())
        })?;
        let staged = dirs
            .stage_images(&stage)
            .context("failed to stage images")?;
        tracing::debug!(count = staged.len(), "staged images");
        if verbosity.should_show_output() {
            println!(
                "{} {} image(s) copied into {}",
                "Staged:".green().bold(),
                staged.len(),
                dirs.images_dir().display()
            );
        }
    }

    let handle = ConversionJob {
        spreadsheet,
        events_root,
        event,
        config,
    }
    .start();

    // Worker progress is already a percentage, so the bar runs 0-100.
    let progress = if verbosity.should_show_output() {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .expect("template is compile-time constant")
                .progress_chars("█▓▒░  "),
        );
        pb
    } else {
        ProgressBar::hidden()
    };

    let mut succeeded = false;
    for update in handle.events().iter() {
        match update {
            WorkerEvent::Log(level, message) => print_log(&progress, verbosity, level, &message),
            WorkerEvent::Progress(percent) => progress.set_position(u64::from(percent)),
            WorkerEvent::Finished(ok) => succeeded = ok,
        }
    }
    let _ = handle.wait();
    progress.finish_and_clear();

    if !succeeded {
        bail!("conversion finished with errors");
    }
    if verbosity.should_show_output() {
        println!(
            "{} PDFs written to {}",
            "Done:".green().bold(),
            dirs.pdfs_dir().display()
        );
    }
    Ok(())
}

fn print_log(progress: &ProgressBar, verbosity: Verbosity, level: LogLevel, message: &str) {
    match level {
        LogLevel::Error => {
            let line = format!("{} {}", "Error:".red().bold(), message);
            if verbosity.should_show_output() {
                progress.println(line);
            } else {
                eprintln!("{line}");
            }
        }
        LogLevel::Warning if verbosity.should_show_output() => {
            progress.println(format!("{} {}", "Warning:".yellow().bold(), message));
        }
        LogLevel::Success if verbosity.should_show_output() => {
            progress.println(format!("{} {}", "OK:".green().bold(), message));
        }
        LogLevel::Info if verbosity.is_verbose() => {
            progress.println(format!("{} {}", "Info:".blue(), message));
        }
        _ => {}
    }
}

fn run_edit(
    image: &Path,
    rotate_cw: u32,
    rotate_ccw: u32,
    crop: Option<CropArg>,
    verbosity: Verbosity,
) -> Result<()> {
    let mut session = EditSession::open(image)
        .with_context(|| format!("failed to open {}", image.display()))?;

    for _ in 0..rotate_cw {
        session.rotate_clockwise();
    }
    for _ in 0..rotate_ccw {
        session.rotate_counterclockwise();
    }

    if let Some(rect) = crop {
        crop_session(&mut session, rect)?;
    }

    let saved = session.save().context("failed to save edited image")?;
    tracing::debug!(
        rotation = session.rotation_degrees(),
        cropped = crop.is_some(),
        "edit saved"
    );
    if verbosity.should_show_output() {
        println!("{} {}", "Saved:".green().bold(), saved.display());
    }
    if verbosity.is_verbose() {
        let (width, height) = session.dimensions();
        println!("  {}", format!("{width}x{height} px, rotation {} degrees", session.rotation_degrees()).dimmed());
    }
    Ok(())
}

/// Drive the session's selection machinery with a 1:1 viewport so the crop
/// rectangle is taken directly in image pixels.
fn crop_session(session: &mut EditSession, rect: CropArg) -> Result<()> {
    let (width, height) = session.dimensions();
    let fits = rect
        .x
        .checked_add(rect.width)
        .is_some_and(|end| end <= width)
        && rect
            .y
            .checked_add(rect.height)
            .is_some_and(|end| end <= height);
    if !fits {
        bail!(
            "crop rectangle {},{},{},{} exceeds the {}x{} image",
            rect.x,
            rect.y,
            rect.width,
            rect.height,
            width,
            height
        );
    }

    session.set_viewport(width, height);
    session.enable_crop_mode();
    session.pointer_down(f64::from(rect.x), f64::from(rect.y));
    let end_x = f64::from(rect.x) + f64::from(rect.width);
    let end_y = f64::from(rect.y) + f64::from(rect.height);
    session.pointer_moved(end_x, end_y);
    session.pointer_up(end_x, end_y);

    if !session.apply_crop() {
        bail!(
            "crop rejected; both sides must span more than {} pixels",
            MIN_SELECTION_DISPLAY_PX
        );
    }
    Ok(())
}

fn run_events(events_root: &Path) -> Result<()> {
    let events = discover_events(events_root)
        .with_context(|| format!("failed to read {}", events_root.display()))?;

    if events.is_empty() {
        println!("No events under {}", events_root.display());
        return Ok(());
    }
    for name in events {
        println!("{name}");
    }
    Ok(())
}
