//! PDF render configuration.
//!
//! A conversion run receives an immutable [`PdfConfig`] snapshot; the worker
//! never reads live shell state. Every knob is a closed set of values
//! mirroring what the shell offers, so invalid configurations are
//! unrepresentable.

/// Millimeters to PDF points, as used for the margin setting.
pub const MM_TO_POINTS: f32 = 2.83;

/// Output resolution passed to the PDF encoder.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub enum Resolution {
    /// 72 dots per inch
    Dpi72,
    /// 100 dots per inch
    #[default]
    Dpi100,
    /// 150 dots per inch
    Dpi150,
    /// 300 dots per inch
    Dpi300,
}

impl Resolution {
    /// Parse a raw DPI value; only 72, 100, 150 and 300 are accepted.
    pub fn from_dpi(dpi: u32) -> Option<Self> {
        match dpi {
            72 => Some(Self::Dpi72),
            100 => Some(Self::Dpi100),
            150 => Some(Self::Dpi150),
            300 => Some(Self::Dpi300),
            _ => None,
        }
    }

    /// The configured value in dots per inch.
    pub fn dpi(&self) -> u32 {
        match self {
            Self::Dpi72 => 72,
            Self::Dpi100 => 100,
            Self::Dpi150 => 150,
            Self::Dpi300 => 300,
        }
    }
}

/// Requested page orientation.
///
/// `Portrait` and `Landscape` rotate images whose aspect does not match;
/// `Auto` keeps every image as-is.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub enum PageOrientation {
    /// Keep the image orientation unchanged
    #[default]
    Auto,
    /// Rotate images that are wider than tall
    Portrait,
    /// Rotate images that are taller than wide
    Landscape,
}

/// Page margin setting in millimeters.
///
/// The value is carried through the configuration and convertible to points,
/// but the PDF writer does not currently consume it; pages are sized to the
/// exact image footprint.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub enum PdfMargin {
    /// No margin
    None,
    /// 5 mm
    #[default]
    Mm5,
    /// 10 mm
    Mm10,
    /// 20 mm
    Mm20,
}

impl PdfMargin {
    /// Parse a raw millimeter value; only 0, 5, 10 and 20 are accepted.
    pub fn from_mm(mm: u32) -> Option<Self> {
        match mm {
            0 => Some(Self::None),
            5 => Some(Self::Mm5),
            10 => Some(Self::Mm10),
            20 => Some(Self::Mm20),
            _ => None,
        }
    }

    /// The configured value in millimeters.
    pub fn millimeters(&self) -> u32 {
        match self {
            Self::None => 0,
            Self::Mm5 => 5,
            Self::Mm10 => 10,
            Self::Mm20 => 20,
        }
    }

    /// The margin in PDF points (`mm * 2.83`).
    pub fn points(&self) -> f32 {
        self.millimeters() as f32 * MM_TO_POINTS
    }
}

/// Output quality preset.
///
/// Maps to the JPEG quality of the embedded page image.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub enum PdfQuality {
    /// Largest output, best fidelity
    High,
    #[default]
    Normal,
    /// Smallest output, visible compression
    Low,
}

impl PdfQuality {
    /// JPEG quality used when encoding the page image.
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            Self::High => 95,
            Self::Normal => 50,
            Self::Low => 30,
        }
    }
}

/// Immutable configuration snapshot for one conversion run.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
pub struct PdfConfig {
    /// Resolution passed to the PDF encoder
    pub resolution: Resolution,
    /// Requested page orientation
    pub orientation: PageOrientation,
    /// Page margin setting (carried, not applied)
    pub margin: PdfMargin,
    /// Output quality preset
    pub quality: PdfQuality,
}

impl PdfConfig {
    /// Create a configuration with the default values
    /// (100 dpi, auto orientation, 5 mm margin, normal quality).
    pub fn new() -> Self {
        Self::default()
    }
}
