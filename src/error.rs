//! Crate-level error type and `Result` alias for stable, structured error handling.
//! Carries the semantic failures of each pipeline stage (region, dates, bands,
//! extents, geometry, pixel budget) and converts underlying I/O, TIFF and JSON errors.
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid region: {reason}")]
    InvalidRegion { reason: String },

    #[error("Invalid date range: start {start} must be before end {end}")]
    InvalidDateRange { start: String, end: String },

    #[error("Band mismatch: tile {tile} has bands [{found}], expected [{expected}]")]
    BandMismatch {
        tile: String,
        expected: String,
        found: String,
    },

    #[error("Extent mismatch: {earlier} vs {later}")]
    ExtentMismatch { earlier: String, later: String },

    #[error("Invalid geometry: {reason}")]
    GeometryInvalid { reason: String },

    #[error("Pixel budget exceeded: estimated {estimated} pixels, ceiling {ceiling}")]
    PixelBudgetExceeded { estimated: u64, ceiling: u64 },

    #[error("Band {band} not found in raster {raster}")]
    MissingBand { band: String, raster: String },

    #[error("Invalid argument: {arg}={value}")]
    InvalidArgument { arg: &'static str, value: String },

    #[error("Archive query failed: {0}")]
    Archive(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("External error: {0}")]
    External(String),
}

impl Error {
    pub fn external<E: std::fmt::Display>(e: E) -> Self {
        Error::External(e.to_string())
    }

    pub(crate) fn invalid_argument<V: std::fmt::Display>(arg: &'static str, value: V) -> Self {
        Error::InvalidArgument {
            arg,
            value: value.to_string(),
        }
    }
}
