use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::info;

use crate::core::export::ExportRequest;
use crate::core::processing::colorize::VisParams;
use crate::error::Result;
use crate::types::{CoordinateSpace, OutputFormat};

/// Contents of the JSON sidecar written next to every exported image.
#[derive(Debug, Clone, Serialize)]
pub struct ExportMetadata<'a> {
    pub description: &'a str,
    pub raster: &'a str,
    pub bands: Vec<&'a str>,
    pub format: OutputFormat,
    pub rows: usize,
    pub cols: usize,
    pub geotransform: [f64; 6],
    pub crs: Option<&'static str>,
    pub nodata: Option<&'static str>,
    /// Requested export resolution; the local writer keeps the native grid
    pub scale: f64,
    pub estimated_pixels: u64,
    pub max_pixels: u64,
    pub style: Option<&'a VisParams>,
    pub created: String,
    pub conversion_tool: &'static str,
    pub conversion_version: &'static str,
}

impl<'a> ExportMetadata<'a> {
    pub fn from_request(request: &'a ExportRequest, format: OutputFormat) -> Self {
        let raster = request.raster();
        let grid = raster.grid();
        Self {
            description: request.description(),
            raster: raster.name(),
            bands: raster.band_names(),
            format,
            rows: grid.rows,
            cols: grid.cols,
            geotransform: grid.transform.to_gdal(),
            crs: match request.region().space() {
                CoordinateSpace::Geographic => Some("EPSG:4326"),
                CoordinateSpace::Planar => None,
            },
            nodata: match format {
                OutputFormat::TIFF => Some("nan"),
                OutputFormat::JPEG => None,
            },
            scale: request.scale(),
            estimated_pixels: request.estimated_pixels(),
            max_pixels: request.max_pixels(),
            style: request.style(),
            created: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            conversion_tool: env!("CARGO_PKG_NAME"),
            conversion_version: env!("CARGO_PKG_VERSION"),
        }
    }
}

/// Write `<output>.json` describing the export.
pub fn write_metadata_sidecar(
    output_path: &Path,
    request: &ExportRequest,
    format: OutputFormat,
) -> Result<PathBuf> {
    let sidecar_path = output_path.with_extension("json");
    let metadata = ExportMetadata::from_request(request, format);
    std::fs::write(&sidecar_path, serde_json::to_string_pretty(&metadata)?)?;
    info!("Created metadata sidecar: {:?}", sidecar_path);
    Ok(sidecar_path)
}
