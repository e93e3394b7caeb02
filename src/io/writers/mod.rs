//! Local writers for export requests: Float32 GeoTIFF or palette JPEG, each
//! with a world file, a `.prj` for geographic outputs and a JSON sidecar.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::core::export::ExportRequest;
use crate::core::processing::colorize::{Rgb, VisParams, colorize_band};
use crate::error::Result;
use crate::types::OutputFormat;

pub mod jpeg;
pub mod metadata;
pub mod tiff;
pub mod worldfile;

/// Encode into a temporary file beside `output`, then rename it into place.
/// A failed encode leaves `output` untouched.
pub(crate) fn write_replacing<F>(output: &Path, encode: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<&File>) -> Result<()>,
{
    let dir = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let tmp = tempfile::Builder::new()
        .prefix(".canopydiff-")
        .suffix(".part")
        .tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        encode(&mut writer)?;
        writer.flush()?;
    }
    tmp.persist(output).map_err(|e| e.error)?;
    Ok(())
}

/// Files produced by [`export_to_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenFiles {
    pub image: PathBuf,
    pub world_file: PathBuf,
    pub prj: Option<PathBuf>,
    pub sidecar: PathBuf,
}

/// Persist the raster of `request` at its native grid.
///
/// JPEG output is rendered through the request's style, or the default
/// difference palette when it has none; undefined pixels are black.
pub fn export_to_path(
    request: &ExportRequest,
    output: &Path,
    format: OutputFormat,
) -> Result<WrittenFiles> {
    let raster = request.raster();
    let band = raster.single_band()?;
    let grid = raster.grid();
    let space = request.region().space();

    match format {
        OutputFormat::TIFF => self::tiff::write_geotiff_f32(output, grid, band, space)?,
        OutputFormat::JPEG => {
            let fallback = VisParams::difference();
            let style = request.style().unwrap_or(&fallback);
            let rgb = colorize_band(band, style, Rgb::BLACK);
            jpeg::write_rgb_jpeg(output, grid.cols, grid.rows, &rgb)?;
        }
    }

    let world_file = worldfile::write_world_file(output, &grid.transform)?;
    let prj = worldfile::write_prj_file(output, space)?;
    let sidecar = metadata::write_metadata_sidecar(output, request, format)?;
    info!(
        "Exported {} ({}) to {:?}",
        request.description(),
        raster.name(),
        output
    );
    Ok(WrittenFiles {
        image: output.to_path_buf(),
        world_file,
        prj,
        sidecar,
    })
}
