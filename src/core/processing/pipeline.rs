//! One epoch of the change workflow: select, mosaic, index, threshold.
use tracing::info;

use crate::core::archive::TileArchive;
use crate::core::params::ChangeParams;
use crate::core::processing::index::ndvi;
use crate::core::processing::mask::threshold_mask;
use crate::core::processing::mosaic::{MosaicOptions, build_mosaic, order_by_acquisition};
use crate::core::processing::select::select_tiles;
use crate::core::raster::{GridSpec, Raster};
use crate::core::region::DateRange;
use crate::error::Result;

/// Intermediate products of one epoch.
#[derive(Debug, Clone)]
pub struct EpochProducts {
    pub label: String,
    /// Number of tiles composited
    pub tiles: usize,
    pub mosaic: Raster,
    pub index: Raster,
    pub mask: Raster,
}

/// Run one epoch onto `grid`.
///
/// Tiles are composited in archive order, the last covering tile on top;
/// `params.order_by_acquisition` puts the most recent capture on top instead.
/// Every product is aligned to `grid`, which lets two epochs be
/// differenced directly.
pub fn process_epoch<A: TileArchive + ?Sized>(
    archive: &A,
    params: &ChangeParams,
    range: &DateRange,
    label: &str,
    grid: GridSpec,
) -> Result<EpochProducts> {
    let mut tiles = select_tiles(archive, &params.archive, &params.region, range)?;
    if params.order_by_acquisition {
        tiles = order_by_acquisition(tiles);
    }
    let options = MosaicOptions {
        extent: Some(grid),
        bands: Some(vec![params.bands.red.clone(), params.bands.nir.clone()]),
        name: Some(format!("{label} mosaic")),
    };
    let mosaic = build_mosaic(&tiles, &options)?;
    let index = ndvi(&mosaic, &params.bands.nir, &params.bands.red, "NDVI")?;
    let mask = threshold_mask(&index, params.threshold, "trees")?.renamed(format!("{label} trees"));
    info!("Epoch {} ({}) done: {} tiles onto {}", label, range, tiles.len(), grid);
    Ok(EpochProducts {
        label: label.to_string(),
        tiles: tiles.len(),
        mosaic,
        index,
        mask,
    })
}
