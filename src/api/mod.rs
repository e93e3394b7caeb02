//! High-level, ergonomic library API: run the full two-epoch change workflow
//! against any [`TileArchive`], then derive the export request and display
//! layers from its result. Prefer these entrypoints over the per-stage
//! processing modules when integrating CANOPYDIFF.
use std::sync::Arc;

use tracing::info;

use crate::core::archive::TileArchive;
use crate::core::export::{DisplayLayer, ExportRequest};
use crate::core::params::ChangeParams;
use crate::core::processing::change::{ChangeSummary, difference};
use crate::core::processing::clip::clip;
use crate::core::processing::colorize::VisParams;
use crate::core::processing::pipeline::{EpochProducts, process_epoch};
use crate::core::raster::{GridSpec, Raster};
use crate::core::region::{DateRange, RegionOfInterest};
use crate::error::Result;

/// Every product of one change-detection run.
#[derive(Debug, Clone)]
pub struct ChangeResult {
    /// Working grid shared by both epochs
    pub grid: GridSpec,
    pub earlier: EpochProducts,
    pub later: EpochProducts,
    /// `later - earlier` over the whole grid
    pub difference: Raster,
    /// `difference` clipped to the region of interest
    pub clipped: Arc<Raster>,
    pub roi: RegionOfInterest,
    pub summary: ChangeSummary,
}

/// Run both epochs onto a common grid, difference them and clip to `roi`.
///
/// Without `roi` the result is clipped to the bounding box of `params`. A
/// working grid larger than `params.max_grid_pixels` fails with
/// [`Error::PixelBudgetExceeded`](crate::Error::PixelBudgetExceeded). The
/// two epoch branches run concurrently; the archive only needs to be `Sync`.
pub fn detect_canopy_change<A: TileArchive + ?Sized>(
    archive: &A,
    params: &ChangeParams,
    roi: Option<&RegionOfInterest>,
) -> Result<ChangeResult> {
    let grid = params.working_grid()?;
    info!(
        "Canopy change over {}: {} vs {} on {}",
        params.region, params.earlier, params.later, grid
    );

    let (earlier, later) = rayon::join(
        || process_epoch(archive, params, &params.earlier, "earlier", grid),
        || process_epoch(archive, params, &params.later, "later", grid),
    );
    let (earlier, later) = (earlier?, later?);

    let difference = difference(&earlier.mask, &later.mask)?;
    let roi = match roi {
        Some(roi) => roi.clone(),
        None => RegionOfInterest::from_bbox(&params.region),
    };
    let clipped = Arc::new(clip(&difference, &roi));
    let summary = ChangeSummary::from_difference(&clipped)?;
    info!("Canopy change inside region: {}", summary);

    Ok(ChangeResult {
        grid,
        earlier,
        later,
        difference,
        clipped,
        roi,
        summary,
    })
}

/// Export request for the clipped difference over the bounding box of
/// `params`, using its scale, ceiling, description and style.
pub fn build_export(result: &ChangeResult, params: &ChangeParams) -> Result<ExportRequest> {
    ExportRequest::builder(
        Arc::clone(&result.clipped),
        RegionOfInterest::from_bbox(&params.region),
    )
    .scale(params.export.scale)
    .max_pixels(params.export.max_pixels)
    .description(params.export.description.clone())
    .style(params.style.clone())
    .build()
}

/// Display layers: vegetation cover of each epoch, then the change layer.
pub fn display_layers(result: &ChangeResult, params: &ChangeParams) -> Result<Vec<DisplayLayer>> {
    let cover = |epoch: &EpochProducts, range: &DateRange| {
        DisplayLayer::new(
            epoch.mask.clone(),
            result.roi.clone(),
            VisParams::vegetation(),
            format!("Vegetation cover {}", range),
        )
    };
    Ok(vec![
        cover(&result.earlier, &params.earlier)?,
        cover(&result.later, &params.later)?,
        DisplayLayer::new(
            Arc::clone(&result.clipped),
            result.roi.clone(),
            params.style.clone(),
            format!(
                "Vegetation difference {} to {}",
                params.earlier.start(),
                params.later.start()
            ),
        )?,
    ])
}
