//! Polygon clipping: null every pixel whose center falls outside a region.
//!
//! Pure masking: the grid, band set and inside values are untouched.
use geo::MultiPolygon;
use ndarray::Array2;
use tracing::info;

use crate::core::processing::ops::mask_arrays;
use crate::core::raster::{Band, Raster};
use crate::core::region::RegionOfInterest;
use crate::error::Result;
use crate::types::CoordinateSpace;

/// Pixels of `raster` whose centers lie inside `roi` (boundary inclusive).
pub fn inside_mask(raster: &Raster, roi: &RegionOfInterest) -> Array2<bool> {
    let transform = raster.grid().transform;
    Array2::from_shape_fn(raster.shape(), |(row, col)| {
        roi.contains(transform.pixel_center(col, row))
    })
}

/// Clip every band of `raster` to `roi`.
pub fn clip(raster: &Raster, roi: &RegionOfInterest) -> Raster {
    let keep = inside_mask(raster, roi);
    info!(
        "Clipped {} to region: {} of {} pixel centers inside",
        raster.name(),
        keep.iter().filter(|k| **k).count(),
        keep.len()
    );
    raster.map_bands(|b| Band::new(b.name.clone(), mask_arrays(&b.data, &keep)))
}

/// Validate `shape` as a region and clip to it.
///
/// Fails with [`crate::Error::GeometryInvalid`] for empty or self-intersecting
/// polygons.
pub fn clip_to_polygon(raster: &Raster, shape: MultiPolygon<f64>) -> Result<Raster> {
    let roi = RegionOfInterest::new(shape, CoordinateSpace::Planar)?;
    Ok(clip(raster, &roi))
}
