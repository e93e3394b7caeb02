//! Mosaic compositing: merge overlapping tiles into one seamless raster.
//!
//! Compositing is last-on-top: for every output pixel the value comes from the
//! latest tile in input order whose footprint and grid cover the pixel center.
//! Samples are taken nearest-neighbour; nothing is interpolated. Callers that
//! need another policy (date order, cloud score) sort the input first.
use std::collections::BTreeSet;

use geo::{BoundingRect, Intersects, Rect};
use tracing::{debug, info, warn};

use crate::core::archive::Tile;
use crate::core::raster::{Band, GridSpec, Raster, Sample};
use crate::error::{Error, Result};

use ndarray::Array2;

#[derive(Debug, Clone, Default)]
pub struct MosaicOptions {
    /// Output grid; defaults to the union of tile footprints at the first
    /// tile's resolution.
    pub extent: Option<GridSpec>,
    /// Bands to carry, in output order; defaults to the first tile's bands.
    /// Also names the bands of an empty mosaic.
    pub bands: Option<Vec<String>>,
    /// Output raster name; defaults to `"mosaic"`.
    pub name: Option<String>,
}

/// Sort tiles by acquisition date (stable), so the most recent lands on top.
pub fn order_by_acquisition(mut tiles: Vec<Tile>) -> Vec<Tile> {
    tiles.sort_by_key(|t| t.acquired);
    tiles
}

fn band_set(tile: &Tile) -> BTreeSet<&str> {
    tile.raster.band_names().into_iter().collect()
}

fn join(names: &BTreeSet<&str>) -> String {
    names.iter().copied().collect::<Vec<_>>().join(", ")
}

fn union_extent(tiles: &[Tile]) -> Result<GridSpec> {
    let rect = tiles
        .iter()
        .filter_map(|t| t.footprint.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
                (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
            )
        })
        .ok_or_else(|| Error::invalid_argument("tiles", "no tile has a footprint"))?;
    GridSpec::covering_rect(rect, &tiles[0].raster.grid().transform)
}

/// Output pixel window `(row_lo..row_hi, col_lo..col_hi)` touched by `rect`.
fn window(grid: &GridSpec, rect: Rect<f64>) -> (usize, usize, usize, usize) {
    let t = &grid.transform;
    let (c0, r0) = t.world_to_pixel(rect.min().x, rect.min().y);
    let (c1, r1) = t.world_to_pixel(rect.max().x, rect.max().y);
    let clamp = |lo: f64, hi: f64, n: usize| {
        let lo = lo.floor().max(0.0).min(n as f64) as usize;
        let hi = hi.ceil().max(0.0).min(n as f64) as usize;
        (lo, hi)
    };
    let (row_lo, row_hi) = clamp(r0.min(r1), r0.max(r1), grid.rows);
    let (col_lo, col_hi) = clamp(c0.min(c1), c0.max(c1), grid.cols);
    (row_lo, row_hi, col_lo, col_hi)
}

/// Composite `tiles` into a single raster.
///
/// Fails with [`Error::BandMismatch`] if the tiles do not all carry the same
/// band set. An empty input yields a fully undefined mosaic over
/// `options.extent` (0×0 when no extent is given).
pub fn build_mosaic(tiles: &[Tile], options: &MosaicOptions) -> Result<Raster> {
    let name = options.name.as_deref().unwrap_or("mosaic");

    let Some(first) = tiles.first() else {
        let grid = options.extent.unwrap_or_else(GridSpec::empty);
        let bands = options.bands.clone().unwrap_or_default();
        warn!("Empty tile sequence; mosaic {} over {} is fully undefined", name, grid);
        return Ok(Raster::undefined(name, grid, &bands));
    };

    let expected = band_set(first);
    for tile in &tiles[1..] {
        let found = band_set(tile);
        if found != expected {
            return Err(Error::BandMismatch {
                tile: tile.id.clone(),
                expected: join(&expected),
                found: join(&found),
            });
        }
    }

    let selected: Vec<String> = match &options.bands {
        Some(bands) => bands.clone(),
        None => first.raster.band_names().iter().map(|b| b.to_string()).collect(),
    };
    for band in &selected {
        first.raster.require_band(band)?;
    }

    let grid = match options.extent {
        Some(grid) => grid,
        None => union_extent(tiles)?,
    };
    let mut out: Vec<Array2<Sample>> = selected
        .iter()
        .map(|_| Array2::from_elem(grid.shape(), None))
        .collect();

    for tile in tiles {
        let Some(rect) = tile.footprint.bounding_rect() else {
            debug!("Skipping tile {} with empty footprint", tile.id);
            continue;
        };
        let sources: Vec<&Band> = selected
            .iter()
            .map(|b| tile.raster.require_band(b))
            .collect::<Result<_>>()?;
        let tile_grid = tile.raster.grid();
        let (row_lo, row_hi, col_lo, col_hi) = window(&grid, rect);

        let mut written = 0usize;
        for row in row_lo..row_hi {
            for col in col_lo..col_hi {
                let center = grid.transform.pixel_center(col, row);
                if !tile.footprint.intersects(&center) {
                    continue;
                }
                let Some(src) = tile_grid.pixel_at(center.x, center.y) else {
                    continue;
                };
                for (dst, band) in out.iter_mut().zip(&sources) {
                    dst[[row, col]] = band.data[src];
                }
                written += 1;
            }
        }
        debug!("Tile {} ({}) covers {} output pixels", tile.id, tile.acquired, written);
    }

    let bands = selected
        .into_iter()
        .zip(out)
        .map(|(name, data)| Band::new(name, data))
        .collect();
    let mosaic = Raster::new(name, grid, bands)?;
    info!("Built mosaic {} from {} tiles over {}", name, tiles.len(), grid);
    Ok(mosaic)
}
