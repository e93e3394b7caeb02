//! Region selection: scope an archive to a bounding box and date range.
use tracing::{debug, info, warn};

use crate::core::archive::{Tile, TileArchive};
use crate::core::region::{BoundingBox, DateRange};
use crate::error::Result;

/// Query `archive` for tiles of `collection` intersecting `bbox` and acquired in
/// `range`, preserving archive order.
///
/// Records the archive returns that do not actually match are dropped, so the
/// result never contains false positives. An empty result is not an error.
pub fn select_tiles<A: TileArchive + ?Sized>(
    archive: &A,
    collection: &str,
    bbox: &BoundingBox,
    range: &DateRange,
) -> Result<Vec<Tile>> {
    let returned = archive.query_tiles(collection, bbox, range)?;
    let total = returned.len();

    let tiles: Vec<Tile> = returned
        .into_iter()
        .filter(|tile| {
            let keep = range.contains(tile.acquired) && bbox.intersects(&tile.footprint);
            if !keep {
                debug!(
                    "Dropping tile {} acquired {} outside {} / {}",
                    tile.id, tile.acquired, bbox, range
                );
            }
            keep
        })
        .collect();

    if tiles.is_empty() {
        warn!("No tiles in {} for {} during {}", collection, bbox, range);
    } else {
        info!(
            "Selected {} of {} tiles from {} for {}",
            tiles.len(),
            total,
            collection,
            range
        );
    }
    Ok(tiles)
}
