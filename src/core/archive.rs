//! Archive records and the query boundary the pipeline reads tiles through.
use std::collections::HashMap;

use chrono::NaiveDate;
use geo::Polygon;

use crate::core::raster::Raster;
use crate::core::region::{BoundingBox, DateRange};
use crate::error::{Error, Result};

/// One captured image: acquisition date, footprint and band stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: String,
    pub acquired: NaiveDate,
    pub footprint: Polygon<f64>,
    pub raster: Raster,
}

impl Tile {
    /// Tile whose footprint is the full extent of its raster.
    pub fn new(id: impl Into<String>, acquired: NaiveDate, raster: Raster) -> Self {
        let footprint = raster.grid().footprint();
        Self {
            id: id.into(),
            acquired,
            footprint,
            raster,
        }
    }

    pub fn with_footprint(mut self, footprint: Polygon<f64>) -> Self {
        self.footprint = footprint;
        self
    }
}

/// Read-only source of tiles, e.g. an imagery catalogue.
///
/// Implementations should return tiles intersecting `bbox` and acquired inside
/// `range`. An empty vector means "nothing matched"; `Err` means the query itself
/// failed.
pub trait TileArchive: Send + Sync {
    fn query_tiles(&self, archive: &str, bbox: &BoundingBox, range: &DateRange)
    -> Result<Vec<Tile>>;
}

/// Archive held entirely in memory, keyed by collection name.
#[derive(Debug, Default, Clone)]
pub struct InMemoryArchive {
    collections: HashMap<String, Vec<Tile>>,
}

impl InMemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tile to `collection`, creating it if needed. Query results keep
    /// insertion order.
    pub fn insert(&mut self, collection: impl Into<String>, tile: Tile) {
        self.collections
            .entry(collection.into())
            .or_default()
            .push(tile);
    }

    pub fn with_tile(mut self, collection: impl Into<String>, tile: Tile) -> Self {
        self.insert(collection, tile);
        self
    }
}

impl TileArchive for InMemoryArchive {
    fn query_tiles(
        &self,
        archive: &str,
        bbox: &BoundingBox,
        range: &DateRange,
    ) -> Result<Vec<Tile>> {
        let tiles = self
            .collections
            .get(archive)
            .ok_or_else(|| Error::Archive(format!("unknown collection {archive}")))?;
        Ok(tiles
            .iter()
            .filter(|t| range.contains(t.acquired) && bbox.intersects(&t.footprint))
            .cloned()
            .collect())
    }
}
