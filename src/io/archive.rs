//! Tile archive backed by a JSON manifest and single-band TIFF files.
//!
//! ```json
//! {"archives": {"naip": [
//!   {"id": "m_3907501_ne", "acquired": "2017-08-14",
//!    "transform": [-75.28, 1e-5, 0, 40.14, 0, -1e-5],
//!    "bands": {"R": "2017/ne_r.tif", "N": "2017/ne_n.tif"}}
//! ]}}
//! ```
//!
//! `transform` may be omitted when the band files carry GeoTIFF tags;
//! `footprint` (a ring of `[x, y]`) defaults to the grid extent. Band files
//! are only read for entries whose date and footprint match the query.
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use geo::{LineString, Polygon};
use serde::Deserialize;
use tracing::{debug, info};

use crate::core::archive::{Tile, TileArchive};
use crate::core::raster::{GeoTransform, GridSpec, Raster};
use crate::core::region::{BoundingBox, DateRange};
use crate::error::{Error, Result};
use crate::io::writers::tiff::read_tiff_band;

#[derive(Debug, Clone, Deserialize)]
struct Manifest {
    archives: HashMap<String, Vec<TileEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
struct TileEntry {
    id: String,
    acquired: NaiveDate,
    #[serde(default)]
    transform: Option<[f64; 6]>,
    #[serde(default)]
    footprint: Option<Vec<[f64; 2]>>,
    bands: BTreeMap<String, PathBuf>,
}

impl TileEntry {
    fn footprint_polygon(&self) -> Option<Polygon<f64>> {
        self.footprint.as_ref().map(|ring| {
            let coords: Vec<(f64, f64)> = ring.iter().map(|[x, y]| (*x, *y)).collect();
            Polygon::new(LineString::from(coords), vec![])
        })
    }
}

#[derive(Debug, Clone)]
pub struct ManifestArchive {
    root: PathBuf,
    manifest: Manifest,
}

impl ManifestArchive {
    /// Load a manifest; relative band paths resolve against its directory.
    pub fn open(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let manifest: Manifest = serde_json::from_str(&text)?;
        let root = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        info!(
            "Opened manifest {:?}: {} collection(s), {} tile(s)",
            path,
            manifest.archives.len(),
            manifest.archives.values().map(Vec::len).sum::<usize>()
        );
        Ok(Self { root, manifest })
    }

    pub fn collections(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.manifest.archives.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn load(&self, entry: &TileEntry) -> Result<Tile> {
        let mut bands = Vec::with_capacity(entry.bands.len());
        let mut tagged = None;
        for (name, rel) in &entry.bands {
            let decoded = read_tiff_band(&self.root.join(rel), name)?;
            tagged = tagged.or(decoded.transform);
            bands.push(decoded.band);
        }
        let (rows, cols) = bands
            .first()
            .map(|b| b.data.dim())
            .ok_or_else(|| Error::Archive(format!("tile {} lists no bands", entry.id)))?;
        let transform = match entry.transform {
            Some(gt) => GeoTransform::from_gdal(gt)?,
            None => tagged
                .ok_or_else(|| Error::Archive(format!("tile {} has no georeferencing", entry.id)))?,
        };
        let raster = Raster::new(entry.id.clone(), GridSpec::new(transform, rows, cols), bands)?;
        let tile = Tile::new(entry.id.clone(), entry.acquired, raster);
        Ok(match entry.footprint_polygon() {
            Some(footprint) => tile.with_footprint(footprint),
            None => tile,
        })
    }
}

impl TileArchive for ManifestArchive {
    fn query_tiles(
        &self,
        archive: &str,
        bbox: &BoundingBox,
        range: &DateRange,
    ) -> Result<Vec<Tile>> {
        let entries = self
            .manifest
            .archives
            .get(archive)
            .ok_or_else(|| Error::Archive(format!("unknown collection {archive}")))?;

        let mut tiles = Vec::new();
        for entry in entries.iter().filter(|e| range.contains(e.acquired)) {
            if let Some(footprint) = entry.footprint_polygon() {
                if !bbox.intersects(&footprint) {
                    continue;
                }
            }
            let tile = self.load(entry)?;
            if bbox.intersects(&tile.footprint) {
                debug!("Loaded tile {} ({})", tile.id, tile.raster.grid());
                tiles.push(tile);
            }
        }
        Ok(tiles)
    }
}
