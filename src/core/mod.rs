//! Core building blocks: rasters and grids, regions and date ranges, the tile
//! archive seam, the per-stage processing functions and the export request
//! values. These are the primitives composed by the high-level `api` module.
pub mod archive;
pub mod export;
pub mod params;
pub mod processing;
pub mod raster;
pub mod region;
