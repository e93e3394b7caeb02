#![doc = r#"
CANOPYDIFF — two-epoch vegetation canopy change detection.

This crate turns two collections of overlapping aerial image tiles, captured in
different time windows, into a signed change raster: +1 where vegetation was
gained, -1 where it was lost, 0 where nothing changed. Each epoch is selected
from a tile archive, mosaicked onto a common grid, reduced to a normalized
difference vegetation index and thresholded into a vegetation mask; the masks
are differenced and the result clipped to an arbitrary region of interest.
It powers the CANOPYDIFF CLI and can be embedded in your own Rust applications.

Stability
---------
The public library API is experimental in initial releases and may evolve.
Breaking changes can occur.

Requirements
------------
- Rust 2024 edition toolchain. No system libraries: TIFF and JPEG I/O are pure Rust.

Quick start: run the workflow against an in-memory archive
-----------------------------------------------------------
```rust,no_run
use canopydiff::{
    BoundingBox, ChangeParams, DateRange, InMemoryArchive, detect_canopy_change,
};

fn main() -> canopydiff::Result<()> {
    let archive = InMemoryArchive::new(); // fill with `Tile`s, or use `io::ManifestArchive`
    let params = ChangeParams::new(
        BoundingBox::new(-75.28, 39.87, -74.96, 40.14)?,
        DateRange::parse("2017-01-01", "2018-01-01")?,
        DateRange::parse("2022-01-01", "2024-01-01")?,
    );

    let result = detect_canopy_change(&archive, &params, None)?;
    println!("{}", result.summary);
    Ok(())
}
```

Export request and local writers
--------------------------------
Exporting is a two-step, explicit action. [`api::build_export`] assembles an
[`ExportRequest`] and runs the pixel-budget pre-flight; it never writes
anything. Hand the request to your own export collaborator, or persist it
locally with [`io::export_to_path`].

```rust,no_run
use std::path::Path;
use canopydiff::{ChangeParams, OutputFormat, build_export, detect_canopy_change};
use canopydiff::io::{ManifestArchive, export_to_path};

fn main() -> canopydiff::Result<()> {
    let archive = ManifestArchive::open(Path::new("/data/naip/manifest.json"))?;
    let params: ChangeParams =
        serde_json::from_str(&std::fs::read_to_string("/data/philadelphia.json")?)?;

    let result = detect_canopy_change(&archive, &params, None)?;
    let request = build_export(&result, &params)?;
    export_to_path(&request, Path::new("/out/CanopyDiff.tif"), OutputFormat::TIFF)?;
    Ok(())
}
```

Per-stage functions
-------------------
Every stage is an ordinary function over eager values, so pipelines can be
assembled by hand:

```rust
use canopydiff::core::processing::{change, index, mask};
use canopydiff::{Band, GeoTransform, GridSpec, Raster, ThresholdParams};
use ndarray::array;

fn trees(r: f64, n: f64) -> canopydiff::Result<Raster> {
    let grid = GridSpec::new(GeoTransform::new(0.0, 1.0, 0.5, -0.5)?, 2, 2);
    let scene = Raster::new(
        "scene",
        grid,
        vec![
            Band::from_values("R", array![[r, r], [r, r]]),
            Band::from_values("N", array![[n, n], [n, n]]),
        ],
    )?;
    let ndvi = index::ndvi(&scene, "N", "R", "NDVI")?;
    mask::threshold_mask(&ndvi, ThresholdParams::default(), "trees")
}

let diff = change::difference(&trees(10.0, 30.0).unwrap(), &trees(30.0, 10.0).unwrap()).unwrap();
assert_eq!(diff.sample("difference", 0, 0), Some(-1.0));
```

Error handling
--------------
All public functions return `canopydiff::Result<T>`; match on `canopydiff::Error`
to handle specific cases.

```rust,no_run
use canopydiff::{Error, build_export};
# fn demo(result: &canopydiff::ChangeResult, params: &canopydiff::ChangeParams) {
match build_export(result, params) {
    Ok(request) => println!("~{} pixels", request.estimated_pixels()),
    Err(Error::PixelBudgetExceeded { estimated, ceiling }) => {
        eprintln!("{estimated} pixels exceed {ceiling}; raise the scale or shrink the region")
    }
    Err(other) => eprintln!("Other error: {other}"),
}
# }
```

Useful modules
--------------
- [`api`] — high-level workflow, export and display entry points.
- [`core`] — rasters, regions, the archive seam, per-stage processing, export values.
- [`types`] — shared enums (`Comparison`, `CoordinateSpace`, `OutputFormat`).
- [`io`] — manifest archive and GeoTIFF/JPEG writers.
- [`error`] — crate-level `Error` and `Result`.
"#]

// Core modules (public)
pub mod api;
pub mod core;
pub mod error;
pub mod io;
pub mod types;

// Curated public API surface
// Types
pub use crate::core::archive::{InMemoryArchive, Tile, TileArchive};
pub use crate::core::export::{DisplayLayer, ExportRequest, ExportRequestBuilder};
pub use crate::core::params::{BandSelection, ChangeParams, ExportParams};
pub use crate::core::processing::change::ChangeSummary;
pub use crate::core::processing::colorize::{Rgb, VisParams};
pub use crate::core::processing::mask::ThresholdParams;
pub use crate::core::processing::pipeline::EpochProducts;
pub use crate::core::raster::{Band, GeoTransform, GridSpec, Raster, Sample};
pub use crate::core::region::{BoundingBox, DateRange, RegionOfInterest};
pub use error::{Error, Result};
pub use types::{Comparison, CoordinateSpace, OutputFormat};

// High-level API re-exports
pub use api::{ChangeResult, build_export, detect_canopy_change, display_layers};
