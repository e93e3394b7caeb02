//! Geo-referenced raster value types shared by every pipeline stage.
//!
//! A [`Raster`] is a named stack of [`Band`]s over one [`GridSpec`]. Samples are
//! `Option<f64>`: `None` is the explicit undefined tag, so nodata never leaks into
//! arithmetic as a NaN. Stages never mutate a raster they are given; each builds
//! a new one.
use geo::{Coord, Polygon, Rect};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::core::region::BoundingBox;
use crate::error::{Error, Result};

/// A single raster sample; `None` marks an undefined pixel.
pub type Sample = Option<f64>;

/// North-up affine transform from pixel to world coordinates.
///
/// ```text
/// x = origin_x + col * pixel_width
/// y = origin_y + row * pixel_height
/// ```
///
/// `pixel_height` is negative for the usual top-down row order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Result<Self> {
        let finite = [origin_x, origin_y, pixel_width, pixel_height]
            .iter()
            .all(|v| v.is_finite());
        if !finite || pixel_width <= 0.0 || pixel_height == 0.0 {
            return Err(Error::invalid_argument(
                "geotransform",
                format!("[{origin_x}, {pixel_width}, {origin_y}, {pixel_height}]"),
            ));
        }
        Ok(Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
        })
    }

    /// Build from GDAL-style coefficients. Rotated transforms are rejected.
    pub fn from_gdal(coeffs: [f64; 6]) -> Result<Self> {
        if coeffs[2] != 0.0 || coeffs[4] != 0.0 {
            return Err(Error::invalid_argument(
                "geotransform",
                format!("rotation terms ({}, {}) are not supported", coeffs[2], coeffs[4]),
            ));
        }
        Self::new(coeffs[0], coeffs[3], coeffs[1], coeffs[5])
    }

    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            0.0,
            self.origin_y,
            0.0,
            self.pixel_height,
        ]
    }

    /// World coordinates of the center of pixel (col, row).
    #[inline]
    pub fn pixel_center(&self, col: usize, row: usize) -> Coord<f64> {
        Coord {
            x: self.origin_x + (col as f64 + 0.5) * self.pixel_width,
            y: self.origin_y + (row as f64 + 0.5) * self.pixel_height,
        }
    }

    /// Fractional (col, row) of a world coordinate; floor it to index a pixel.
    #[inline]
    pub fn world_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            (x - self.origin_x) / self.pixel_width,
            (y - self.origin_y) / self.pixel_height,
        )
    }

    fn approx_eq(&self, other: &GeoTransform) -> bool {
        let tol = 1e-9 * self.pixel_width.abs().max(self.pixel_height.abs());
        (self.origin_x - other.origin_x).abs() <= tol
            && (self.origin_y - other.origin_y).abs() <= tol
            && (self.pixel_width - other.pixel_width).abs() <= tol
            && (self.pixel_height - other.pixel_height).abs() <= tol
    }
}

/// Cells of `size` needed to span `extent`; ratios within float noise of an
/// integer are not rounded up.
fn cell_count(extent: f64, size: f64) -> usize {
    let ratio = extent / size;
    let nearest = ratio.round();
    let cells = if (ratio - nearest).abs() <= 1e-9 * nearest.max(1.0) {
        nearest
    } else {
        ratio.ceil()
    };
    cells.max(1.0) as usize
}

/// Extent and resolution of a raster: transform plus pixel dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub transform: GeoTransform,
    pub rows: usize,
    pub cols: usize,
}

impl GridSpec {
    pub fn new(transform: GeoTransform, rows: usize, cols: usize) -> Self {
        Self {
            transform,
            rows,
            cols,
        }
    }

    /// Smallest north-up grid of square `pixel_size` cells covering `bbox`.
    pub fn covering(bbox: &BoundingBox, pixel_size: f64) -> Result<Self> {
        if !pixel_size.is_finite() || pixel_size <= 0.0 {
            return Err(Error::invalid_argument("pixel_size", pixel_size));
        }
        let cols = cell_count(bbox.width(), pixel_size);
        let rows = cell_count(bbox.height(), pixel_size);
        let transform = GeoTransform::new(bbox.min_x(), bbox.max_y(), pixel_size, -pixel_size)?;
        Ok(Self::new(transform, rows, cols))
    }

    /// Smallest grid aligned to `transform`'s resolution covering `rect`.
    pub(crate) fn covering_rect(rect: Rect<f64>, like: &GeoTransform) -> Result<Self> {
        let px = like.pixel_width;
        let py = like.pixel_height.abs();
        let cols = cell_count(rect.width(), px);
        let rows = cell_count(rect.height(), py);
        let top = if like.pixel_height < 0.0 {
            rect.max().y
        } else {
            rect.min().y
        };
        let transform = GeoTransform::new(rect.min().x, top, px, like.pixel_height)?;
        Ok(Self::new(transform, rows, cols))
    }

    /// 0×0 grid at unit resolution.
    pub fn empty() -> Self {
        let transform = GeoTransform {
            origin_x: 0.0,
            origin_y: 0.0,
            pixel_width: 1.0,
            pixel_height: -1.0,
        };
        Self::new(transform, 0, 0)
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Pixel count without overflow, for budget checks before allocating.
    pub fn pixel_count(&self) -> u64 {
        (self.rows as u64).saturating_mul(self.cols as u64)
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// World-space rectangle covered by the grid.
    pub fn bounds(&self) -> Rect<f64> {
        let t = &self.transform;
        let x2 = t.origin_x + self.cols as f64 * t.pixel_width;
        let y2 = t.origin_y + self.rows as f64 * t.pixel_height;
        Rect::new(Coord { x: t.origin_x, y: t.origin_y }, Coord { x: x2, y: y2 })
    }

    pub fn footprint(&self) -> Polygon<f64> {
        self.bounds().to_polygon()
    }

    /// Same shape and (within float tolerance) the same transform.
    pub fn is_aligned_with(&self, other: &GridSpec) -> bool {
        self.shape() == other.shape() && self.transform.approx_eq(&other.transform)
    }

    /// Pixel index containing world coordinate (x, y), if inside the grid.
    #[inline]
    pub fn pixel_at(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let (c, r) = self.transform.world_to_pixel(x, y);
        if !(c >= 0.0 && r >= 0.0) {
            return None;
        }
        let (col, row) = (c.floor() as usize, r.floor() as usize);
        (row < self.rows && col < self.cols).then_some((row, col))
    }
}

impl std::fmt::Display for GridSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let t = &self.transform;
        write!(
            f,
            "{}x{} @ ({}, {}) px ({}, {})",
            self.rows, self.cols, t.origin_x, t.origin_y, t.pixel_width, t.pixel_height
        )
    }
}

/// One named layer of samples.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub name: String,
    pub data: Array2<Sample>,
}

impl Band {
    pub fn new(name: impl Into<String>, data: Array2<Sample>) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    /// Wrap plain values; non-finite samples become undefined.
    pub fn from_values(name: impl Into<String>, values: Array2<f64>) -> Self {
        Self::new(name, values.mapv(|v| v.is_finite().then_some(v)))
    }

    pub fn undefined(name: impl Into<String>, rows: usize, cols: usize) -> Self {
        Self::new(name, Array2::from_elem((rows, cols), None))
    }

    pub fn defined_count(&self) -> usize {
        self.data.iter().filter(|v| v.is_some()).count()
    }

    /// Samples with undefined pixels replaced by `nodata`, row-major.
    pub fn to_filled_vec(&self, nodata: f64) -> Vec<f64> {
        self.data.iter().map(|v| v.unwrap_or(nodata)).collect()
    }
}

/// A named, geo-referenced stack of bands sharing one grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    name: String,
    grid: GridSpec,
    bands: Vec<Band>,
}

impl Raster {
    pub fn new(name: impl Into<String>, grid: GridSpec, bands: Vec<Band>) -> Result<Self> {
        let name = name.into();
        for band in &bands {
            if band.data.dim() != grid.shape() {
                return Err(Error::invalid_argument(
                    "band",
                    format!(
                        "{} in {} has shape {:?}, grid is {:?}",
                        band.name,
                        name,
                        band.data.dim(),
                        grid.shape()
                    ),
                ));
            }
        }
        for (i, band) in bands.iter().enumerate() {
            if bands[..i].iter().any(|b| b.name == band.name) {
                return Err(Error::invalid_argument("band", format!("duplicate {}", band.name)));
            }
        }
        Ok(Self { name, grid, bands })
    }

    /// Raster over `grid` with every sample of every band undefined.
    pub fn undefined<S: AsRef<str>>(name: impl Into<String>, grid: GridSpec, bands: &[S]) -> Self {
        let bands = bands
            .iter()
            .map(|b| Band::undefined(b.as_ref(), grid.rows, grid.cols))
            .collect();
        Self {
            name: name.into(),
            grid,
            bands,
        }
    }

    /// Single-band raster; the caller guarantees the band matches the grid.
    pub(crate) fn from_band(name: impl Into<String>, grid: GridSpec, band: Band) -> Self {
        debug_assert_eq!(band.data.dim(), grid.shape());
        Self {
            name: name.into(),
            grid,
            bands: vec![band],
        }
    }

    /// Same name and grid, each band replaced by `f(band)`. `f` must keep the
    /// band's shape.
    pub(crate) fn map_bands<F: Fn(&Band) -> Band>(&self, f: F) -> Self {
        let bands: Vec<Band> = self.bands.iter().map(f).collect();
        debug_assert!(bands.iter().all(|b| b.data.dim() == self.grid.shape()));
        Self {
            name: self.name.clone(),
            grid: self.grid,
            bands,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn grid(&self) -> &GridSpec {
        &self.grid
    }

    pub fn shape(&self) -> (usize, usize) {
        self.grid.shape()
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    pub fn band_names(&self) -> Vec<&str> {
        self.bands.iter().map(|b| b.name.as_str()).collect()
    }

    pub fn band(&self, name: &str) -> Option<&Band> {
        self.bands.iter().find(|b| b.name == name)
    }

    pub fn require_band(&self, name: &str) -> Result<&Band> {
        self.band(name).ok_or_else(|| Error::MissingBand {
            band: name.to_string(),
            raster: self.name.clone(),
        })
    }

    /// The only band of a single-band raster.
    pub fn single_band(&self) -> Result<&Band> {
        match self.bands.as_slice() {
            [band] => Ok(band),
            _ => Err(Error::invalid_argument(
                "raster",
                format!("{} has {} bands, expected 1", self.name, self.bands.len()),
            )),
        }
    }

    /// Sample of `band` at (row, col); `None` if undefined or out of range.
    pub fn sample(&self, band: &str, row: usize, col: usize) -> Sample {
        self.band(band)
            .and_then(|b| b.data.get((row, col)).copied())
            .flatten()
    }
}
