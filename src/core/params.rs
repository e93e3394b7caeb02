use serde::{Deserialize, Serialize};

use crate::core::export::DEFAULT_MAX_PIXELS;
use crate::core::processing::colorize::VisParams;
use crate::core::processing::mask::ThresholdParams;
use crate::core::raster::GridSpec;
use crate::core::region::{BoundingBox, DateRange};
use crate::error::{Error, Result};

/// Names of the spectral bands the index is derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSelection {
    #[serde(default = "default_red")]
    pub red: String,
    #[serde(default = "default_nir")]
    pub nir: String,
}

fn default_red() -> String {
    "R".to_string()
}

fn default_nir() -> String {
    "N".to_string()
}

impl Default for BandSelection {
    fn default() -> Self {
        Self {
            red: default_red(),
            nir: default_nir(),
        }
    }
}

/// Export pre-flight settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportParams {
    /// Meters per output pixel
    pub scale: f64,
    pub max_pixels: u64,
    pub description: String,
}

impl Default for ExportParams {
    fn default() -> Self {
        Self {
            scale: 10.0,
            max_pixels: DEFAULT_MAX_PIXELS * 1000,
            description: "CanopyDiff".to_string(),
        }
    }
}

/// Change-detection parameters suitable for config files.
///
/// Region and epochs are required; everything else has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeParams {
    /// Archive collection the tiles are drawn from
    #[serde(default = "default_archive")]
    pub archive: String,
    pub region: BoundingBox,
    pub earlier: DateRange,
    pub later: DateRange,
    #[serde(default)]
    pub bands: BandSelection,
    /// Working grid resolution in region units (degrees)
    #[serde(default = "default_pixel_size")]
    pub pixel_size: f64,
    /// Largest working grid, in pixels, a run may allocate
    #[serde(default = "default_max_grid_pixels")]
    pub max_grid_pixels: u64,
    /// Composite tiles oldest-first instead of in archive order
    #[serde(default)]
    pub order_by_acquisition: bool,
    #[serde(default)]
    pub threshold: ThresholdParams,
    #[serde(default = "VisParams::difference")]
    pub style: VisParams,
    #[serde(default)]
    pub export: ExportParams,
}

fn default_archive() -> String {
    "naip".to_string()
}

fn default_pixel_size() -> f64 {
    1e-4
}

fn default_max_grid_pixels() -> u64 {
    DEFAULT_MAX_GRID_PIXELS
}

/// Default ceiling on working-grid pixels.
pub const DEFAULT_MAX_GRID_PIXELS: u64 = 25_000_000;

impl ChangeParams {
    pub fn new(region: BoundingBox, earlier: DateRange, later: DateRange) -> Self {
        Self {
            archive: default_archive(),
            region,
            earlier,
            later,
            bands: BandSelection::default(),
            pixel_size: default_pixel_size(),
            max_grid_pixels: default_max_grid_pixels(),
            order_by_acquisition: false,
            threshold: ThresholdParams::default(),
            style: VisParams::difference(),
            export: ExportParams::default(),
        }
    }

    /// Working grid over `region` at `pixel_size`, checked against
    /// `max_grid_pixels` before anything is allocated.
    pub fn working_grid(&self) -> Result<GridSpec> {
        let grid = GridSpec::covering(&self.region, self.pixel_size)?;
        if grid.pixel_count() > self.max_grid_pixels {
            return Err(Error::PixelBudgetExceeded {
                estimated: grid.pixel_count(),
                ceiling: self.max_grid_pixels,
            });
        }
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Comparison;

    #[test]
    fn minimal_config_gets_defaults() {
        let json = r#"{
            "region": [-75.28, 39.87, -74.96, 40.14],
            "earlier": {"start": "2017-01-01", "end": "2018-01-01"},
            "later": {"start": "2022-01-01", "end": "2024-01-01"}
        }"#;
        let params: ChangeParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.bands, BandSelection::default());
        assert_eq!(params.pixel_size, 1e-4);
        assert_eq!(params.max_grid_pixels, DEFAULT_MAX_GRID_PIXELS);
        assert!(!params.order_by_acquisition);
        assert_eq!(params.threshold.value, 0.0);
        assert_eq!(params.threshold.comparison, Comparison::GreaterOrEqual);
        assert_eq!(params.style, VisParams::difference());
        assert_eq!(params.export.scale, 10.0);
        assert_eq!(params.export.max_pixels, 100_000_000_000);
        assert_eq!(params.export.description, "CanopyDiff");
    }

    #[test]
    fn overrides_and_validation() {
        let json = r#"{
            "archive": "ortho",
            "region": [0, 0, 1, 1],
            "earlier": {"start": "2017-01-01", "end": "2018-01-01"},
            "later": {"start": "2022-01-01", "end": "2024-01-01"},
            "bands": {"nir": "NIR"},
            "threshold": {"value": 0.2, "comparison": "greater"},
            "style": {"palette": "red, black, green", "min": -1, "max": 1}
        }"#;
        let params: ChangeParams = serde_json::from_str(json).unwrap();
        assert_eq!(params.archive, "ortho");
        assert_eq!(params.bands.red, "R");
        assert_eq!(params.bands.nir, "NIR");
        assert_eq!(params.threshold.comparison, Comparison::Greater);
        assert_eq!(params.style.max(), 1.0);

        assert!(!params.order_by_acquisition);

        let inverted = json.replace("\"2018-01-01\"", "\"2016-01-01\"");
        assert!(serde_json::from_str::<ChangeParams>(&inverted).is_err());
        assert!(serde_json::from_str::<ChangeParams>(r#"{"region": [0, 0, 1, 1]}"#).is_err());
    }

    #[test]
    fn working_grid_respects_ceiling() {
        let mut params = ChangeParams::new(
            BoundingBox::new(-75.28, 39.87, -74.96, 40.14).unwrap(),
            DateRange::parse("2017-01-01", "2018-01-01").unwrap(),
            DateRange::parse("2022-01-01", "2024-01-01").unwrap(),
        );
        assert_eq!(params.working_grid().unwrap().shape(), (2700, 3200));

        params.pixel_size = 1e-5;
        assert!(matches!(
            params.working_grid(),
            Err(Error::PixelBudgetExceeded {
                estimated: 864_000_000,
                ceiling: DEFAULT_MAX_GRID_PIXELS,
            })
        ));

        params.pixel_size = 1e-300;
        assert!(matches!(
            params.working_grid(),
            Err(Error::PixelBudgetExceeded { .. })
        ));
    }
}
