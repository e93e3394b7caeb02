//! Export and display requests.
//!
//! Both are plain values handed to an external collaborator. Building one runs
//! the pre-flight checks (pixel budget, argument sanity) and nothing else: no
//! file, network or queue is touched here.
use std::sync::Arc;

use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::core::processing::colorize::VisParams;
use crate::core::raster::{GridSpec, Raster};
use crate::core::region::RegionOfInterest;
use crate::error::{Error, Result};

pub const DEFAULT_MAX_PIXELS: u64 = 100_000_000;
pub const DEFAULT_DESCRIPTION: &str = "export";

/// Serializes a raster reference as its name and grid, never its samples.
fn raster_ref<S: Serializer>(raster: &Arc<Raster>, s: S) -> std::result::Result<S::Ok, S::Error> {
    #[derive(Serialize)]
    struct RasterRef<'a> {
        name: &'a str,
        grid: &'a GridSpec,
        bands: Vec<&'a str>,
    }
    RasterRef {
        name: raster.name(),
        grid: raster.grid(),
        bands: raster.band_names(),
    }
    .serialize(s)
}

/// Estimated output pixel count of `region` at `scale` units per pixel.
pub fn estimate_pixels(region: &RegionOfInterest, scale: f64) -> u64 {
    // float-to-int casts saturate
    (region.area() / (scale * scale)).ceil() as u64
}

/// Immutable export request.
#[derive(Debug, Clone, Serialize)]
pub struct ExportRequest {
    #[serde(serialize_with = "raster_ref")]
    raster: Arc<Raster>,
    region: RegionOfInterest,
    scale: f64,
    max_pixels: u64,
    description: String,
    style: Option<VisParams>,
    estimated_pixels: u64,
}

impl ExportRequest {
    pub fn builder(raster: impl Into<Arc<Raster>>, region: RegionOfInterest) -> ExportRequestBuilder {
        ExportRequestBuilder::new(raster, region)
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn region(&self) -> &RegionOfInterest {
        &self.region
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn max_pixels(&self) -> u64 {
        self.max_pixels
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn style(&self) -> Option<&VisParams> {
        self.style.as_ref()
    }

    pub fn estimated_pixels(&self) -> u64 {
        self.estimated_pixels
    }
}

/// Builder for [`ExportRequest`]. `scale` is required.
#[derive(Debug, Clone)]
pub struct ExportRequestBuilder {
    raster: Arc<Raster>,
    region: RegionOfInterest,
    scale: Option<f64>,
    max_pixels: u64,
    description: String,
    style: Option<VisParams>,
}

impl ExportRequestBuilder {
    pub fn new(raster: impl Into<Arc<Raster>>, region: RegionOfInterest) -> Self {
        Self {
            raster: raster.into(),
            region,
            scale: None,
            max_pixels: DEFAULT_MAX_PIXELS,
            description: DEFAULT_DESCRIPTION.to_string(),
            style: None,
        }
    }

    /// Output resolution in linear units (meters for geographic regions) per pixel.
    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = max_pixels;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn style(mut self, style: VisParams) -> Self {
        self.style = Some(style);
        self
    }

    /// Validate and run the pixel-budget pre-flight.
    ///
    /// Fails with [`Error::PixelBudgetExceeded`] when the estimated pixel count
    /// is strictly greater than the ceiling.
    pub fn build(self) -> Result<ExportRequest> {
        let scale = self
            .scale
            .ok_or_else(|| Error::invalid_argument("scale", "missing"))?;
        if !(scale.is_finite() && scale > 0.0) {
            return Err(Error::invalid_argument("scale", scale));
        }
        if self.max_pixels == 0 {
            return Err(Error::invalid_argument("max_pixels", 0));
        }
        if self.description.trim().is_empty() {
            return Err(Error::invalid_argument("description", "empty"));
        }
        let estimated = estimate_pixels(&self.region, scale);
        debug!(
            "Export {}: region area {:.1}, scale {}, ~{} pixels (ceiling {})",
            self.description,
            self.region.area(),
            scale,
            estimated,
            self.max_pixels
        );
        if estimated > self.max_pixels {
            return Err(Error::PixelBudgetExceeded {
                estimated,
                ceiling: self.max_pixels,
            });
        }
        info!(
            "Export request {} for {} ready: ~{} pixels at scale {}",
            self.description,
            self.raster.name(),
            estimated,
            scale
        );
        Ok(ExportRequest {
            raster: self.raster,
            region: self.region,
            scale,
            max_pixels: self.max_pixels,
            description: self.description,
            style: self.style,
            estimated_pixels: estimated,
        })
    }
}

/// Request to show a raster as a styled, clipped map layer.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayLayer {
    #[serde(serialize_with = "raster_ref")]
    raster: Arc<Raster>,
    clip: RegionOfInterest,
    style: VisParams,
    name: String,
}

impl DisplayLayer {
    pub fn new(
        raster: impl Into<Arc<Raster>>,
        clip: RegionOfInterest,
        style: VisParams,
        name: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::invalid_argument("layer name", "empty"));
        }
        Ok(Self {
            raster: raster.into(),
            clip,
            style,
            name,
        })
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    pub fn clip(&self) -> &RegionOfInterest {
        &self.clip
    }

    pub fn style(&self) -> &VisParams {
        &self.style
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::GeoTransform;
    use crate::types::CoordinateSpace;
    use geo::polygon;

    fn raster() -> Raster {
        let grid = GridSpec::new(GeoTransform::new(0.0, 100.0, 10.0, -10.0).unwrap(), 10, 10);
        Raster::undefined("difference", grid, &["difference"])
    }

    fn square_100m() -> RegionOfInterest {
        RegionOfInterest::from_polygon(
            polygon![(x: 0.0, y: 0.0), (x: 100.0, y: 0.0), (x: 100.0, y: 100.0), (x: 0.0, y: 100.0)],
            CoordinateSpace::Planar,
        )
        .unwrap()
    }

    #[test]
    fn pixel_budget_fail_and_pass() {
        let over = ExportRequest::builder(raster(), square_100m())
            .scale(10.0)
            .max_pixels(50)
            .build();
        assert!(matches!(
            over,
            Err(Error::PixelBudgetExceeded {
                estimated: 100,
                ceiling: 50
            })
        ));

        let request = ExportRequest::builder(raster(), square_100m())
            .scale(10.0)
            .max_pixels(100)
            .description("CanopyDiff")
            .style(VisParams::difference())
            .build()
            .unwrap();
        assert_eq!(request.estimated_pixels(), 100);
        assert_eq!(request.description(), "CanopyDiff");
        assert_eq!(request.style(), Some(&VisParams::difference()));
    }

    #[test]
    fn defaults_and_argument_checks() {
        let request = ExportRequest::builder(raster(), square_100m())
            .scale(1.0)
            .build()
            .unwrap();
        assert_eq!(request.max_pixels(), DEFAULT_MAX_PIXELS);
        assert_eq!(request.description(), DEFAULT_DESCRIPTION);
        assert!(request.style().is_none());

        let missing = ExportRequest::builder(raster(), square_100m()).build();
        assert!(matches!(missing, Err(Error::InvalidArgument { arg: "scale", .. })));
        for bad in [0.0, -1.0, f64::NAN] {
            let r = ExportRequest::builder(raster(), square_100m()).scale(bad).build();
            assert!(matches!(r, Err(Error::InvalidArgument { arg: "scale", .. })));
        }
        let blank = ExportRequest::builder(raster(), square_100m())
            .scale(10.0)
            .description("  ")
            .build();
        assert!(blank.is_err());
    }

    #[test]
    fn request_serializes_without_samples() {
        let request = ExportRequest::builder(raster(), square_100m())
            .scale(10.0)
            .build()
            .unwrap();
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["raster"]["name"], "difference");
        assert_eq!(json["raster"]["bands"][0], "difference");
        assert_eq!(json["estimated_pixels"], 100);
        assert!(json["raster"].get("data").is_none());
    }

    #[test]
    fn display_layer_needs_a_name() {
        assert!(DisplayLayer::new(raster(), square_100m(), VisParams::difference(), "").is_err());
        let layer = DisplayLayer::new(raster(), square_100m(), VisParams::difference(), "Canopy change").unwrap();
        assert_eq!(layer.name(), "Canopy change");
        assert_eq!(layer.raster().name(), "difference");
    }
}
