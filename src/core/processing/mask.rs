//! Binary classification of an index raster.
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::processing::ops::threshold_array;
use crate::core::raster::{Band, Raster};
use crate::error::{Error, Result};
use crate::types::Comparison;

/// Threshold predicate applied per pixel: `index <comparison> value`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdParams {
    #[serde(default)]
    pub value: f64,
    #[serde(default)]
    pub comparison: Comparison,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            value: 0.0,
            comparison: Comparison::GreaterOrEqual,
        }
    }
}

/// Classify a single-band raster into a {0, 1} mask named `label`.
///
/// Undefined input pixels stay undefined.
pub fn threshold_mask(index: &Raster, params: ThresholdParams, label: &str) -> Result<Raster> {
    if !params.value.is_finite() {
        return Err(Error::invalid_argument("threshold", params.value));
    }
    let source = index.single_band()?;
    let band = Band::new(
        label,
        threshold_array(&source.data, params.value, params.comparison),
    );
    let ones = band.data.iter().filter(|v| **v == Some(1.0)).count();
    info!(
        "Mask {} = {} {} {}: {} of {} defined pixels set",
        label,
        source.name,
        params.comparison,
        params.value,
        ones,
        band.defined_count()
    );
    Ok(Raster::from_band(label, *index.grid(), band))
}
