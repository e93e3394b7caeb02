//! Temporal differencing of two epoch masks.
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::processing::ops::difference_arrays;
use crate::core::raster::{Band, Raster};
use crate::error::{Error, Result};

/// Per-pixel `later - earlier`.
///
/// Both rasters must be single-band and share shape and transform, otherwise
/// [`Error::ExtentMismatch`]. For {0, 1} masks the output is +1 where
/// vegetation was gained, -1 where it was lost and 0 where unchanged; a pixel
/// undefined in either input is undefined.
pub fn difference(earlier: &Raster, later: &Raster) -> Result<Raster> {
    if !earlier.grid().is_aligned_with(later.grid()) {
        return Err(Error::ExtentMismatch {
            earlier: earlier.grid().to_string(),
            later: later.grid().to_string(),
        });
    }
    let e = earlier.single_band()?;
    let l = later.single_band()?;
    let band = Band::new("difference", difference_arrays(&e.data, &l.data));
    let out = Raster::from_band("difference", *earlier.grid(), band);
    info!(
        "Differenced {} against {}: {}",
        later.name(),
        earlier.name(),
        ChangeSummary::from_difference(&out)?
    );
    Ok(out)
}

/// Pixel tallies of a difference raster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub gained: usize,
    pub lost: usize,
    pub unchanged: usize,
    pub undefined: usize,
    /// Defined values other than -1, 0, +1 (non-binary inputs).
    pub other: usize,
}

impl ChangeSummary {
    pub fn from_difference(raster: &Raster) -> Result<Self> {
        let mut summary = Self::default();
        for v in raster.single_band()?.data.iter() {
            match v {
                None => summary.undefined += 1,
                Some(v) if *v == 1.0 => summary.gained += 1,
                Some(v) if *v == -1.0 => summary.lost += 1,
                Some(v) if *v == 0.0 => summary.unchanged += 1,
                Some(_) => summary.other += 1,
            }
        }
        Ok(summary)
    }
}

impl std::fmt::Display for ChangeSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "gained={} lost={} unchanged={} undefined={}",
            self.gained, self.lost, self.unchanged, self.undefined
        )?;
        if self.other > 0 {
            write!(f, " other={}", self.other)?;
        }
        Ok(())
    }
}
