//! Spectral index derivation.
use tracing::info;

use crate::core::processing::ops::normalized_diff_arrays;
use crate::core::raster::{Band, Raster};
use crate::error::Result;

/// Normalized difference of two bands:
///
/// `(band_a - band_b) / (band_a + band_b)`
///
/// Bounded to [-1, 1] for non-negative inputs. Pixels where the sum is zero or
/// either input is undefined are undefined in the output. The single output band
/// (and the raster) are named `label`.
pub fn normalized_difference(
    raster: &Raster,
    band_a: &str,
    band_b: &str,
    label: &str,
) -> Result<Raster> {
    let a = raster.require_band(band_a)?;
    let b = raster.require_band(band_b)?;
    let band = Band::new(label, normalized_diff_arrays(&a.data, &b.data));
    info!(
        "Derived {} = ({} - {}) / ({} + {}) from {}: {} of {} pixels defined",
        label,
        band_a,
        band_b,
        band_a,
        band_b,
        raster.name(),
        band.defined_count(),
        raster.grid().len()
    );
    Ok(Raster::from_band(label, *raster.grid(), band))
}

/// Normalized Difference Vegetation Index, `(NIR - Red) / (NIR + Red)`.
pub fn ndvi(raster: &Raster, nir: &str, red: &str, label: &str) -> Result<Raster> {
    normalized_difference(raster, nir, red, label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::raster::{GeoTransform, GridSpec};
    use crate::error::Error;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    fn two_band(r: ndarray::Array2<f64>, n: ndarray::Array2<f64>) -> Raster {
        let (rows, cols) = r.dim();
        let grid = GridSpec::new(GeoTransform::new(0.0, 0.0, 1.0, -1.0).unwrap(), rows, cols);
        Raster::new(
            "scene",
            grid,
            vec![Band::from_values("R", r), Band::from_values("N", n)],
        )
        .unwrap()
    }

    #[test]
    fn ndvi_matches_formula() {
        let raster = two_band(array![[10.0, 40.0], [0.0, 5.0]], array![[30.0, 10.0], [0.0, 5.0]]);
        let out = ndvi(&raster, "N", "R", "NDVI").unwrap();
        assert_eq!(out.name(), "NDVI");
        assert_eq!(out.band_names(), vec!["NDVI"]);
        assert_abs_diff_eq!(out.sample("NDVI", 0, 0).unwrap(), 0.5);
        assert_abs_diff_eq!(out.sample("NDVI", 0, 1).unwrap(), -0.6);
        assert_eq!(out.sample("NDVI", 1, 0), None);
        assert_abs_diff_eq!(out.sample("NDVI", 1, 1).unwrap(), 0.0);
        assert_eq!(out.grid(), raster.grid());
    }

    #[test]
    fn index_is_bounded_for_non_negative_bands() {
        let r = ndarray::Array2::from_shape_fn((8, 8), |(i, j)| (i * 37 + j * 11) as f64 % 17.0);
        let n = ndarray::Array2::from_shape_fn((8, 8), |(i, j)| (i * 5 + j * 23) as f64 % 13.0);
        let out = ndvi(&two_band(r.clone(), n.clone()), "N", "R", "NDVI").unwrap();
        for ((idx, v), (&rv, &nv)) in out
            .single_band()
            .unwrap()
            .data
            .indexed_iter()
            .zip(r.iter().zip(n.iter()))
        {
            match v {
                Some(v) => assert!((-1.0..=1.0).contains(v), "{idx:?} = {v}"),
                None => assert_eq!(rv + nv, 0.0, "{idx:?} undefined with nonzero sum"),
            }
        }
    }

    #[test]
    fn missing_band_is_an_error() {
        let raster = two_band(array![[1.0]], array![[2.0]]);
        assert!(matches!(
            ndvi(&raster, "NIR", "R", "NDVI"),
            Err(Error::MissingBand { .. })
        ));
    }
}
