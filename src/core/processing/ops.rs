use ndarray::{Array2, Zip};

use crate::core::raster::Sample;
use crate::types::Comparison;

#[inline]
fn finite(v: Sample) -> Sample {
    v.filter(|v| v.is_finite())
}

/// Normalized difference: (a - b) / (a + b); undefined where either input is
/// undefined or a + b == 0
pub fn normalized_diff_arrays(a: &Array2<Sample>, b: &Array2<Sample>) -> Array2<Sample> {
    Zip::from(a).and(b).par_map_collect(|&a_val, &b_val| {
        let (a_val, b_val) = (finite(a_val)?, finite(b_val)?);
        let sum = a_val + b_val;
        if sum == 0.0 {
            return None;
        }
        finite(Some((a_val - b_val) / sum))
    })
}

/// Binary classification: 1 where `value <op> threshold` holds, else 0
pub fn threshold_array(index: &Array2<Sample>, threshold: f64, op: Comparison) -> Array2<Sample> {
    Zip::from(index).par_map_collect(|&v| {
        finite(v).map(|v| if op.holds(v, threshold) { 1.0 } else { 0.0 })
    })
}

/// Element-wise difference: later - earlier
pub fn difference_arrays(earlier: &Array2<Sample>, later: &Array2<Sample>) -> Array2<Sample> {
    Zip::from(earlier).and(later).par_map_collect(|&e, &l| {
        let (e, l) = (finite(e)?, finite(l)?);
        Some(l - e)
    })
}

/// Keep samples where `keep` is true, undefined elsewhere
pub fn mask_arrays(data: &Array2<Sample>, keep: &Array2<bool>) -> Array2<Sample> {
    Zip::from(data)
        .and(keep)
        .par_map_collect(|&v, &k| if k { v } else { None })
}
