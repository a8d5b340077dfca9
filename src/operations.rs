//! Numerical operations.
//!
//! Quantiles are computed with [ndarray_stats] using linear interpolation between the closest
//! ranks, i.e. position `q * (n - 1)` of the sorted values, the same definition NumPy and pandas
//! use by default. NaN and infinite values are skipped.

use crate::error::SwotVisError;
use crate::types::Statistic;

use ndarray::{Array1, Axis};
use ndarray_stats::{interpolate::Linear, QuantileExt};
use noisy_float::types::n64;

/// Replace a non-finite value with `None`.
///
/// NaN and infinities are not representable in JSON, so undefined results become explicit nulls.
pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Returns the `q`th quantile of the values, ignoring non-finite values.
///
/// The values are reordered in place and non-finite values replaced by NaN. Returns NaN if no
/// finite values remain.
///
/// # Arguments
///
/// * `values`: Values to compute the quantile of. Must not be empty.
/// * `q`: Quantile in [0, 1]
pub fn quantile(values: &mut Array1<f64>, q: f64) -> Result<f64, SwotVisError> {
    // Interpolating between infinities is undefined.
    values.mapv_inplace(|value| if value.is_finite() { value } else { f64::NAN });
    let result = values.quantile_axis_skipnan_mut(Axis(0), n64(q), &Linear)?;
    Ok(result.into_scalar())
}

/// Compute a statistic over the values of one bin.
///
/// Returns `None` when the statistic is undefined or not finite.
///
/// # Arguments
///
/// * `values`: Target values of the bin. Must not be empty.
/// * `statistic`: Statistic to compute
pub fn compute(values: &mut Array1<f64>, statistic: Statistic) -> Result<Option<f64>, SwotVisError> {
    Ok(finite(quantile(values, statistic.quantile())?))
}
