//! Partitioning of rows into bins along an axis.

use ndarray::{Array1, ArrayView1};
use noisy_float::types::{n64, N64};
use std::collections::BTreeMap;

/// Returns the bin key for an axis value, or `None` if the value cannot be binned.
///
/// The value is rounded down to `precision` decimal places, so a bin covers the half-open
/// interval `[key, key + 10^-precision)`. A negative precision rounds down to tens, hundreds and
/// so on. Non-finite values, and values which overflow when scaled, have no bin.
///
/// # Arguments
///
/// * `value`: Axis value
/// * `precision`: Number of decimal places to round to
pub fn bin_key(value: f64, precision: i32) -> Option<f64> {
    if !value.is_finite() {
        return None;
    }
    let scale = 10_f64.powi(precision.abs());
    let scaled = if precision >= 0 {
        value * scale
    } else {
        value / scale
    };
    if !scaled.is_finite() {
        return None;
    }
    // Scaling is inexact (0.29 * 100 is 28.999999999999996), so scaled values within a few ulps
    // of a bin boundary belong to the bin starting there. Unscaled values floor exactly.
    let nearest = scaled.round();
    let floored = if precision != 0
        && (scaled - nearest).abs() <= 4.0 * f64::EPSILON * nearest.abs().max(1.0)
    {
        nearest
    } else {
        scaled.floor()
    };
    let key = if precision >= 0 {
        floored / scale
    } else {
        floored * scale
    };
    // Adding zero folds -0.0 into 0.0.
    key.is_finite().then_some(key + 0.0)
}

/// A group of rows sharing the same bin key.
#[derive(Clone, Debug, PartialEq)]
pub struct Bin {
    /// Rounded axis value shared by all rows in the bin
    pub key: f64,
    /// Indices of the rows in the bin, in table order
    pub rows: Vec<usize>,
}

impl Bin {
    /// Returns the values of a column for the rows in this bin.
    pub fn select(&self, column: &ArrayView1<f64>) -> Array1<f64> {
        self.rows.iter().map(|&row| column[row]).collect()
    }
}

/// Partition rows by the rounded value of an axis column.
///
/// Returns the non-empty bins in ascending key order. Every row with a binnable axis value is in
/// exactly one bin; rows without one are in none.
///
/// # Arguments
///
/// * `axis`: Axis column, one value per row
/// * `precision`: Number of decimal places to round to
pub fn partition(axis: &ArrayView1<f64>, precision: i32) -> Vec<Bin> {
    let mut bins: BTreeMap<N64, Vec<usize>> = BTreeMap::new();
    for (row, value) in axis.iter().enumerate() {
        if let Some(key) = bin_key(*value, precision) {
            bins.entry(n64(key)).or_default().push(row);
        }
    }
    bins.into_iter()
        .map(|(key, rows)| Bin {
            key: key.raw(),
            rows,
        })
        .collect()
}
