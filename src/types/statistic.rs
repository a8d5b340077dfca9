//! Summary statistics computed for each bin.

use serde::Serialize;
use strum_macros::Display;

/// A statistic kind.
///
/// Each kind is a quantile of the binned target values.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Statistic {
    /// 50th percentile
    #[serde(rename = "median")]
    #[strum(serialize = "median")]
    Median,
    /// 25th percentile
    #[serde(rename = "q0.25")]
    #[strum(serialize = "q0.25")]
    QuantileLower,
    /// 75th percentile
    #[serde(rename = "q0.75")]
    #[strum(serialize = "q0.75")]
    QuantileUpper,
}

impl Statistic {
    /// All statistic kinds, in response order.
    pub const ALL: [Statistic; 3] = [
        Statistic::Median,
        Statistic::QuantileLower,
        Statistic::QuantileUpper,
    ];

    /// Returns the quantile in [0, 1] corresponding to this statistic.
    pub fn quantile(self) -> f64 {
        match self {
            Self::Median => 0.5,
            Self::QuantileLower => 0.25,
            Self::QuantileUpper => 0.75,
        }
    }
}
