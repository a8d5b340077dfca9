//! Missing data descriptors
//!
//! SWOT products flag absent measurements with a fill value (typically `-999999999999.0`) rather
//! than leaving them out. By default such values are treated literally. A descriptor may be
//! configured to treat them as missing instead, in which case they are ignored during binning
//! and statistics. Currently we support:
//!
//! * A single missing value
//! * Multiple missing values
//! * A valid minimum value
//! * A valid maximum value
//! * A valid range of values

use serde::Deserialize;
use validator::ValidationError;

/// Missing data
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum Missing {
    /// A single missing value
    MissingValue(f64),
    /// Multple missing values
    MissingValues(Vec<f64>),
    /// Valid minimum
    ValidMin(f64),
    /// Valid maxiumum
    ValidMax(f64),
    /// Valid range
    ValidRange(f64, f64),
}

impl Missing {
    /// Build a missing data descriptor from its command line components.
    ///
    /// Missing values take precedence over valid bounds. Returns `None` when nothing is set.
    pub fn from_parts(
        missing_values: &[f64],
        valid_min: Option<f64>,
        valid_max: Option<f64>,
    ) -> Option<Self> {
        match (missing_values, valid_min, valid_max) {
            ([value], _, _) => Some(Missing::MissingValue(*value)),
            ([_, _, ..], _, _) => Some(Missing::MissingValues(missing_values.to_vec())),
            ([], Some(min), Some(max)) => Some(Missing::ValidRange(min, max)),
            ([], Some(min), None) => Some(Missing::ValidMin(min)),
            ([], None, Some(max)) => Some(Missing::ValidMax(max)),
            ([], None, None) => None,
        }
    }

    /// Validate a missing data descriptor.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Missing::ValidRange(min, max) = self {
            if min >= max {
                let mut error =
                    ValidationError::new("Missing data valid range min must be less than max");
                error.add_param("min".into(), min);
                error.add_param("max".into(), max);
                return Err(error);
            };
        };
        Ok(())
    }

    /// Filter function to check whether the provided value is a 'missing' value
    pub fn is_missing(&self, x: &f64) -> bool {
        match self {
            Missing::MissingValue(value) => x == value,
            Missing::MissingValues(values) => values.contains(x),
            Missing::ValidMin(min) => x < min,
            Missing::ValidMax(max) => x > max,
            Missing::ValidRange(min, max) => x < min || x > max,
        }
    }

    /// Returns the value with missing data replaced by NaN.
    pub fn mask(&self, x: f64) -> f64 {
        if self.is_missing(&x) {
            f64::NAN
        } else {
            x
        }
    }
}
