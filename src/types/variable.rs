//! Node variables
//!
//! The physical quantities reported for every SWOT node which may be binned along or summarised.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use crate::error::SwotVisError;

/// A SWOT node variable.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NodeVariable {
    /// Water surface elevation
    Wse,
    /// River or lake width
    Width,
    /// Total cross-sectional area
    AreaTotal,
    /// Distance from the node to the outlet of the feature
    PDistOut,
}

impl NodeVariable {
    /// All node variables, in column order.
    pub const ALL: [NodeVariable; 4] = [
        NodeVariable::Wse,
        NodeVariable::Width,
        NodeVariable::AreaTotal,
        NodeVariable::PDistOut,
    ];

    /// Returns the name of the field holding the units of this variable.
    pub fn units_field(self) -> &'static str {
        match self {
            Self::Wse => "wse_units",
            Self::Width => "width_units",
            Self::AreaTotal => "area_total_units",
            Self::PDistOut => "p_dist_out_units",
        }
    }
}

impl FromStr for NodeVariable {
    type Err = SwotVisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|variable| variable.to_string() == s)
            .ok_or_else(|| SwotVisError::Schema {
                variable: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!("wse", NodeVariable::Wse.to_string());
        assert_eq!("width", NodeVariable::Width.to_string());
        assert_eq!("area_total", NodeVariable::AreaTotal.to_string());
        assert_eq!("p_dist_out", NodeVariable::PDistOut.to_string());
    }

    #[test]
    fn test_from_str() {
        for variable in NodeVariable::ALL {
            assert_eq!(variable, variable.to_string().parse().unwrap());
        }
    }

    #[test]
    #[should_panic(expected = "Schema { variable: \"wsee\" }")]
    fn test_from_str_unknown() {
        "wsee".parse::<NodeVariable>().unwrap();
    }

    #[test]
    fn test_deserialise() {
        let variable: NodeVariable = serde_json::from_str(r#""area_total""#).unwrap();
        assert_eq!(NodeVariable::AreaTotal, variable);
    }

    #[test]
    fn test_units_field() {
        assert_eq!("p_dist_out_units", NodeVariable::PDistOut.units_field());
    }
}
