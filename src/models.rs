//! Data types and associated functions and methods

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use validator::{Validate, ValidationErrors};

use crate::error::SwotVisError;
use crate::types::NodeVariable;
use crate::validated_json::Validated;

/// Name of the node quality flag field
pub const NODE_Q: &str = "node_q";
/// Name of the observation time text field
pub const TIME_STR: &str = "time_str";
/// Name of the parsed observation time field
pub const DATETIME: &str = "datetime";

/// A node observation as submitted by the client, before validation.
///
/// HydroCron reports every property as a string, while the front end may have converted some of
/// them to numbers, so fields are kept as raw JSON values until validated.
pub type RawNodeSample = serde_json::Map<String, Value>;

/// Reasons a node observation may be rejected
#[derive(Debug, Error)]
pub enum SampleError {
    /// A required field is absent or null
    #[error("missing field `{field}`")]
    Missing { field: &'static str },

    /// A field that should hold a float holds something else
    #[error("field `{field}`: expected a number, found {value}")]
    NotANumber { field: &'static str, value: String },

    /// A field that should hold an integer holds something else
    #[error("field `{field}`: expected an integer, found {value}")]
    NotAnInteger { field: &'static str, value: String },

    /// A field that should hold text holds something else
    #[error("field `{field}`: expected a string, found {value}")]
    NotAString { field: &'static str, value: String },

    /// A timestamp field could not be parsed
    #[error("field `{field}`: expected an RFC 3339 timestamp, found {value}")]
    NotATimestamp {
        field: &'static str,
        value: String,
        #[source]
        source: time::error::Parse,
    },

    /// A field failed declarative validation
    #[error(transparent)]
    Invalid(#[from] ValidationErrors),
}

/// One observation of one SWOT node during one overpass
#[derive(Clone, Debug, PartialEq, Validate)]
pub struct NodeSample {
    /// Node quality flag
    pub node_q: i64,
    /// Distance from the outlet of the feature
    pub p_dist_out: f64,
    /// Water surface elevation
    pub wse: f64,
    /// Width
    pub width: f64,
    /// Total cross-sectional area
    pub area_total: f64,
    /// Units of `wse`
    #[validate(length(min = 1, message = "units must not be empty"))]
    pub wse_units: String,
    /// Units of `width`
    #[validate(length(min = 1, message = "units must not be empty"))]
    pub width_units: String,
    /// Units of `area_total`
    #[validate(length(min = 1, message = "units must not be empty"))]
    pub area_total_units: String,
    /// Units of `p_dist_out`
    #[validate(length(min = 1, message = "units must not be empty"))]
    pub p_dist_out_units: String,
    /// Observation time as reported by HydroCron
    #[validate(length(min = 1, message = "time_str must not be empty"))]
    pub time_str: String,
    /// Parsed observation time
    pub datetime: OffsetDateTime,
}

impl NodeSample {
    /// Returns the value of a node variable.
    pub fn value(&self, variable: NodeVariable) -> f64 {
        match variable {
            NodeVariable::Wse => self.wse,
            NodeVariable::Width => self.width,
            NodeVariable::AreaTotal => self.area_total,
            NodeVariable::PDistOut => self.p_dist_out,
        }
    }

    /// Returns the units of a node variable.
    pub fn units(&self, variable: NodeVariable) -> &str {
        match variable {
            NodeVariable::Wse => &self.wse_units,
            NodeVariable::Width => &self.width_units,
            NodeVariable::AreaTotal => &self.area_total_units,
            NodeVariable::PDistOut => &self.p_dist_out_units,
        }
    }
}

/// Returns a required field, treating null as absent.
fn required<'a>(raw: &'a RawNodeSample, field: &'static str) -> Result<&'a Value, SampleError> {
    match raw.get(field) {
        None | Some(Value::Null) => Err(SampleError::Missing { field }),
        Some(value) => Ok(value),
    }
}

/// Parse a float field given either as a JSON number or a numeric string.
fn float_field(raw: &RawNodeSample, field: &'static str) -> Result<f64, SampleError> {
    let value = required(raw, field)?;
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| SampleError::NotANumber {
        field,
        value: value.to_string(),
    })
}

/// Parse an integer field given either as a JSON number or a numeric string.
///
/// Floats are accepted when they have no fractional part.
fn integer_field(raw: &RawNodeSample, field: &'static str) -> Result<i64, SampleError> {
    let value = required(raw, field)?;
    let parsed = match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.abs() < i64::MAX as f64)
                .map(|float| float as i64)
        }),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| SampleError::NotAnInteger {
        field,
        value: value.to_string(),
    })
}

/// Parse a text field.
fn string_field(raw: &RawNodeSample, field: &'static str) -> Result<String, SampleError> {
    match required(raw, field)? {
        Value::String(text) => Ok(text.clone()),
        other => Err(SampleError::NotAString {
            field,
            value: other.to_string(),
        }),
    }
}

/// Parse an RFC 3339 timestamp field.
fn timestamp_field(raw: &RawNodeSample, field: &'static str) -> Result<OffsetDateTime, SampleError> {
    let text = string_field(raw, field)?;
    OffsetDateTime::parse(&text, &Rfc3339).map_err(|source| SampleError::NotATimestamp {
        field,
        value: Value::String(text).to_string(),
        source,
    })
}

impl TryFrom<&RawNodeSample> for NodeSample {
    type Error = SampleError;

    /// Validate a raw node observation.
    ///
    /// Unknown fields are ignored.
    fn try_from(raw: &RawNodeSample) -> Result<Self, Self::Error> {
        let sample = NodeSample {
            node_q: integer_field(raw, NODE_Q)?,
            p_dist_out: float_field(raw, "p_dist_out")?,
            wse: float_field(raw, "wse")?,
            width: float_field(raw, "width")?,
            area_total: float_field(raw, "area_total")?,
            wse_units: string_field(raw, NodeVariable::Wse.units_field())?,
            width_units: string_field(raw, NodeVariable::Width.units_field())?,
            area_total_units: string_field(raw, NodeVariable::AreaTotal.units_field())?,
            p_dist_out_units: string_field(raw, NodeVariable::PDistOut.units_field())?,
            time_str: string_field(raw, TIME_STR)?,
            datetime: timestamp_field(raw, DATETIME)?,
        };
        sample.validate()?;
        Ok(sample)
    }
}

/// Node observations from a single overpass, in node order.
pub type NodeSeries = Vec<NodeSample>;

/// All overpasses of a single feature submitted for aggregation
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeriesCollection {
    passes: Vec<NodeSeries>,
}

impl SeriesCollection {
    /// Return a new SeriesCollection object.
    pub fn new(passes: Vec<NodeSeries>) -> Self {
        Self { passes }
    }

    /// Validate raw, pass-grouped node observations.
    ///
    /// Fails on the first invalid observation, reporting its pass and node index.
    pub fn from_raw(raw: &[Vec<RawNodeSample>]) -> Result<Self, SwotVisError> {
        let passes = raw
            .iter()
            .enumerate()
            .map(|(pass, series)| {
                series
                    .iter()
                    .enumerate()
                    .map(|(node, sample)| {
                        NodeSample::try_from(sample)
                            .map_err(|source| SwotVisError::Validation { pass, node, source })
                    })
                    .collect::<Result<NodeSeries, _>>()
            })
            .collect::<Result<Vec<NodeSeries>, _>>()?;
        Ok(Self::new(passes))
    }

    /// Returns the passes of this collection.
    pub fn passes(&self) -> &[NodeSeries] {
        &self.passes
    }

    /// Returns the total number of node observations over all passes.
    pub fn len(&self) -> usize {
        self.passes.iter().map(Vec::len).sum()
    }

    /// Returns whether the collection contains no node observations.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Validated for SeriesCollection {
    type Raw = Vec<Vec<RawNodeSample>>;

    fn validated(raw: Self::Raw) -> Result<Self, SwotVisError> {
        Self::from_raw(&raw)
    }
}

/// A variable pairing
///
/// Values of the `target` variable are binned by the rounded value of the `axis` variable and
/// reported under the `output` name.
///
/// The textual form is `[<output>=]<target>@<axis>[:<precision>]`, e.g. `wse@p_dist_out` or
/// `wse_by_width=wse@width:1`.
#[derive(Clone, Debug, PartialEq)]
pub struct Pairing {
    /// Name of the output column
    pub output: String,
    /// Variable summarised in each bin
    pub target: NodeVariable,
    /// Variable whose rounded value defines the bins
    pub axis: NodeVariable,
    /// Number of decimal places the axis value is rounded to
    pub precision: i32,
}

/// Largest supported bin precision, in decimal places either side of the point.
pub const MAX_PRECISION: i32 = 15;

impl Pairing {
    /// Return a new Pairing binned at integer precision and named after its target.
    pub fn new(target: NodeVariable, axis: NodeVariable) -> Self {
        Pairing {
            output: target.to_string(),
            target,
            axis,
            precision: 0,
        }
    }

    /// Set the output name.
    pub fn with_output(mut self, output: &str) -> Self {
        self.output = output.to_string();
        self
    }

    /// Set the bin precision.
    pub fn with_precision(mut self, precision: i32) -> Self {
        self.precision = precision;
        self
    }

    /// The default pairings: every physical quantity binned by distance from outlet.
    pub fn defaults() -> Vec<Pairing> {
        [NodeVariable::Wse, NodeVariable::Width, NodeVariable::AreaTotal]
            .into_iter()
            .map(|target| Pairing::new(target, NodeVariable::PDistOut))
            .collect()
    }
}

impl FromStr for Pairing {
    type Err = SwotVisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| SwotVisError::InvalidPairing {
            pairing: s.to_string(),
            reason: reason.to_string(),
        };
        let s_trimmed = s.trim();
        let (output, rest) = match s_trimmed.split_once('=') {
            Some((output, rest)) => (Some(output.trim()), rest),
            None => (None, s_trimmed),
        };
        let (target, rest) = rest
            .split_once('@')
            .ok_or_else(|| invalid("expected <target>@<axis>"))?;
        let (axis, precision) = match rest.split_once(':') {
            Some((axis, precision)) => {
                let precision = precision
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| invalid("precision must be an integer"))?;
                (axis, precision)
            }
            None => (rest, 0),
        };
        if precision.abs() > MAX_PRECISION {
            return Err(invalid("precision out of range"));
        }
        let target: NodeVariable = target.trim().parse()?;
        let axis: NodeVariable = axis.trim().parse()?;
        let pairing = Pairing::new(target, axis).with_precision(precision);
        match output {
            Some("") => Err(invalid("output name must not be empty")),
            Some(output) => Ok(pairing.with_output(output)),
            None => Ok(pairing),
        }
    }
}

impl fmt::Display for Pairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}={}@{}:{}",
            self.output, self.target, self.axis, self.precision
        )
    }
}

/// Parse a comma separated list of pairings.
pub fn parse_pairings(s: &str) -> Result<Vec<Pairing>, SwotVisError> {
    s.split(',')
        .filter(|pairing| !pairing.trim().is_empty())
        .map(Pairing::from_str)
        .collect()
}
