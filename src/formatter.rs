//! Conversion of merged statistic tables into the response payload.

use std::collections::BTreeMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::aggregator::StatisticTable;
use crate::types::Statistic;

/// A single bin of a statistic result.
///
/// Serialises as a flat JSON object whose keys appear in column order. Undefined values are
/// serialised as `null`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BinRecord {
    fields: Vec<(String, Option<f64>)>,
}

impl BinRecord {
    /// Returns the fields of the record, in column order.
    pub fn fields(&self) -> &[(String, Option<f64>)] {
        &self.fields
    }

    /// Returns the value of a field, or `None` if the field is absent or null.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .and_then(|(_, value)| *value)
    }
}

impl Serialize for BinRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Node series statistics response
///
/// One record sequence per statistic kind, each in ascending bin order.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct NodeSeriesStatistics {
    /// 50th percentile of each bin
    pub median: Vec<BinRecord>,
    /// 25th percentile of each bin
    #[serde(rename = "q0.25")]
    pub q_lower: Vec<BinRecord>,
    /// 75th percentile of each bin
    #[serde(rename = "q0.75")]
    pub q_upper: Vec<BinRecord>,
}

impl NodeSeriesStatistics {
    /// Returns the records of a statistic kind.
    pub fn get(&self, statistic: Statistic) -> &[BinRecord] {
        match statistic {
            Statistic::Median => &self.median,
            Statistic::QuantileLower => &self.q_lower,
            Statistic::QuantileUpper => &self.q_upper,
        }
    }

    fn get_mut(&mut self, statistic: Statistic) -> &mut Vec<BinRecord> {
        match statistic {
            Statistic::Median => &mut self.median,
            Statistic::QuantileLower => &mut self.q_lower,
            Statistic::QuantileUpper => &mut self.q_upper,
        }
    }
}

/// Convert a merged statistic table into records, one per row.
pub fn records(table: &StatisticTable) -> Vec<BinRecord> {
    table
        .rows
        .iter()
        .map(|row| BinRecord {
            fields: table.columns.iter().cloned().zip(row.iter().copied()).collect(),
        })
        .collect()
}

/// Build the response payload from the merged table of each statistic kind.
///
/// Statistic kinds without a table produce an empty record sequence.
pub fn format(tables: &BTreeMap<Statistic, StatisticTable>) -> NodeSeriesStatistics {
    let mut statistics = NodeSeriesStatistics::default();
    for (statistic, table) in tables {
        *statistics.get_mut(*statistic) = records(table);
    }
    statistics
}
