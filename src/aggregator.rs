//! Binned quantile aggregation.
//!
//! For each [Pairing], rows of a [NodeTable] are partitioned into bins by the rounded value of the
//! pairing's axis variable and the median and interquartile bounds of the target variable are
//! computed per bin. Results of all pairings are then merged, per statistic, into one table.
//!
//! The merge is positional: row `i` of the merged table holds bin `i` of every pairing. When all
//! pairings share an axis variable and precision their bins coincide. When they do not, rows
//! combine unrelated bins and pairings with fewer bins are padded with nulls. Values are never
//! re-joined by key.

use std::collections::{BTreeMap, HashSet};

use crate::binning;
use crate::error::SwotVisError;
use crate::formatter::{self, NodeSeriesStatistics};
use crate::models::{Pairing, SeriesCollection};
use crate::operations;
use crate::table::NodeTable;
use crate::types::{Missing, NodeVariable, Statistic};

/// Result of one statistic for one pairing.
#[derive(Clone, Debug, PartialEq)]
pub struct StatisticResult {
    /// Statistic kind
    pub statistic: Statistic,
    /// Axis variable the bins were built from
    pub axis: NodeVariable,
    /// Output name of the pairing
    pub output: String,
    /// Bin key and statistic value of each bin, in ascending key order
    pub bins: Vec<(f64, Option<f64>)>,
}

/// Merged results of all pairings for one statistic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StatisticTable {
    /// Column names, in output order
    pub columns: Vec<String>,
    /// One row per bin position, one cell per column
    pub rows: Vec<Vec<Option<f64>>>,
}

/// Merge the results of several pairings for one statistic by position.
///
/// Each pairing contributes its axis column, unless an earlier pairing already contributed a
/// column for the same axis variable, followed by its output column. The table has as many rows
/// as the pairing with the most bins.
pub fn merge(results: &[StatisticResult]) -> StatisticTable {
    enum Source<'a> {
        Key(&'a StatisticResult),
        Value(&'a StatisticResult),
    }

    let mut columns = Vec::new();
    let mut sources = Vec::new();
    for result in results {
        let axis = result.axis.to_string();
        if !columns.contains(&axis) {
            columns.push(axis);
            sources.push(Source::Key(result));
        }
        columns.push(result.output.clone());
        sources.push(Source::Value(result));
    }

    let len = results
        .iter()
        .map(|result| result.bins.len())
        .max()
        .unwrap_or(0);
    let rows = (0..len)
        .map(|i| {
            sources
                .iter()
                .map(|source| match source {
                    Source::Key(result) => result.bins.get(i).map(|(key, _)| *key),
                    Source::Value(result) => result.bins.get(i).and_then(|(_, value)| *value),
                })
                .collect()
        })
        .collect();

    StatisticTable { columns, rows }
}

/// Check that the pairings produce distinct column names.
fn validate_pairings(pairings: &[Pairing]) -> Result<(), SwotVisError> {
    if pairings.is_empty() {
        return Err(SwotVisError::InvalidPairing {
            pairing: String::new(),
            reason: "at least one pairing is required".to_string(),
        });
    }
    let axes: HashSet<String> = pairings.iter().map(|p| p.axis.to_string()).collect();
    let mut outputs = HashSet::new();
    for pairing in pairings {
        if axes.contains(&pairing.output) || !outputs.insert(pairing.output.as_str()) {
            return Err(SwotVisError::PairingConflict {
                name: pairing.output.clone(),
            });
        }
    }
    Ok(())
}

/// Binned quantile aggregator.
///
/// Holds the pairings and missing data policy. Every call to [Aggregator::compute] owns its
/// intermediate data, so an aggregator may be shared between concurrent requests.
#[derive(Clone, Debug, PartialEq)]
pub struct Aggregator {
    pairings: Vec<Pairing>,
    missing: Option<Missing>,
}

impl Aggregator {
    /// Returns a new Aggregator.
    ///
    /// # Arguments
    ///
    /// * `pairings`: Variable pairings to compute, in output order
    /// * `missing`: Optional missing data descriptor applied to axis and target values
    pub fn new(pairings: Vec<Pairing>, missing: Option<Missing>) -> Result<Self, SwotVisError> {
        validate_pairings(&pairings)?;
        if let Some(missing) = &missing {
            missing.validate()?;
        }
        Ok(Self { pairings, missing })
    }

    /// Returns an Aggregator with the same missing data policy and different pairings.
    pub fn with_pairings(&self, pairings: Vec<Pairing>) -> Result<Self, SwotVisError> {
        Self::new(pairings, self.missing.clone())
    }

    /// Returns the pairings.
    pub fn pairings(&self) -> &[Pairing] {
        &self.pairings
    }

    /// Returns the missing data descriptor.
    pub fn missing(&self) -> Option<&Missing> {
        self.missing.as_ref()
    }

    /// Compute every statistic for a single pairing.
    ///
    /// Returns one result per statistic kind, in [Statistic::ALL] order.
    pub fn compute_pairing(
        &self,
        table: &NodeTable,
        pairing: &Pairing,
    ) -> Result<Vec<StatisticResult>, SwotVisError> {
        let axis = table.column(pairing.axis, self.missing());
        let target = table.column(pairing.target, self.missing());
        let bins = binning::partition(&axis.view(), pairing.precision);
        tracing::debug!(%pairing, bins = bins.len(), "partitioned rows");

        let mut results: Vec<StatisticResult> = Statistic::ALL
            .into_iter()
            .map(|statistic| StatisticResult {
                statistic,
                axis: pairing.axis,
                output: pairing.output.clone(),
                bins: Vec::with_capacity(bins.len()),
            })
            .collect();
        for bin in &bins {
            let mut values = bin.select(&target.view());
            for result in results.iter_mut() {
                let value = operations::compute(&mut values, result.statistic)?;
                result.bins.push((bin.key, value));
            }
        }
        Ok(results)
    }

    /// Compute and merge the statistics of all pairings.
    #[tracing::instrument(level = "DEBUG", skip_all, fields(rows = table.len()))]
    pub fn aggregate(
        &self,
        table: &NodeTable,
    ) -> Result<BTreeMap<Statistic, StatisticTable>, SwotVisError> {
        let mut by_statistic: BTreeMap<Statistic, Vec<StatisticResult>> = BTreeMap::new();
        for pairing in &self.pairings {
            for result in self.compute_pairing(table, pairing)? {
                by_statistic.entry(result.statistic).or_default().push(result);
            }
        }
        Ok(Statistic::ALL
            .into_iter()
            .map(|statistic| {
                let results = by_statistic.remove(&statistic).unwrap_or_default();
                (statistic, merge(&results))
            })
            .collect())
    }

    /// Compute node series statistics for a collection of passes.
    pub fn compute(
        &self,
        collection: &SeriesCollection,
    ) -> Result<NodeSeriesStatistics, SwotVisError> {
        let table = NodeTable::project(collection);
        let tables = self.aggregate(&table)?;
        Ok(formatter::format(&tables))
    }
}

impl Default for Aggregator {
    /// The default pairings with no missing data descriptor.
    fn default() -> Self {
        Self {
            pairings: Pairing::defaults(),
            missing: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils;

    fn result(axis: NodeVariable, output: &str, bins: Vec<(f64, Option<f64>)>) -> StatisticResult {
        StatisticResult {
            statistic: Statistic::Median,
            axis,
            output: output.to_string(),
            bins,
        }
    }

    fn wse_pairing(precision: i32) -> Vec<Pairing> {
        vec![Pairing::new(NodeVariable::Wse, NodeVariable::PDistOut).with_precision(precision)]
    }

    fn collection(points: &[(f64, f64)]) -> SeriesCollection {
        SeriesCollection::new(vec![points
            .iter()
            .map(|(x, y)| test_utils::get_test_sample(*x, *y))
            .collect()])
    }

    #[test]
    fn test_merge_shared_axis() {
        let table = merge(&[
            result(NodeVariable::PDistOut, "wse", vec![(1.0, Some(10.0)), (2.0, None)]),
            result(NodeVariable::PDistOut, "width", vec![(1.0, Some(5.0)), (2.0, Some(6.0))]),
        ]);
        assert_eq!(vec!["p_dist_out", "wse", "width"], table.columns);
        assert_eq!(
            vec![
                vec![Some(1.0), Some(10.0), Some(5.0)],
                vec![Some(2.0), None, Some(6.0)],
            ],
            table.rows
        );
    }

    #[test]
    fn test_merge_different_axes_is_positional() {
        let table = merge(&[
            result(
                NodeVariable::PDistOut,
                "wse",
                vec![(100.0, Some(1.0)), (200.0, Some(2.0)), (300.0, Some(3.0))],
            ),
            result(NodeVariable::Width, "area", vec![(50.0, Some(7.0))]),
        ]);
        assert_eq!(vec!["p_dist_out", "wse", "width", "area"], table.columns);
        assert_eq!(
            vec![
                vec![Some(100.0), Some(1.0), Some(50.0), Some(7.0)],
                vec![Some(200.0), Some(2.0), None, None],
                vec![Some(300.0), Some(3.0), None, None],
            ],
            table.rows
        );
    }

    #[test]
    fn test_merge_first_axis_wins() {
        let table = merge(&[
            result(NodeVariable::PDistOut, "coarse", vec![(100.0, Some(1.0))]),
            result(NodeVariable::PDistOut, "fine", vec![(99.5, Some(2.0))]),
        ]);
        assert_eq!(vec!["p_dist_out", "coarse", "fine"], table.columns);
        assert_eq!(vec![vec![Some(100.0), Some(1.0), Some(2.0)]], table.rows);
    }

    #[test]
    fn test_merge_nothing() {
        assert_eq!(StatisticTable::default(), merge(&[]));
    }

    #[test]
    fn test_new_validates_pairings() {
        Aggregator::new(Pairing::defaults(), None).unwrap();
        let duplicate = vec![
            Pairing::new(NodeVariable::Wse, NodeVariable::PDistOut),
            Pairing::new(NodeVariable::Wse, NodeVariable::Width),
        ];
        match Aggregator::new(duplicate, None).unwrap_err() {
            SwotVisError::PairingConflict { name } => assert_eq!("wse", name),
            error => panic!("unexpected error {error:?}"),
        }
    }

    #[test]
    fn test_new_rejects_output_named_after_axis() {
        let pairings = vec![
            Pairing::new(NodeVariable::Wse, NodeVariable::PDistOut),
            Pairing::new(NodeVariable::Width, NodeVariable::PDistOut),
            Pairing::new(NodeVariable::AreaTotal, NodeVariable::Width),
        ];
        match Aggregator::new(pairings, None).unwrap_err() {
            SwotVisError::PairingConflict { name } => assert_eq!("width", name),
            error => panic!("unexpected error {error:?}"),
        }
    }

    #[test]
    #[should_panic(expected = "at least one pairing is required")]
    fn test_new_rejects_no_pairings() {
        Aggregator::new(vec![], None).unwrap();
    }

    #[test]
    #[should_panic(expected = "Missing data valid range min must be less than max")]
    fn test_new_validates_missing() {
        Aggregator::new(Pairing::defaults(), Some(Missing::ValidRange(1.0, 0.0))).unwrap();
    }

    #[test]
    fn test_with_pairings_keeps_missing() {
        let aggregator =
            Aggregator::new(Pairing::defaults(), Some(Missing::MissingValue(-1.0))).unwrap();
        let other = aggregator.with_pairings(wse_pairing(1)).unwrap();
        assert_eq!(Some(&Missing::MissingValue(-1.0)), other.missing());
        assert_eq!(&wse_pairing(1)[..], other.pairings());
    }

    #[test]
    fn test_compute_pairing_two_observations() {
        let collection = collection(&[(100.4, 10.0), (100.6, 20.0)]);
        let table = NodeTable::project(&collection);
        let aggregator = Aggregator::new(wse_pairing(0), None).unwrap();
        let results = aggregator
            .compute_pairing(&table, &aggregator.pairings()[0])
            .unwrap();
        let statistics: Vec<Statistic> = results.iter().map(|r| r.statistic).collect();
        assert_eq!(Statistic::ALL.to_vec(), statistics);
        assert_eq!(vec![(100.0, Some(15.0))], results[0].bins);
        assert_eq!(vec![(100.0, Some(12.5))], results[1].bins);
        assert_eq!(vec![(100.0, Some(17.5))], results[2].bins);
    }

    #[test]
    fn test_compute_pairing_single_observation() {
        let collection = collection(&[(50.0, 7.5)]);
        let table = NodeTable::project(&collection);
        let aggregator = Aggregator::new(wse_pairing(0), None).unwrap();
        let results = aggregator
            .compute_pairing(&table, &aggregator.pairings()[0])
            .unwrap();
        for result in results {
            assert_eq!(vec![(50.0, Some(7.5))], result.bins);
        }
    }

    #[test]
    fn test_compute_pairing_fine_precision() {
        let collection = collection(&[(100.4, 10.0), (100.6, 20.0)]);
        let table = NodeTable::project(&collection);
        let aggregator = Aggregator::new(wse_pairing(1), None).unwrap();
        let results = aggregator
            .compute_pairing(&table, &aggregator.pairings()[0])
            .unwrap();
        assert_eq!(vec![(100.4, Some(10.0)), (100.6, Some(20.0))], results[0].bins);
    }

    #[test]
    fn test_compute_pairing_coarse_precision() {
        let collection = collection(&[(104.0, 10.0), (96.0, 20.0)]);
        let table = NodeTable::project(&collection);
        let aggregator = Aggregator::new(wse_pairing(-1), None).unwrap();
        let results = aggregator
            .compute_pairing(&table, &aggregator.pairings()[0])
            .unwrap();
        assert_eq!(vec![(90.0, Some(20.0)), (100.0, Some(10.0))], results[0].bins);
    }

    #[test]
    fn test_compute_pairing_missing_axis_excluded() {
        let collection = collection(&[(-999999999999.0, 1.0), (50.0, 7.5)]);
        let table = NodeTable::project(&collection);
        let missing = Missing::MissingValue(-999999999999.0);
        let aggregator = Aggregator::new(wse_pairing(0), Some(missing)).unwrap();
        let results = aggregator
            .compute_pairing(&table, &aggregator.pairings()[0])
            .unwrap();
        assert_eq!(vec![(50.0, Some(7.5))], results[0].bins);
    }

    #[test]
    fn test_compute_pairing_sentinel_literal_by_default() {
        let collection = collection(&[(50.0, -999999999999.0), (50.0, 1.0)]);
        let table = NodeTable::project(&collection);
        let aggregator = Aggregator::new(wse_pairing(0), None).unwrap();
        let results = aggregator
            .compute_pairing(&table, &aggregator.pairings()[0])
            .unwrap();
        assert_eq!(vec![(50.0, Some(-499999999999.0))], results[0].bins);
    }

    #[test]
    fn test_compute_pairing_missing_target_is_null() {
        let collection = collection(&[(50.0, -999999999999.0)]);
        let table = NodeTable::project(&collection);
        let missing = Missing::MissingValue(-999999999999.0);
        let aggregator = Aggregator::new(wse_pairing(0), Some(missing)).unwrap();
        let results = aggregator
            .compute_pairing(&table, &aggregator.pairings()[0])
            .unwrap();
        for result in results {
            assert_eq!(vec![(50.0, None)], result.bins);
        }
    }

    #[test]
    fn test_aggregate_empty_table() {
        let collection = SeriesCollection::default();
        let table = NodeTable::project(&collection);
        let tables = Aggregator::default().aggregate(&table).unwrap();
        assert_eq!(3, tables.len());
        for statistic in Statistic::ALL {
            assert!(tables[&statistic].rows.is_empty());
            assert_eq!(
                vec!["p_dist_out", "wse", "width", "area_total"],
                tables[&statistic].columns
            );
        }
    }

    #[test]
    fn test_aggregate_default_pairings() {
        let collection = collection(&[(50.0, 7.5), (60.0, 1.0), (60.0, 3.0)]);
        let table = NodeTable::project(&collection);
        let tables = Aggregator::default().aggregate(&table).unwrap();
        let median = &tables[&Statistic::Median];
        assert_eq!(
            vec![
                vec![Some(50.0), Some(7.5), Some(100.0), Some(1000.0)],
                vec![Some(60.0), Some(2.0), Some(100.0), Some(1000.0)],
            ],
            median.rows
        );
        let lower = &tables[&Statistic::QuantileLower];
        assert_eq!(Some(1.5), lower.rows[1][1]);
        let upper = &tables[&Statistic::QuantileUpper];
        assert_eq!(Some(2.5), upper.rows[1][1]);
    }

    #[test]
    fn test_compute_is_deterministic() {
        let collection = collection(&[(3.2, 1.0), (1.1, 2.0), (2.7, 3.0), (1.4, 4.0), (3.0, 5.0)]);
        let aggregator = Aggregator::default();
        let first = serde_json::to_string(&aggregator.compute(&collection).unwrap()).unwrap();
        let second = serde_json::to_string(&aggregator.compute(&collection).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
