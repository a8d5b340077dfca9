//! Tabular projection of a [SeriesCollection].
//!
//! Binning and statistics operate across all passes jointly, so the pass-grouped collection is
//! flattened into a single table of rows, each annotated with the pass it came from. The table
//! borrows its rows from the collection: nothing is copied until a column is materialised.

use crate::models::{NodeSample, SeriesCollection};
use crate::types::{Missing, NodeVariable};

use ndarray::Array1;

/// A single row of a [NodeTable].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeRow<'a> {
    /// Index of the pass the sample belongs to
    pub pass: usize,
    /// The node observation
    pub sample: &'a NodeSample,
}

/// Flat table of node observations across all passes of a collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NodeTable<'a> {
    rows: Vec<NodeRow<'a>>,
}

impl<'a> NodeTable<'a> {
    /// Flatten a collection, preserving pass order and node order within each pass.
    pub fn project(collection: &'a SeriesCollection) -> Self {
        let rows = collection
            .passes()
            .iter()
            .enumerate()
            .flat_map(|(pass, series)| series.iter().map(move |sample| NodeRow { pass, sample }))
            .collect();
        Self { rows }
    }

    /// Returns the rows of the table.
    pub fn rows(&self) -> &[NodeRow<'a>] {
        &self.rows
    }

    /// Returns the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the pass index column.
    pub fn passes(&self) -> Array1<usize> {
        self.rows.iter().map(|row| row.pass).collect()
    }

    /// Returns the node quality flag column.
    pub fn node_q(&self) -> Array1<i64> {
        self.rows.iter().map(|row| row.sample.node_q).collect()
    }

    /// Returns the values of a node variable, one per row.
    ///
    /// Values described as missing are replaced by NaN.
    ///
    /// # Arguments
    ///
    /// * `variable`: Column to materialise
    /// * `missing`: Optional missing data descriptor
    pub fn column(&self, variable: NodeVariable, missing: Option<&Missing>) -> Array1<f64> {
        self.rows
            .iter()
            .map(|row| {
                let value = row.sample.value(variable);
                match missing {
                    Some(missing) => missing.mask(value),
                    None => value,
                }
            })
            .collect()
    }
}
