//! This crate provides the SWOT visualisation server. It computes binned node-series statistics
//! from SWOT river and lake observations retrieved from
//! [HydroCron](https://podaac.github.io/hydrocron/), and forwards timeseries requests to HydroCron
//! on behalf of the browser front end.
//!
//! Node observations from many satellite overpasses are flattened into a single table, partitioned
//! into bins along an axis variable (by default distance from the outlet, rounded down to whole
//! metres), and summarised per bin by their median and interquartile bounds. The result is a set
//! of flat records per statistic, ready to be plotted.
//!
//! The server is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team, on top of the [hyper] HTTP library.
//! * [Serde](serde) performs (de)serialisation of JSON request and response data.
//! * [reqwest] forwards requests to HydroCron.
//! * [ndarray] and [ndarray_stats] provide the columns and quantiles used in numerical
//!   computation.

pub mod aggregator;
pub mod app;
pub mod app_state;
pub mod binning;
pub mod cli;
pub mod error;
pub mod formatter;
pub mod hydrocron;
pub mod metrics;
pub mod models;
pub mod operations;
pub mod resource_manager;
pub mod server;
pub mod table;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod types;
pub mod validated_json;
