//! Aggregation module.
//!
//! - Spec: what to compute (`AggregationSpec`) and what comes out
//!   (`AggregatedRow`, `AggregationResult`)
//! - Grouper: the single aggregator behind every chart

pub mod grouper;
pub mod spec;

pub use grouper::aggregate;
pub use spec::*;

use std::sync::Arc;

use crate::filter::{evaluate, FilterSet};
use crate::models::Dataset;

/// Aggregate over owned snapshots.
///
/// Callers that precompute several charts on other threads hand each call
/// its own `Arc<Dataset>` and `FilterSet`, so no call observes a dataset or
/// filter change made while it runs.
pub fn aggregate_snapshot(dataset: Arc<Dataset>, filters: FilterSet, spec: AggregationSpec) -> AggregationResult {
    aggregate(&evaluate(&dataset, &filters), &spec)
}
