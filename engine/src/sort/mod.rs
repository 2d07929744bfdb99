//! Ordering of aggregated rows.
//!
//! Sorting is stable and pure: rows with equal keys keep their prior
//! relative order, and the input is never modified.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::aggregate::{AggregatedRow, AggregationResult};

/// How aggregated groups are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortOrder {
    /// Aggregator emission order (first seen first).
    #[default]
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "alphabetical-asc")]
    LabelAsc,
    #[serde(rename = "alphabetical-desc")]
    LabelDesc,
    #[serde(rename = "count-asc")]
    CountAsc,
    #[serde(rename = "count-desc")]
    CountDesc,
}

impl SortOrder {
    pub const ALL: [SortOrder; 5] = [
        SortOrder::Default,
        SortOrder::LabelAsc,
        SortOrder::LabelDesc,
        SortOrder::CountAsc,
        SortOrder::CountDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Default => "default",
            SortOrder::LabelAsc => "alphabetical-asc",
            SortOrder::LabelDesc => "alphabetical-desc",
            SortOrder::CountAsc => "count-asc",
            SortOrder::CountDesc => "count-desc",
        }
    }

    /// Compare two (label, count) pairs; `None` for the default order.
    fn compare(&self, a: (&str, usize), b: (&str, usize)) -> Option<Ordering> {
        match self {
            SortOrder::Default => None,
            SortOrder::LabelAsc => Some(a.0.cmp(b.0)),
            SortOrder::LabelDesc => Some(b.0.cmp(a.0)),
            SortOrder::CountAsc => Some(a.1.cmp(&b.1)),
            SortOrder::CountDesc => Some(b.1.cmp(&a.1)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOrder::ALL
            .into_iter()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<_> = SortOrder::ALL.iter().map(|o| o.as_str()).collect();
                format!("unknown sort order '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

/// Return `rows` ordered by `order`.
pub fn sort_rows(rows: &[AggregatedRow], order: SortOrder) -> Vec<AggregatedRow> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| {
        order
            .compare((a.key.as_str(), a.count), (b.key.as_str(), b.count))
            .unwrap_or(Ordering::Equal)
    });
    sorted
}

/// Order a whole result: its rows, and its primary axis to match.
///
/// For a cross-tabulation the axis is ordered by label, or by the total
/// count of each axis entry across its cells.
pub fn sort_result(result: &AggregationResult, order: SortOrder) -> AggregationResult {
    let rows = sort_rows(&result.rows, order);

    let primary_axis = if result.spec.is_cross_tab() {
        let mut totals: HashMap<&str, usize> = HashMap::new();
        for row in &result.rows {
            *totals.entry(row.key.as_str()).or_insert(0) += row.count;
        }
        let mut axis = result.primary_axis.clone();
        axis.sort_by(|a, b| {
            let ta = totals.get(a.as_str()).copied().unwrap_or(0);
            let tb = totals.get(b.as_str()).copied().unwrap_or(0);
            order.compare((a.as_str(), ta), (b.as_str(), tb)).unwrap_or(Ordering::Equal)
        });
        axis
    } else {
        rows.iter().map(|r| r.key.clone()).collect()
    };

    AggregationResult {
        rows,
        primary_axis,
        ..result.clone()
    }
}
