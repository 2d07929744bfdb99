//! Aggregation descriptions and results.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::Field;

/// What to compute per group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Aggregation {
    /// Number of records per group.
    Count,
    /// Most frequent `secondary` value per group, with its count.
    DominantSubCategory { secondary: Field },
    /// Co-occurrence count of every (primary, secondary) pair.
    CrossTab { secondary: Field },
}

/// A pure description of an aggregation: group by `primary`, then apply
/// `aggregation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationSpec {
    pub primary: Field,
    pub aggregation: Aggregation,
}

impl AggregationSpec {
    pub fn count(primary: Field) -> Self {
        Self { primary, aggregation: Aggregation::Count }
    }

    pub fn dominant(primary: Field, secondary: Field) -> Self {
        Self {
            primary,
            aggregation: Aggregation::DominantSubCategory { secondary },
        }
    }

    pub fn cross_tab(primary: Field, secondary: Field) -> Self {
        Self {
            primary,
            aggregation: Aggregation::CrossTab { secondary },
        }
    }

    pub fn secondary(&self) -> Option<Field> {
        match self.aggregation {
            Aggregation::Count => None,
            Aggregation::DominantSubCategory { secondary } | Aggregation::CrossTab { secondary } => {
                Some(secondary)
            }
        }
    }

    pub fn is_cross_tab(&self) -> bool {
        matches!(self.aggregation, Aggregation::CrossTab { .. })
    }
}

/// One output unit of an aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRow {
    /// Group label of the primary dimension
    pub key: String,
    /// Count of the group, of the dominant value, or of the cell
    pub count: usize,
    /// Dominant secondary label (dominant sub-category mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dominant: Option<String>,
    /// Secondary key of the cell (cross-tab mode)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl AggregatedRow {
    pub fn counted(key: impl Into<String>, count: usize) -> Self {
        Self { key: key.into(), count, dominant: None, column: None }
    }

    pub fn with_dominant(key: impl Into<String>, dominant: impl Into<String>, count: usize) -> Self {
        Self {
            key: key.into(),
            count,
            dominant: Some(dominant.into()),
            column: None,
        }
    }

    pub fn cell(key: impl Into<String>, column: impl Into<String>, count: usize) -> Self {
        Self {
            key: key.into(),
            count,
            dominant: None,
            column: Some(column.into()),
        }
    }
}

/// Rows of one aggregation plus the axes a chart needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregationResult {
    pub spec: AggregationSpec,
    pub rows: Vec<AggregatedRow>,
    /// Distinct primary labels, in row order
    pub primary_axis: Vec<String>,
    /// Distinct secondary labels (cross-tab only)
    pub secondary_axis: Vec<String>,
    /// Filtered records left out because their primary value is unknown
    pub unknown_primary: usize,
    /// Filtered records without a cross-tab cell because their secondary value is unknown
    pub unknown_secondary: usize,
}

impl AggregationResult {
    pub fn empty(spec: AggregationSpec) -> Self {
        Self {
            spec,
            rows: Vec::new(),
            primary_axis: Vec::new(),
            secondary_axis: Vec::new(),
            unknown_primary: 0,
            unknown_secondary: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sum of all row counts.
    pub fn total(&self) -> usize {
        self.rows.iter().map(|r| r.count).sum()
    }

    pub fn max_count(&self) -> usize {
        self.rows.iter().map(|r| r.count).max().unwrap_or(0)
    }

    /// First row with primary label `key`.
    pub fn find(&self, key: &str) -> Option<&AggregatedRow> {
        self.rows.iter().find(|r| r.key == key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.primary_axis.iter().any(|k| k == key)
    }

    /// Count of a cross-tab cell; absent pairs count 0.
    pub fn cell(&self, key: &str, column: &str) -> usize {
        self.rows
            .iter()
            .find(|r| r.key == key && r.column.as_deref() == Some(column))
            .map(|r| r.count)
            .unwrap_or(0)
    }

    /// Distinct dominant labels in row order, for a chart legend.
    pub fn legend(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.rows
            .iter()
            .filter_map(|r| r.dominant.as_ref())
            .filter(|d| seen.insert(d.as_str()))
            .cloned()
            .collect()
    }
}
