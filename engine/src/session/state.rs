//! The selection state: everything the chart depends on besides the data.

use serde::{Deserialize, Serialize};

use super::mode::VisualizationMode;
use crate::filter::FilterSet;
use crate::sort::SortOrder;

/// Full description of what the user is looking at.
///
/// Transitions are value-to-value: each `with_*` method returns the next
/// state and applies the drill-down rule of that transition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectionState {
    pub mode: VisualizationMode,
    pub filters: FilterSet,
    pub sort: SortOrder,
    /// Selected group key, resolved against the chart on every recompute
    pub drill_down: Option<String>,
}

impl SelectionState {
    /// Switch chart; filters and sort stay, the selection does not.
    pub fn with_mode(&self, mode: VisualizationMode) -> Self {
        Self {
            mode,
            drill_down: None,
            ..self.clone()
        }
    }

    /// Replace the filters wholesale; the selection is dropped.
    pub fn with_filters(&self, filters: FilterSet) -> Self {
        Self {
            filters,
            drill_down: None,
            ..self.clone()
        }
    }

    /// Change the order; the selection is kept and re-resolved.
    pub fn with_sort(&self, sort: SortOrder) -> Self {
        Self { sort, ..self.clone() }
    }

    pub fn with_drill_down(&self, key: impl Into<String>) -> Self {
        Self {
            drill_down: Some(key.into()),
            ..self.clone()
        }
    }

    pub fn without_drill_down(&self) -> Self {
        Self {
            drill_down: None,
            ..self.clone()
        }
    }
}
