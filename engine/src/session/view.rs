//! What the rendering and table collaborators receive.
//!
//! [`compute_view`] is a pure function of the dataset and the selection
//! state. The session calls it once per transition and hands the same value
//! to the chart and to the detail table.

use serde::Serialize;

use super::mode::{AxisLabels, VisualizationMode};
use super::state::SelectionState;
use crate::aggregate::{aggregate, AggregatedRow, AggregationResult, AggregationSpec};
use crate::filter::{evaluate, Scope};
use crate::models::{Dataset, Field};
use crate::sort::sort_result;

/// A valid aggregation with no rows.
///
/// Renderers show an explicit "no data" state for it instead of an empty
/// chart that reads as still loading.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmptyAggregationResult {
    pub mode: VisualizationMode,
    pub title: String,
    /// Records that passed the filters (all with an unknown primary value)
    pub filtered_records: usize,
}

/// A chart ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartView {
    pub mode: VisualizationMode,
    pub title: String,
    pub axis: AxisLabels,
    /// Sorted aggregation
    pub result: AggregationResult,
    /// Distinct dominant labels, for colouring bars
    pub legend: Vec<String>,
    pub filtered_records: usize,
}

impl ChartView {
    pub fn rows(&self) -> &[AggregatedRow] {
        &self.result.rows
    }
}

/// Chart output of one recompute.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Chart {
    Empty(EmptyAggregationResult),
    Ready(ChartView),
}

impl Chart {
    pub fn is_empty(&self) -> bool {
        matches!(self, Chart::Empty(_))
    }

    pub fn mode(&self) -> VisualizationMode {
        match self {
            Chart::Empty(e) => e.mode,
            Chart::Ready(c) => c.mode,
        }
    }

    /// Rows to draw; empty for [`Chart::Empty`].
    pub fn rows(&self) -> &[AggregatedRow] {
        match self {
            Chart::Empty(_) => &[],
            Chart::Ready(c) => c.rows(),
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        match self {
            Chart::Empty(_) => false,
            Chart::Ready(c) => c.result.contains_key(key),
        }
    }
}

/// Detail panel for the selected group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillDown {
    pub key: String,
    /// The selected group as shown on the chart (cell total for a cross-tab)
    pub summary: AggregatedRow,
    /// Field the breakdown groups by
    pub breakdown_field: Field,
    pub breakdown: AggregationResult,
}

/// Everything derived from one (dataset, state) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    /// Effective state; a selection that no longer resolves is cleared
    pub state: SelectionState,
    pub chart: Chart,
    pub detail: Option<DrillDown>,
}

/// Filter, aggregate and sort for `state`, then resolve its drill-down.
pub fn compute_view(dataset: &Dataset, state: &SelectionState) -> DashboardView {
    let mode = state.mode;
    let view = evaluate(dataset, &state.filters);
    let filtered_records = view.count();

    let result = sort_result(&aggregate(&view, &mode.spec()), state.sort);

    let chart = if result.is_empty() {
        Chart::Empty(EmptyAggregationResult {
            mode,
            title: mode.title().to_string(),
            filtered_records,
        })
    } else {
        Chart::Ready(ChartView {
            mode,
            title: mode.title().to_string(),
            axis: mode.axis_labels(),
            legend: result.legend(),
            result,
            filtered_records,
        })
    };

    let detail = match (&state.drill_down, &chart) {
        (Some(key), Chart::Ready(c)) if c.result.contains_key(key) => {
            Some(drill_down(dataset, state, &c.result, key))
        }
        _ => None,
    };

    let mut state = state.clone();
    if detail.is_none() {
        state.drill_down = None;
    }

    DashboardView { state, chart, detail }
}

fn drill_down(dataset: &Dataset, state: &SelectionState, chart: &AggregationResult, key: &str) -> DrillDown {
    let mode = state.mode;
    let scope = Scope::new(chart.spec.primary, key);
    let view = evaluate(dataset, &state.filters).scoped(&scope);

    let breakdown_field = mode.drill_down_field();
    let breakdown = sort_result(
        &aggregate(&view, &AggregationSpec::count(breakdown_field)),
        state.sort,
    );

    let summary = if chart.spec.is_cross_tab() {
        let total = chart.rows.iter().filter(|r| r.key == key).map(|r| r.count).sum();
        AggregatedRow::counted(key, total)
    } else {
        chart
            .find(key)
            .cloned()
            .unwrap_or_else(|| AggregatedRow::counted(key, view.count()))
    };

    DrillDown {
        key: key.to_string(),
        summary,
        breakdown_field,
        breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterSet;
    use crate::models::{FieldValue, Record};

    fn incident(nature: &str, body: &str, loc: &str) -> Record {
        Record::new()
            .with(Field::NatureOfInjury, FieldValue::text(nature))
            .with(Field::PartOfBody, FieldValue::text(body))
            .with(Field::OrganizationLevel1, FieldValue::text(loc))
    }

    fn scenario() -> Dataset {
        Dataset::new(vec![
            incident("Cut", "Hand", "A"),
            incident("Cut", "Hand", "A"),
            incident("Burn", "Arm", "B"),
        ])
    }

    #[test]
    fn test_location_chart() {
        let state = SelectionState::default().with_mode(VisualizationMode::InjuriesByLocation);
        let view = compute_view(&scenario(), &state);

        let Chart::Ready(chart) = &view.chart else {
            panic!("expected a chart");
        };
        assert_eq!(chart.title, "Top Injury by Location");
        assert_eq!(
            chart.rows(),
            &[
                AggregatedRow::with_dominant("A", "Cut", 2),
                AggregatedRow::with_dominant("B", "Burn", 1),
            ]
        );
        assert_eq!(chart.legend, vec!["Cut", "Burn"]);
        assert_eq!(chart.filtered_records, 3);
    }

    #[test]
    fn test_empty_dataset_every_mode() {
        for mode in VisualizationMode::ALL {
            let state = SelectionState::default().with_mode(mode);
            let view = compute_view(&Dataset::empty(), &state);
            match view.chart {
                Chart::Empty(empty) => assert_eq!(empty.mode, mode),
                Chart::Ready(_) => panic!("{} should be empty", mode),
            }
        }
    }

    #[test]
    fn test_drill_down_breakdown() {
        let state = SelectionState::default()
            .with_mode(VisualizationMode::InjuriesByLocation)
            .with_drill_down("A");
        let view = compute_view(&scenario(), &state);

        let detail = view.detail.expect("selection should resolve");
        assert_eq!(detail.summary, AggregatedRow::with_dominant("A", "Cut", 2));
        assert_eq!(detail.breakdown_field, Field::NatureOfInjury);
        assert_eq!(detail.breakdown.rows, vec![AggregatedRow::counted("Cut", 2)]);
    }

    #[test]
    fn test_cross_tab_drill_down_summary() {
        let state = SelectionState::default()
            .with_mode(VisualizationMode::NatureToBodyPart)
            .with_drill_down("Cut");
        let view = compute_view(&scenario(), &state);

        let detail = view.detail.unwrap();
        assert_eq!(detail.summary, AggregatedRow::counted("Cut", 2));
        assert_eq!(detail.breakdown.rows, vec![AggregatedRow::counted("Hand", 2)]);
    }

    #[test]
    fn test_unresolved_drill_down_is_cleared() {
        let state = SelectionState::default()
            .with_filters(FilterSet::new().with_locations(["B"]))
            .with_drill_down("Cut");
        let view = compute_view(&scenario(), &state);

        assert!(view.detail.is_none());
        assert!(view.state.drill_down.is_none());
    }

    #[test]
    fn test_compute_view_is_deterministic() {
        let state = SelectionState::default().with_mode(VisualizationMode::NatureToBodyPart);
        assert_eq!(compute_view(&scenario(), &state), compute_view(&scenario(), &state));
    }
}
