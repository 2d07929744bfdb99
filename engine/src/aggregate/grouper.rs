//! Group filtered records into [`AggregatedRow`]s.
//!
//! One aggregator serves every chart: simple counts, the dominant
//! sub-category per group, and the two-dimensional cross-tabulation.
//!
//! # Ordering
//!
//! Groups come out in the order their key is first seen in the filtered
//! view. Counting goes through [`Tally`], which keeps insertion order, so
//! the dominant value of a tie is always the one encountered first.
//!
//! ```text
//! Filtered records                 Dominant nature by location
//! ┌─────────────────────────┐      ┌──────────────────────┐
//! │ loc: A, nature: Cut     │      │ A  Cut   2           │
//! │ loc: A, nature: Cut     │  →   │ B  Burn  1           │
//! │ loc: B, nature: Burn    │      └──────────────────────┘
//! └─────────────────────────┘
//! ```

use std::collections::HashMap;
use std::hash::Hash;

use super::spec::{AggregatedRow, Aggregation, AggregationResult, AggregationSpec};
use crate::filter::FilteredView;
use crate::models::{Field, UNKNOWN_LABEL};

/// Run `spec` over `view`.
pub fn aggregate(view: &FilteredView<'_>, spec: &AggregationSpec) -> AggregationResult {
    match spec.aggregation {
        Aggregation::Count => count_by(view, *spec),
        Aggregation::DominantSubCategory { secondary } => dominant_by(view, *spec, secondary),
        Aggregation::CrossTab { secondary } => cross_tab(view, *spec, secondary),
    }
}

fn count_by(view: &FilteredView<'_>, spec: AggregationSpec) -> AggregationResult {
    let mut groups: Tally = Tally::default();
    let mut unknown_primary = 0;

    for record in view.iter() {
        match record.label(spec.primary) {
            Some(key) => groups.add(key.into_owned()),
            None => unknown_primary += 1,
        }
    }

    let rows: Vec<AggregatedRow> = groups
        .into_entries()
        .into_iter()
        .map(|(key, count)| AggregatedRow::counted(key, count))
        .collect();

    AggregationResult {
        primary_axis: rows.iter().map(|r| r.key.clone()).collect(),
        rows,
        unknown_primary,
        ..AggregationResult::empty(spec)
    }
}

fn dominant_by(view: &FilteredView<'_>, spec: AggregationSpec, secondary: Field) -> AggregationResult {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<GroupBuilder> = Vec::new();
    let mut unknown_primary = 0;

    for record in view.iter() {
        let Some(key) = record.label(spec.primary) else {
            unknown_primary += 1;
            continue;
        };
        let slot = match index.get(&*key) {
            Some(&i) => i,
            None => {
                index.insert(key.clone().into_owned(), groups.len());
                groups.push(GroupBuilder::new(key.into_owned()));
                groups.len() - 1
            }
        };
        groups[slot].add(record.label(secondary).map(|l| l.into_owned()));
    }

    let rows: Vec<AggregatedRow> = groups.into_iter().filter_map(GroupBuilder::build).collect();

    AggregationResult {
        primary_axis: rows.iter().map(|r| r.key.clone()).collect(),
        rows,
        unknown_primary,
        ..AggregationResult::empty(spec)
    }
}

fn cross_tab(view: &FilteredView<'_>, spec: AggregationSpec, secondary: Field) -> AggregationResult {
    let mut cells: HashMap<(String, String), usize> = HashMap::new();
    let mut rows: Vec<AggregatedRow> = Vec::new();
    let mut primary_axis: Tally = Tally::default();
    let mut secondary_axis: Tally = Tally::default();
    let mut unknown_primary = 0;
    let mut unknown_secondary = 0;

    for record in view.iter() {
        let a = record.label(spec.primary);
        let b = record.label(secondary);

        // Axes are enumerated independently of co-occurrence.
        if let Some(a) = &a {
            primary_axis.add(a.to_string());
        }
        if let Some(b) = &b {
            secondary_axis.add(b.to_string());
        }

        match (a, b) {
            (Some(a), Some(b)) => {
                let cell_key = (a.into_owned(), b.into_owned());
                match cells.get(&cell_key) {
                    Some(&i) => rows[i].count += 1,
                    None => {
                        rows.push(AggregatedRow::cell(cell_key.0.clone(), cell_key.1.clone(), 1));
                        cells.insert(cell_key, rows.len() - 1);
                    }
                }
            }
            (None, _) => unknown_primary += 1,
            (Some(_), None) => unknown_secondary += 1,
        }
    }

    AggregationResult {
        rows,
        primary_axis: primary_axis.into_keys(),
        secondary_axis: secondary_axis.into_keys(),
        unknown_primary,
        unknown_secondary,
        ..AggregationResult::empty(spec)
    }
}

/// Insertion-ordered counter.
#[derive(Debug, Default)]
struct Tally<K = String> {
    index: HashMap<K, usize>,
    entries: Vec<(K, usize)>,
}

impl<K: Eq + Hash + Clone> Tally<K> {
    fn add(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&i) => self.entries[i].1 += 1,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, 1));
            }
        }
    }

    /// Highest count; ties go to the earliest entry.
    fn argmax(&self) -> Option<&(K, usize)> {
        self.entries
            .iter()
            .fold(None, |best: Option<&(K, usize)>, entry| match best {
                Some(b) if b.1 >= entry.1 => Some(b),
                _ => Some(entry),
            })
    }

    fn into_entries(self) -> Vec<(K, usize)> {
        self.entries
    }

    fn into_keys(self) -> Vec<K> {
        self.entries.into_iter().map(|(k, _)| k).collect()
    }
}

/// Accumulates the secondary values of one group.
///
/// Missing values are tallied as `None`, apart from any text that happens
/// to read "Unknown"; they only take [`UNKNOWN_LABEL`] when the row is built.
struct GroupBuilder {
    key: String,
    secondary: Tally<Option<String>>,
}

impl GroupBuilder {
    fn new(key: String) -> Self {
        Self { key, secondary: Tally::default() }
    }

    fn add(&mut self, secondary: Option<String>) {
        self.secondary.add(secondary);
    }

    /// `None` only for a group that never received a record, which the
    /// aggregator does not create.
    fn build(self) -> Option<AggregatedRow> {
        let (label, count) = self.secondary.argmax()?.clone();
        let label = label.unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        Some(AggregatedRow::with_dominant(self.key, label, count))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{evaluate, FilterSet};
    use crate::models::{Dataset, FieldValue, Record};
    use std::collections::HashSet;

    fn incident(nature: Option<&str>, body: Option<&str>, loc: Option<&str>) -> Record {
        let v = |s: Option<&str>| s.map(FieldValue::text).unwrap_or(FieldValue::Unknown);
        Record::new()
            .with(Field::NatureOfInjury, v(nature))
            .with(Field::PartOfBody, v(body))
            .with(Field::OrganizationLevel1, v(loc))
    }

    fn scenario() -> Dataset {
        Dataset::new(vec![
            incident(Some("Cut"), Some("Hand"), Some("A")),
            incident(Some("Cut"), Some("Hand"), Some("A")),
            incident(Some("Burn"), Some("Arm"), Some("B")),
        ])
    }

    fn run(data: &Dataset, spec: AggregationSpec) -> AggregationResult {
        let filters = FilterSet::new();
        aggregate(&evaluate(data, &filters), &spec)
    }

    #[test]
    fn test_dominant_by_location() {
        let result = run(
            &scenario(),
            AggregationSpec::dominant(Field::OrganizationLevel1, Field::NatureOfInjury),
        );
        assert_eq!(
            result.rows,
            vec![
                AggregatedRow::with_dominant("A", "Cut", 2),
                AggregatedRow::with_dominant("B", "Burn", 1),
            ]
        );
        assert_eq!(result.legend(), vec!["Cut", "Burn"]);
    }

    #[test]
    fn test_dominant_tie_goes_to_first_seen() {
        let data = Dataset::new(vec![
            incident(Some("Strain"), None, Some("A")),
            incident(Some("Cut"), None, Some("A")),
            incident(Some("Cut"), None, Some("A")),
            incident(Some("Strain"), None, Some("A")),
        ]);
        let result = run(&data, AggregationSpec::dominant(Field::OrganizationLevel1, Field::NatureOfInjury));
        assert_eq!(result.rows, vec![AggregatedRow::with_dominant("A", "Strain", 2)]);
    }

    #[test]
    fn test_dominant_unknown_secondary_competes() {
        let data = Dataset::new(vec![
            incident(None, None, Some("A")),
            incident(None, None, Some("A")),
            incident(Some("Cut"), None, Some("A")),
        ]);
        let result = run(&data, AggregationSpec::dominant(Field::OrganizationLevel1, Field::NatureOfInjury));
        assert_eq!(result.rows, vec![AggregatedRow::with_dominant("A", UNKNOWN_LABEL, 2)]);
    }

    #[test]
    fn test_dominant_missing_value_is_not_unknown_text() {
        let data = Dataset::new(vec![
            incident(Some("Unknown"), None, Some("A")),
            incident(None, None, Some("A")),
            incident(Some("Cut"), None, Some("A")),
            incident(Some("Cut"), None, Some("A")),
        ]);
        let result = run(&data, AggregationSpec::dominant(Field::OrganizationLevel1, Field::NatureOfInjury));
        assert_eq!(result.rows, vec![AggregatedRow::with_dominant("A", "Cut", 2)]);
    }

    #[test]
    fn test_count_first_seen_order() {
        let data = Dataset::new(vec![
            incident(Some("Burn"), None, None),
            incident(Some("Cut"), None, None),
            incident(Some("Burn"), None, None),
        ]);
        let result = run(&data, AggregationSpec::count(Field::NatureOfInjury));
        assert_eq!(
            result.rows,
            vec![AggregatedRow::counted("Burn", 2), AggregatedRow::counted("Cut", 1)]
        );
        assert_eq!(result.primary_axis, vec!["Burn", "Cut"]);
    }

    #[test]
    fn test_count_sum_matches_known_primary() {
        let data = Dataset::new(vec![
            incident(Some("Burn"), None, None),
            incident(None, None, None),
            incident(Some("Cut"), None, None),
            incident(Some("Cut"), None, None),
        ]);
        let result = run(&data, AggregationSpec::count(Field::NatureOfInjury));
        let known = data.iter().filter(|r| !r.get(Field::NatureOfInjury).is_unknown()).count();
        assert_eq!(result.total(), known);
        assert_eq!(result.unknown_primary, 1);
    }

    #[test]
    fn test_group_keys_unique() {
        let result = run(&scenario(), AggregationSpec::count(Field::PartOfBody));
        let keys: HashSet<_> = result.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys.len(), result.rows.len());
    }

    #[test]
    fn test_cross_tab_sparse_cells() {
        let result = run(&scenario(), AggregationSpec::cross_tab(Field::NatureOfInjury, Field::PartOfBody));
        assert_eq!(
            result.rows,
            vec![AggregatedRow::cell("Cut", "Hand", 2), AggregatedRow::cell("Burn", "Arm", 1)]
        );
        assert_eq!(result.cell("Cut", "Arm"), 0);
        assert_eq!(result.cell("Cut", "Hand"), 2);
    }

    #[test]
    fn test_cross_tab_axes_match_filtered_view() {
        let data = Dataset::new(vec![
            incident(Some("Cut"), Some("Hand"), None),
            incident(Some("Burn"), None, None),
            incident(None, Some("Leg"), None),
            incident(Some("Cut"), Some("Arm"), None),
        ]);
        let result = run(&data, AggregationSpec::cross_tab(Field::NatureOfInjury, Field::PartOfBody));

        assert_eq!(result.primary_axis, vec!["Cut", "Burn"]);
        assert_eq!(result.secondary_axis, vec!["Hand", "Leg", "Arm"]);
        assert_eq!(result.unknown_primary, 1);
        assert_eq!(result.unknown_secondary, 1);
        assert_eq!(result.total(), 2);
    }

    #[test]
    fn test_filtered_out_groups_not_emitted() {
        let data = scenario();
        let filters = FilterSet::new().with_locations(["B"]);
        let spec = AggregationSpec::count(Field::OrganizationLevel1);
        let result = aggregate(&evaluate(&data, &filters), &spec);
        assert_eq!(result.rows, vec![AggregatedRow::counted("B", 1)]);
        assert!(result.find("A").is_none());
    }

    #[test]
    fn test_empty_view_yields_empty_result() {
        let data = Dataset::empty();
        for spec in [
            AggregationSpec::count(Field::NatureOfInjury),
            AggregationSpec::dominant(Field::PartOfBody, Field::NatureOfInjury),
            AggregationSpec::cross_tab(Field::NatureOfInjury, Field::PartOfBody),
        ] {
            let result = run(&data, spec);
            assert!(result.is_empty());
            assert!(result.primary_axis.is_empty());
        }
    }
}
