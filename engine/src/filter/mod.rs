//! Filter evaluation over a [`Dataset`].
//!
//! A [`FilterSet`] restricts records by location and by year of loss. The
//! restrictions are conjunctive. Evaluation is lazy and restartable: a
//! [`FilteredView`] borrows the dataset and can be iterated any number of
//! times, always yielding passing records in dataset order.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

use crate::models::{Dataset, Field, Record};

/// Location entry that lifts the location restriction.
pub const ALL_LOCATIONS: &str = "all";

/// Active filters.
///
/// An empty location set, or one containing [`ALL_LOCATIONS`], does not
/// restrict. An empty year set does not restrict.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterSet {
    pub locations: BTreeSet<String>,
    pub years: BTreeSet<i32>,
}

impl FilterSet {
    /// No restriction at all.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locations<I, S>(mut self, locations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.locations = locations.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_years<I: IntoIterator<Item = i32>>(mut self, years: I) -> Self {
        self.years = years.into_iter().collect();
        self
    }

    pub fn restricts_locations(&self) -> bool {
        !self.locations.is_empty() && !self.locations.contains(ALL_LOCATIONS)
    }

    pub fn restricts_years(&self) -> bool {
        !self.years.is_empty()
    }

    pub fn is_unrestricted(&self) -> bool {
        !self.restricts_locations() && !self.restricts_years()
    }

    /// Whether `record` passes every active filter.
    pub fn matches(&self, record: &Record) -> bool {
        self.matches_location(record) && self.matches_year(record)
    }

    fn matches_location(&self, record: &Record) -> bool {
        if !self.restricts_locations() {
            return true;
        }
        record
            .label(Field::OrganizationLevel1)
            .is_some_and(|loc| self.locations.contains(loc.as_ref()))
    }

    fn matches_year(&self, record: &Record) -> bool {
        if !self.restricts_years() {
            return true;
        }
        // Undated records fail any year restriction.
        record.year_of_loss().is_some_and(|y| self.years.contains(&y))
    }
}

/// Restrict a view to records whose `field` has label `key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub field: Field,
    pub key: String,
}

impl Scope {
    pub fn new(field: Field, key: impl Into<String>) -> Self {
        Self { field, key: key.into() }
    }

    pub fn matches(&self, record: &Record) -> bool {
        record.label(self.field).is_some_and(|l| l == self.key.as_str())
    }
}

/// Lazily filtered, restartable view of a dataset.
#[derive(Debug, Clone, Copy)]
pub struct FilteredView<'a> {
    dataset: &'a Dataset,
    filters: &'a FilterSet,
    scope: Option<&'a Scope>,
}

impl<'a> FilteredView<'a> {
    /// Additionally constrain the view to `scope`.
    pub fn scoped(mut self, scope: &'a Scope) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Iterate passing records in dataset order. Can be called repeatedly.
    pub fn iter(&self) -> impl Iterator<Item = &'a Record> + Clone + 'a {
        let filters = self.filters;
        let scope = self.scope;
        self.dataset
            .iter()
            .filter(move |r| filters.matches(r) && scope.map_or(true, |s| s.matches(r)))
    }

    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    pub fn filters(&self) -> &'a FilterSet {
        self.filters
    }
}

/// Apply `filters` to `dataset`.
pub fn evaluate<'a>(dataset: &'a Dataset, filters: &'a FilterSet) -> FilteredView<'a> {
    FilteredView { dataset, filters, scope: None }
}

/// Values a user can pick from in the filter controls.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    /// Distinct locations, first-seen order
    pub locations: Vec<String>,
    /// Distinct years of loss, ascending
    pub years: Vec<i32>,
    /// Records that no year filter can select
    pub undated: usize,
}

/// Collect the selectable locations and years of the whole dataset.
pub fn filter_options(dataset: &Dataset) -> FilterOptions {
    let mut seen = HashSet::new();
    let mut locations = Vec::new();
    let mut years = BTreeSet::new();
    let mut undated = 0;

    for record in dataset.iter() {
        if let Some(loc) = record.label(Field::OrganizationLevel1) {
            if seen.insert(loc.clone().into_owned()) {
                locations.push(loc.into_owned());
            }
        }
        match record.year_of_loss() {
            Some(y) => {
                years.insert(y);
            }
            None => undated += 1,
        }
    }

    FilterOptions {
        locations,
        years: years.into_iter().collect(),
        undated,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FieldValue;
    use chrono::NaiveDate;

    fn incident(nature: &str, loc: &str, year: Option<i32>) -> Record {
        let date = year
            .map(|y| FieldValue::Date(NaiveDate::from_ymd_opt(y, 6, 1).unwrap()))
            .unwrap_or(FieldValue::Unknown);
        Record::new()
            .with(Field::NatureOfInjury, FieldValue::text(nature))
            .with(Field::OrganizationLevel1, FieldValue::text(loc))
            .with(Field::DateOfLoss, date)
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            incident("Cut", "A", Some(2022)),
            incident("Burn", "B", Some(2023)),
            incident("Strain", "A", None),
            incident("Cut", "C", Some(2023)),
        ])
    }

    fn natures(view: &FilteredView<'_>) -> Vec<String> {
        view.iter()
            .map(|r| r.label(Field::NatureOfInjury).unwrap().into_owned())
            .collect()
    }

    #[test]
    fn test_empty_filter_is_identity() {
        let data = sample();
        let filters = FilterSet::new();
        let view = evaluate(&data, &filters);
        let all: Vec<_> = view.iter().cloned().collect();
        assert_eq!(all, data.records());
    }

    #[test]
    fn test_all_sentinel_lifts_location_filter() {
        let data = sample();
        let filters = FilterSet::new().with_locations(["A", ALL_LOCATIONS]);
        assert!(!filters.restricts_locations());
        assert_eq!(evaluate(&data, &filters).count(), 4);
    }

    #[test]
    fn test_location_filter_preserves_order() {
        let data = sample();
        let filters = FilterSet::new().with_locations(["C", "A"]);
        let view = evaluate(&data, &filters);
        assert_eq!(natures(&view), vec!["Cut", "Strain", "Cut"]);
    }

    #[test]
    fn test_year_filter_excludes_undated() {
        let data = sample();
        let filters = FilterSet::new().with_years([2022, 2023]);
        let view = evaluate(&data, &filters);
        assert_eq!(natures(&view), vec!["Cut", "Burn", "Cut"]);
    }

    #[test]
    fn test_undated_passes_without_year_filter() {
        let data = Dataset::new(vec![incident("Strain", "A", None)]);
        let filters = FilterSet::new().with_locations(["A"]);
        assert_eq!(evaluate(&data, &filters).count(), 1);
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let data = sample();
        let filters = FilterSet::new().with_locations(["A"]).with_years([2023]);
        assert!(evaluate(&data, &filters).is_empty());
    }

    #[test]
    fn test_unknown_location_fails_location_filter() {
        let data = Dataset::new(vec![Record::new()]);
        let filters = FilterSet::new().with_locations(["A"]);
        assert_eq!(evaluate(&data, &filters).count(), 0);
    }

    #[test]
    fn test_view_is_restartable() {
        let data = sample();
        let filters = FilterSet::new().with_years([2023]);
        let view = evaluate(&data, &filters);
        assert_eq!(natures(&view), natures(&view));
        assert_eq!(view.count(), 2);
    }

    #[test]
    fn test_scope() {
        let data = sample();
        let filters = FilterSet::new();
        let scope = Scope::new(Field::OrganizationLevel1, "A");
        let view = evaluate(&data, &filters).scoped(&scope);
        assert_eq!(natures(&view), vec!["Cut", "Strain"]);
    }

    #[test]
    fn test_filter_options() {
        let options = filter_options(&sample());
        assert_eq!(options.locations, vec!["A", "B", "C"]);
        assert_eq!(options.years, vec![2022, 2023]);
        assert_eq!(options.undated, 1);
    }
}
