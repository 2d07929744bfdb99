//! Domain models for the injury aggregation engine.
//!
//! - [`Field`] - Logical fields the engine reads from an incident row
//! - [`FieldValue`] - A canonical cell value (text, number, date or unknown)
//! - [`Record`] - One normalized incident report
//! - [`Dataset`] - An immutable, ordered collection of records

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Label used wherever an unknown value has to be displayed as a category.
pub const UNKNOWN_LABEL: &str = "Unknown";

// =============================================================================
// Fields
// =============================================================================

/// Logical field of an incident record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    /// Nature of the injury (cut, burn, strain...).
    NatureOfInjury,
    /// Injured part of the body.
    PartOfBody,
    /// Store or location (organization coding level 1).
    OrganizationLevel1,
    /// Date the loss occurred.
    DateOfLoss,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::NatureOfInjury,
        Field::PartOfBody,
        Field::OrganizationLevel1,
        Field::DateOfLoss,
    ];

    /// Logical (camelCase) name.
    pub fn name(&self) -> &'static str {
        match self {
            Field::NatureOfInjury => "natureOfInjury",
            Field::PartOfBody => "partOfBody",
            Field::OrganizationLevel1 => "organizationLevel1",
            Field::DateOfLoss => "dateOfLoss",
        }
    }

    /// Human-readable name, used for axis labels.
    pub fn display_name(&self) -> &'static str {
        match self {
            Field::NatureOfInjury => "Nature of Injury",
            Field::PartOfBody => "Part of Body",
            Field::OrganizationLevel1 => "Location",
            Field::DateOfLoss => "Date of Loss",
        }
    }

    fn index(&self) -> usize {
        match self {
            Field::NatureOfInjury => 0,
            Field::PartOfBody => 1,
            Field::OrganizationLevel1 => 2,
            Field::DateOfLoss => 3,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Values
// =============================================================================

/// A canonical cell value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
    /// Missing, null, empty, or (for dates) unparseable.
    #[default]
    Unknown,
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, FieldValue::Unknown)
    }

    /// Category label of a known value.
    ///
    /// Text is returned untouched; integral numbers print without a
    /// fractional part so that `101` and `"101"` share a label.
    pub fn label(&self) -> Option<Cow<'_, str>> {
        match self {
            FieldValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
            FieldValue::Number(n) => Some(Cow::Owned(format_number(*n))),
            FieldValue::Date(d) => Some(Cow::Owned(d.format("%Y-%m-%d").to_string())),
            FieldValue::Unknown => None,
        }
    }

    /// Label, falling back to [`UNKNOWN_LABEL`].
    pub fn label_or_unknown(&self) -> Cow<'_, str> {
        self.label().unwrap_or(Cow::Borrowed(UNKNOWN_LABEL))
    }

    /// Calendar year of a date value.
    pub fn year(&self) -> Option<i32> {
        match self {
            FieldValue::Date(d) => Some(d.year()),
            _ => None,
        }
    }
}

fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// =============================================================================
// Records
// =============================================================================

/// One normalized incident report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Record {
    values: [FieldValue; 4],
}

impl Record {
    /// A record with every field unknown.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this record with `field` set.
    pub fn with(mut self, field: Field, value: FieldValue) -> Self {
        self.values[field.index()] = value;
        self
    }

    pub fn get(&self, field: Field) -> &FieldValue {
        &self.values[field.index()]
    }

    /// Label of `field`, `None` when unknown.
    pub fn label(&self, field: Field) -> Option<Cow<'_, str>> {
        self.get(field).label()
    }

    /// Year of the date of loss, `None` when the date is unknown.
    pub fn year_of_loss(&self) -> Option<i32> {
        self.get(Field::DateOfLoss).year()
    }
}

// =============================================================================
// Dataset
// =============================================================================

/// Ordered, immutable collection of records.
///
/// A new upload replaces the whole dataset; there is no in-place mutation.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Dataset {
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }
}

impl FromIterator<Record> for Dataset {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_label_drops_integral_fraction() {
        assert_eq!(FieldValue::Number(101.0).label().unwrap(), "101");
        assert_eq!(FieldValue::Number(2.5).label().unwrap(), "2.5");
    }

    #[test]
    fn test_text_label_is_untouched() {
        let v = FieldValue::text("  Hand ");
        assert_eq!(v.label().unwrap(), "  Hand ");
    }

    #[test]
    fn test_unknown_has_no_label() {
        assert!(FieldValue::Unknown.label().is_none());
        assert_eq!(FieldValue::Unknown.label_or_unknown(), UNKNOWN_LABEL);
    }

    #[test]
    fn test_record_get_and_year() {
        let date = NaiveDate::from_ymd_opt(2023, 4, 5).unwrap();
        let record = Record::new()
            .with(Field::NatureOfInjury, FieldValue::text("Cut"))
            .with(Field::DateOfLoss, FieldValue::Date(date));

        assert_eq!(record.label(Field::NatureOfInjury).unwrap(), "Cut");
        assert!(record.get(Field::PartOfBody).is_unknown());
        assert_eq!(record.year_of_loss(), Some(2023));
    }

    #[test]
    fn test_field_serializes_camel_case() {
        let json = serde_json::to_value(Field::OrganizationLevel1).unwrap();
        assert_eq!(json, "organizationLevel1");
    }
}
