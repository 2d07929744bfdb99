//! Coerce parsed rows into canonical [`Record`]s.
//!
//! The parser collaborator hands over rows as JSON objects whose values may
//! be strings, numbers, or spreadsheet serial dates. Normalization never
//! fails on a single bad cell: the cell becomes [`FieldValue::Unknown`] and
//! is counted in the [`NormalizeReport`]. Only input that is not a sequence
//! of mappings is rejected.
//!
//! # Serial dates
//!
//! Spreadsheet dates are day counts; serial 25569 is 1970-01-01. The
//! conversion is `epoch + (serial - 25569) * 86400 s` in UTC, with no
//! leap-second or timezone handling.
//!
//! Date cells given as text are also accepted when they hold a serial, an
//! ISO `YYYY-MM-DD` date or an RFC 3339 timestamp. Such rows carry a year and
//! are therefore selected by year filters; any other text is unknown.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::config::ColumnMapping;
use crate::error::MalformedDatasetError;
use crate::logs::{log_info, log_success, log_warning_indent};
use crate::models::{Dataset, Field, FieldValue, Record};

/// Serial number of 1970-01-01.
pub const UNIX_EPOCH_SERIAL: f64 = 25569.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Per-record defects found while normalizing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeReport {
    /// Rows received
    pub total_rows: usize,
    /// Absent, null or empty cells per field
    pub missing: HashMap<Field, usize>,
    /// Date cells that were present but not a date
    pub unparseable_dates: usize,
    /// Category cells holding a nested array or object
    pub unreadable_values: usize,
}

impl NormalizeReport {
    pub fn missing(&self, field: Field) -> usize {
        self.missing.get(&field).copied().unwrap_or(0)
    }

    /// Rows whose date of loss is unknown, for any reason.
    pub fn unknown_dates(&self) -> usize {
        self.missing(Field::DateOfLoss) + self.unparseable_dates
    }

    pub fn has_defects(&self) -> bool {
        self.missing.values().any(|&n| n > 0) || self.unparseable_dates > 0 || self.unreadable_values > 0
    }

    /// Write the report to the log stream.
    pub fn log(&self) {
        log_success(format!("Normalized {} rows", self.total_rows));
        if !self.has_defects() {
            return;
        }
        for field in Field::ALL {
            let n = self.missing(field);
            if n > 0 {
                log_warning_indent(format!("{} rows without {}", n, field.display_name()), 1);
            }
        }
        if self.unparseable_dates > 0 {
            log_warning_indent(format!("{} unparseable dates", self.unparseable_dates), 1);
        }
        if self.unreadable_values > 0 {
            log_warning_indent(format!("{} nested values ignored", self.unreadable_values), 1);
        }
    }
}

/// Normalized dataset together with its defect report.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub dataset: Dataset,
    pub report: NormalizeReport,
}

/// Normalize parsed rows.
///
/// # Errors
/// [`MalformedDatasetError`] when `rows` is not an array, or an element of it
/// is not an object.
pub fn normalize(rows: &Value, columns: &ColumnMapping) -> Result<Normalized, MalformedDatasetError> {
    let rows = rows.as_array().ok_or(MalformedDatasetError::NotASequence {
        found: json_kind(rows),
    })?;

    log_info(format!("Normalizing {} rows...", rows.len()));

    let mut report = NormalizeReport {
        total_rows: rows.len(),
        ..NormalizeReport::default()
    };
    let mut records = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        let obj = row.as_object().ok_or(MalformedDatasetError::RowNotAMapping {
            index,
            found: json_kind(row),
        })?;
        records.push(normalize_row(obj, columns, &mut report));
    }

    Ok(Normalized {
        dataset: Dataset::new(records),
        report,
    })
}

fn normalize_row(row: &Map<String, Value>, columns: &ColumnMapping, report: &mut NormalizeReport) -> Record {
    let mut record = Record::new();

    for field in Field::ALL {
        let raw = columns
            .aliases(field)
            .iter()
            .find_map(|alias| row.get(alias).filter(|v| !v.is_null()));

        let value = match raw {
            None => FieldValue::Unknown,
            Some(raw) if field == Field::DateOfLoss => date_value(raw, report),
            Some(raw) => category_value(raw, report),
        };

        // Present but unusable cells are counted by the value converters.
        let present = raw.is_some_and(|v| !is_blank(v));
        if value.is_unknown() && !present {
            *report.missing.entry(field).or_insert(0) += 1;
        }

        record = record.with(field, value);
    }

    record
}

/// Category cell to value. Strings pass through verbatim, whitespace
/// included, except the empty string, which is treated as a missing cell.
fn category_value(raw: &Value, report: &mut NormalizeReport) -> FieldValue {
    match raw {
        Value::String(s) if s.is_empty() => FieldValue::Unknown,
        Value::String(s) => FieldValue::Text(s.clone()),
        Value::Number(n) => n.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Unknown),
        Value::Bool(b) => FieldValue::Text(b.to_string()),
        Value::Array(_) | Value::Object(_) => {
            report.unreadable_values += 1;
            FieldValue::Unknown
        }
        Value::Null => FieldValue::Unknown,
    }
}

fn date_value(raw: &Value, report: &mut NormalizeReport) -> FieldValue {
    if is_blank(raw) {
        return FieldValue::Unknown;
    }

    let date = match raw {
        Value::Number(n) => n.as_f64().and_then(serial_to_date),
        Value::String(s) => parse_date_str(s),
        _ => None,
    };

    match date {
        Some(d) => FieldValue::Date(d),
        None => {
            report.unparseable_dates += 1;
            FieldValue::Unknown
        }
    }
}

fn is_blank(raw: &Value) -> bool {
    match raw {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Convert a spreadsheet serial day number to a calendar date (UTC).
pub fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() {
        return None;
    }
    let millis = ((serial - UNIX_EPOCH_SERIAL) * MILLIS_PER_DAY).round();
    if millis < i64::MIN as f64 || millis > i64::MAX as f64 {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(millis as i64).map(|dt| dt.date_naive())
}

/// Parse a date cell delivered as text: a numeric serial, an ISO date, or an
/// RFC 3339 timestamp.
fn parse_date_str(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(serial) = s.parse::<f64>() {
        return serial_to_date(serial);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
