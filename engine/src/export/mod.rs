//! Table export of aggregated rows.
//!
//! The detail table reads the same [`AggregationResult`] as the chart; this
//! module renders it as CSV for download.

use csv::Writer;

use crate::aggregate::{Aggregation, AggregationResult};
use crate::error::ExportResult;

/// Header row for a result, by aggregation kind.
pub fn headers(result: &AggregationResult) -> Vec<String> {
    let primary = result.spec.primary.display_name().to_string();
    match result.spec.aggregation {
        Aggregation::Count => vec![primary, "Count".into()],
        Aggregation::DominantSubCategory { secondary } => {
            vec![primary, format!("Top {}", secondary.display_name()), "Count".into()]
        }
        Aggregation::CrossTab { secondary } => {
            vec![primary, secondary.display_name().to_string(), "Count".into()]
        }
    }
}

/// Render the rows of `result` as CSV, in their current order.
pub fn rows_to_csv(result: &AggregationResult) -> ExportResult<String> {
    let mut writer = Writer::from_writer(Vec::new());
    writer.write_record(headers(result))?;

    for row in &result.rows {
        let count = row.count.to_string();
        match result.spec.aggregation {
            Aggregation::Count => writer.write_record([row.key.as_str(), count.as_str()])?,
            Aggregation::DominantSubCategory { .. } => {
                writer.write_record([row.key.as_str(), row.dominant.as_deref().unwrap_or(""), count.as_str()])?
            }
            Aggregation::CrossTab { .. } => {
                writer.write_record([row.key.as_str(), row.column.as_deref().unwrap_or(""), count.as_str()])?
            }
        }
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{AggregatedRow, AggregationSpec};
    use crate::models::Field;

    #[test]
    fn test_count_export() {
        let result = AggregationResult {
            rows: vec![AggregatedRow::counted("Cut", 2), AggregatedRow::counted("Burn", 1)],
            ..AggregationResult::empty(AggregationSpec::count(Field::NatureOfInjury))
        };
        let csv = rows_to_csv(&result).unwrap();
        assert_eq!(csv, "Nature of Injury,Count\nCut,2\nBurn,1\n");
    }

    #[test]
    fn test_dominant_export() {
        let result = AggregationResult {
            rows: vec![AggregatedRow::with_dominant("Plant, North", "Cut", 2)],
            ..AggregationResult::empty(AggregationSpec::dominant(Field::OrganizationLevel1, Field::NatureOfInjury))
        };
        let csv = rows_to_csv(&result).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Location,Top Nature of Injury,Count"));
        // comma in a label is quoted
        assert_eq!(lines.next(), Some("\"Plant, North\",Cut,2"));
    }

    #[test]
    fn test_cross_tab_export() {
        let result = AggregationResult {
            rows: vec![AggregatedRow::cell("Cut", "Hand", 2)],
            ..AggregationResult::empty(AggregationSpec::cross_tab(Field::NatureOfInjury, Field::PartOfBody))
        };
        let csv = rows_to_csv(&result).unwrap();
        assert_eq!(csv, "Nature of Injury,Part of Body,Count\nCut,Hand,2\n");
    }

    #[test]
    fn test_empty_result_has_header_only() {
        let result = AggregationResult::empty(AggregationSpec::count(Field::PartOfBody));
        assert_eq!(rows_to_csv(&result).unwrap(), "Part of Body,Count\n");
    }
}
