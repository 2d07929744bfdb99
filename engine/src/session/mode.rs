//! Visualization modes and the aggregations behind them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::aggregate::AggregationSpec;
use crate::models::Field;

/// Which chart is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VisualizationMode {
    /// Injury count per nature of injury.
    #[default]
    #[serde(alias = "overallInjuries")]
    OverallInjuries,
    /// Most frequent injury per location.
    #[serde(alias = "injuriesByLocation")]
    InjuriesByLocation,
    /// Most frequent injury per body part.
    #[serde(alias = "injuriesByBodyPart")]
    InjuriesByBodyPart,
    /// Nature of injury × body part heatmap.
    #[serde(alias = "natureToBodyPart")]
    NatureToBodyPart,
}

/// Axis captions for the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisLabels {
    pub x: String,
    pub y: String,
}

impl VisualizationMode {
    pub const ALL: [VisualizationMode; 4] = [
        VisualizationMode::OverallInjuries,
        VisualizationMode::InjuriesByLocation,
        VisualizationMode::InjuriesByBodyPart,
        VisualizationMode::NatureToBodyPart,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VisualizationMode::OverallInjuries => "overall-injuries",
            VisualizationMode::InjuriesByLocation => "injuries-by-location",
            VisualizationMode::InjuriesByBodyPart => "injuries-by-body-part",
            VisualizationMode::NatureToBodyPart => "nature-to-body-part",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            VisualizationMode::OverallInjuries => "Overall Injuries",
            VisualizationMode::InjuriesByLocation => "Top Injury by Location",
            VisualizationMode::InjuriesByBodyPart => "Top Injury by Body Part",
            VisualizationMode::NatureToBodyPart => "Nature of Injury to Body Part Correlation",
        }
    }

    /// Aggregation that feeds the chart.
    pub fn spec(&self) -> AggregationSpec {
        match self {
            VisualizationMode::OverallInjuries => AggregationSpec::count(Field::NatureOfInjury),
            VisualizationMode::InjuriesByLocation => {
                AggregationSpec::dominant(Field::OrganizationLevel1, Field::NatureOfInjury)
            }
            VisualizationMode::InjuriesByBodyPart => {
                AggregationSpec::dominant(Field::PartOfBody, Field::NatureOfInjury)
            }
            VisualizationMode::NatureToBodyPart => {
                AggregationSpec::cross_tab(Field::NatureOfInjury, Field::PartOfBody)
            }
        }
    }

    /// Dimension a selected group is broken down by in the detail panel.
    pub fn drill_down_field(&self) -> Field {
        match self {
            VisualizationMode::OverallInjuries => Field::PartOfBody,
            VisualizationMode::InjuriesByLocation => Field::NatureOfInjury,
            VisualizationMode::InjuriesByBodyPart => Field::OrganizationLevel1,
            VisualizationMode::NatureToBodyPart => Field::PartOfBody,
        }
    }

    pub fn axis_labels(&self) -> AxisLabels {
        let spec = self.spec();
        let y = if spec.is_cross_tab() {
            spec.secondary().map(|f| f.display_name()).unwrap_or("Count")
        } else {
            "Count"
        };
        AxisLabels {
            x: spec.primary.display_name().to_string(),
            y: y.to_string(),
        }
    }
}

impl fmt::Display for VisualizationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VisualizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.replace(['-', '_'], "").to_lowercase();
        VisualizationMode::ALL
            .into_iter()
            .find(|m| m.as_str().replace('-', "") == wanted)
            .ok_or_else(|| {
                let names: Vec<_> = VisualizationMode::ALL.iter().map(|m| m.as_str()).collect();
                format!("unknown visualization '{}' (expected one of: {})", s, names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::Aggregation;

    #[test]
    fn test_parse_kebab_and_camel() {
        assert_eq!(
            "injuries-by-location".parse::<VisualizationMode>().unwrap(),
            VisualizationMode::InjuriesByLocation
        );
        assert_eq!(
            "natureToBodyPart".parse::<VisualizationMode>().unwrap(),
            VisualizationMode::NatureToBodyPart
        );
        assert!("pie".parse::<VisualizationMode>().is_err());
    }

    #[test]
    fn test_serde_alias() {
        let mode: VisualizationMode = serde_json::from_str("\"injuriesByBodyPart\"").unwrap();
        assert_eq!(mode, VisualizationMode::InjuriesByBodyPart);
        assert_eq!(serde_json::to_value(mode).unwrap(), "injuries-by-body-part");
    }

    #[test]
    fn test_specs() {
        assert_eq!(VisualizationMode::OverallInjuries.spec().aggregation, Aggregation::Count);
        assert_eq!(
            VisualizationMode::InjuriesByLocation.spec().primary,
            Field::OrganizationLevel1
        );
        assert!(VisualizationMode::NatureToBodyPart.spec().is_cross_tab());
    }

    #[test]
    fn test_axis_labels() {
        let axis = VisualizationMode::NatureToBodyPart.axis_labels();
        assert_eq!(axis.x, "Nature of Injury");
        assert_eq!(axis.y, "Part of Body");
        assert_eq!(VisualizationMode::InjuriesByBodyPart.axis_labels().y, "Count");
    }
}
