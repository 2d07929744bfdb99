//! Engine configuration.
//!
//! Defaults match the column headers of the incident spreadsheets the
//! dashboard was built for. A JSON file can override any part of it:
//!
//! ```json
//! {
//!   "columns": { "organizationLevel1": ["Store", "Organization Coding Level 1"] },
//!   "maxUploadBytes": 10485760
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{ConfigError, ConfigResult};
use crate::models::Field;

/// Environment variable naming a config file, read by the CLI.
pub const CONFIG_ENV_VAR: &str = "INJURYLENS_CONFIG";

/// Maximum upload size (in bytes).
///
/// 50 MB limit.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Source column aliases for each logical field.
///
/// The first alias present in a row wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnMapping {
    pub nature_of_injury: Vec<String>,
    pub part_of_body: Vec<String>,
    pub organization_level1: Vec<String>,
    pub date_of_loss: Vec<String>,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            nature_of_injury: vec!["Nature Of Injury".into(), "natureOfInjury".into()],
            part_of_body: vec!["Part of Body".into(), "partOfBody".into()],
            organization_level1: vec![
                "Organization Coding Level 1".into(),
                "organizationLevel1".into(),
            ],
            date_of_loss: vec!["Date of Loss".into(), "dateOfLoss".into()],
        }
    }
}

impl ColumnMapping {
    pub fn aliases(&self, field: Field) -> &[String] {
        match field {
            Field::NatureOfInjury => &self.nature_of_injury,
            Field::PartOfBody => &self.part_of_body,
            Field::OrganizationLevel1 => &self.organization_level1,
            Field::DateOfLoss => &self.date_of_loss,
        }
    }
}

/// Configuration for parsing and normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Where each logical field is read from
    pub columns: ColumnMapping,

    /// Uploads larger than this are rejected by the parser
    pub max_upload_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            columns: ColumnMapping::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl EngineConfig {
    /// Load a config from a JSON file; missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the file named by [`CONFIG_ENV_VAR`], or defaults when unset.
    pub fn from_env() -> ConfigResult<Self> {
        match std::env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim()),
            _ => Ok(Self::default()),
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        for field in Field::ALL {
            if self.columns.aliases(field).is_empty() {
                return Err(ConfigError::EmptyAliases(field.name().to_string()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_columns_match_spreadsheet_headers() {
        let config = EngineConfig::default();
        assert_eq!(config.columns.aliases(Field::NatureOfInjury)[0], "Nature Of Injury");
        assert_eq!(
            config.columns.aliases(Field::OrganizationLevel1)[0],
            "Organization Coding Level 1"
        );
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "columns": {{ "organizationLevel1": ["Store"] }} }}"#).unwrap();

        let config = EngineConfig::from_file(file.path()).unwrap();
        assert_eq!(config.columns.organization_level1, vec!["Store"]);
        assert_eq!(config.columns.part_of_body[0], "Part of Body");
        assert_eq!(config.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn test_empty_aliases_rejected() {
        let err = EngineConfig::from_json(r#"{ "columns": { "dateOfLoss": [] } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyAliases(ref f) if f == "dateOfLoss"));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::from_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
