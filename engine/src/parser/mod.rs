//! Parser collaborator boundary.
//!
//! Decoding uploaded files into rows is not the engine's job; it only
//! defines the seam. A parser turns bytes into a JSON array of row objects
//! and may suspend while doing so. [`JsonRowParser`] reads rows that were
//! already exported as JSON, which is what the CLI and the tests use.

use serde_json::Value;
use std::path::Path;

use crate::config::EngineConfig;
use crate::error::{ParseError, ParseResult};

/// Decodes uploaded bytes into rows.
#[allow(async_fn_in_trait)]
pub trait RowParser {
    /// Decode `bytes` into a sequence of row objects.
    ///
    /// The returned value is checked for shape by the normalizer, so a
    /// parser may return whatever its format produced.
    async fn parse(&self, bytes: Vec<u8>) -> ParseResult<Value>;
}

/// Parser for JSON row dumps (`[{"Nature Of Injury": "Cut", ...}, ...]`).
#[derive(Debug, Clone)]
pub struct JsonRowParser {
    max_bytes: usize,
}

impl JsonRowParser {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_bytes: config.max_upload_bytes,
        }
    }

    /// Read a file and return its bytes, enforcing the size limit.
    pub async fn read_file(&self, path: impl AsRef<Path>) -> ParseResult<Vec<u8>> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        self.check_size(bytes.len())?;
        Ok(bytes)
    }

    fn check_size(&self, size: usize) -> ParseResult<()> {
        if size > self.max_bytes {
            return Err(ParseError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

impl Default for JsonRowParser {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl RowParser for JsonRowParser {
    async fn parse(&self, bytes: Vec<u8>) -> ParseResult<Value> {
        self.check_size(bytes.len())?;
        tokio::task::spawn_blocking(move || serde_json::from_slice::<Value>(&bytes))
            .await
            .map_err(|e| ParseError::Task(e.to_string()))?
            .map_err(ParseError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_parse_rows() {
        let parser = JsonRowParser::default();
        let rows = parser
            .parse(br#"[{"Nature Of Injury": "Cut"}, {"Nature Of Injury": "Burn"}]"#.to_vec())
            .await
            .unwrap();
        assert_eq!(rows.as_array().unwrap().len(), 2);
        assert_eq!(rows[1]["Nature Of Injury"], "Burn");
    }

    #[tokio::test]
    async fn test_unreadable_bytes() {
        let parser = JsonRowParser::default();
        let err = parser.parse(b"PK\x03\x04 not json".to_vec()).await.unwrap_err();
        assert!(matches!(err, ParseError::Unreadable(_)));
    }

    #[tokio::test]
    async fn test_size_limit() {
        let config = EngineConfig {
            max_upload_bytes: 4,
            ..EngineConfig::default()
        };
        let parser = JsonRowParser::new(&config);
        let err = parser.parse(b"[{}, {}]".to_vec()).await.unwrap_err();
        assert!(matches!(err, ParseError::TooLarge { size: 8, limit: 4 }));
    }

    #[tokio::test]
    async fn test_read_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();

        let parser = JsonRowParser::default();
        let bytes = parser.read_file(file.path()).await.unwrap();
        assert_eq!(parser.parse(bytes).await.unwrap(), serde_json::json!([]));
    }
}
