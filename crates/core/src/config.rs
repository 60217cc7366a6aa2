//! Transfer configuration.

use crate::columns::ColumnRules;
use crate::duplicates::IdentityKey;
use crate::error::{TransferError, TransferResult};
use crate::headers::REQUIRED_HEADERS;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Rows written per append call.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// Settings shared by every transfer run through one service.
///
/// Every field has a default, so a YAML file only needs the keys it changes:
///
/// ```yaml
/// chunk_size: 250
/// identity_key: order_and_tracking
/// columns:
///   date: ["booked", "on"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub chunk_size: usize,
    pub identity_key: IdentityKey,
    pub required_headers: Vec<String>,
    pub columns: ColumnRules,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            identity_key: IdentityKey::default(),
            required_headers: REQUIRED_HEADERS.iter().map(|h| (*h).to_string()).collect(),
            columns: ColumnRules::default(),
        }
    }
}

impl TransferConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml_str(content: &str) -> TransferResult<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> TransferResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn validate(&self) -> TransferResult<()> {
        if self.chunk_size == 0 {
            return Err(TransferError::Config(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.required_headers.iter().all(|h| h.trim().is_empty()) {
            return Err(TransferError::Config(
                "required_headers must name at least one header".to_string(),
            ));
        }
        if self.columns.date.is_empty() || self.columns.order_id.is_empty() {
            return Err(TransferError::Config(
                "columns.date and columns.order_id need at least one match term".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TransferConfig::default();
        assert_eq!(config.chunk_size, 100);
        assert_eq!(config.identity_key, IdentityKey::OrderId);
        assert_eq!(config.required_headers.len(), 14);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = TransferConfig::from_yaml_str(
            "chunk_size: 250\nidentity_key: order_and_tracking\n",
        )
        .unwrap();
        assert_eq!(config.chunk_size, 250);
        assert_eq!(config.identity_key, IdentityKey::OrderAndTracking);
        assert_eq!(config.required_headers[0], "DATE");
        assert_eq!(config.columns, ColumnRules::default());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let err = TransferConfig::from_yaml_str("chunk_size: 0\n").unwrap_err();
        assert!(matches!(err, TransferError::Config(_)));
    }

    #[test]
    fn test_bad_yaml() {
        let err = TransferConfig::from_yaml_str("chunk_size: [nope\n").unwrap_err();
        assert!(matches!(err, TransferError::Yaml(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheetshift.yaml");
        std::fs::write(&path, "required_headers: [DATE, ORDER ID]\n").unwrap();

        let config = TransferConfig::load(&path).unwrap();
        assert_eq!(config.required_headers, vec!["DATE", "ORDER ID"]);
    }
}
