//! Configuration types for the ingest stage.
//!
//! [`IngestConfig`] controls how document records coming out of the store are
//! sanitized and which of their fields are mandatory. It is cheap to clone and
//! deserializes from the `ingest:` section of the pipeline YAML.
//!
//! ```rust
//! use ingest::IngestConfig;
//!
//! let config = IngestConfig::default();
//! config.validate().expect("defaults are valid");
//! assert!(config.strip_control_chars);
//! assert!(!config.require_title);
//! ```
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::IngestError;
use crate::types::DocumentType;

/// Runtime configuration for ingest behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IngestConfig {
    /// Bumped whenever sanitization output changes.
    pub version: u32,

    /// Strip control characters from the number, title and content type.
    pub strip_control_chars: bool,

    /// Reject records without a title. Off by default: the normalizer can
    /// build a header from the document number alone.
    pub require_title: bool,

    /// Upper bound on raw markup size. `None` disables the check.
    pub max_markup_bytes: Option<usize>,

    /// Used when a record carries no content type tag. When unset the type is
    /// inferred from the document number.
    pub default_document_type: Option<DocumentType>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            version: 1,
            strip_control_chars: true,
            require_title: false,
            max_markup_bytes: Some(32 * 1024 * 1024),
            default_document_type: None,
        }
    }
}

/// Problems detected by [`IngestConfig::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("version must be >= 1")]
    InvalidVersion,
    #[error("max_markup_bytes must be greater than zero when set")]
    ZeroMarkupLimit,
}

impl From<ConfigError> for IngestError {
    fn from(value: ConfigError) -> Self {
        IngestError::InvalidConfig(value.to_string())
    }
}

impl IngestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 {
            return Err(ConfigError::InvalidVersion);
        }
        if self.max_markup_bytes == Some(0) {
            return Err(ConfigError::ZeroMarkupLimit);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_rejected() {
        let cfg = IngestConfig {
            max_markup_bytes: Some(0),
            ..Default::default()
        };
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroMarkupLimit));
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = IngestConfig {
            default_document_type: Some(DocumentType::AgencyRegulation),
            ..Default::default()
        };
        let json = serde_json::to_string(&cfg).expect("serialize");
        assert!(json.contains("AGENCY_REGULATION"));
        let back: IngestConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, cfg);
    }
}
