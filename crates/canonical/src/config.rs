//! Configuration for the canonical parser.
//!
//! ```rust
//! use canonical::ParseConfig;
//!
//! let config = ParseConfig::default();
//! assert_eq!(config.version, 1);
//! assert_eq!(config.max_depth, 16);
//! config.validate().expect("defaults are valid");
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

/// Tunables for [`parse`](crate::parse).
///
/// ```json
/// { "version": 1, "max_depth": 16 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ParseConfig {
    /// Version of the parse rules. It is folded into the canonical hash, so
    /// bump it whenever the JSON produced for the same markup changes.
    pub version: u32,

    /// How many transparent containers or nested lists the parser descends
    /// through before giving up with
    /// [`ParseError::NestingTooDeep`](crate::ParseError::NestingTooDeep).
    ///
    /// Canonical markup is shallow; deep nesting means the input was not
    /// really normalized.
    pub max_depth: usize,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            version: 1,
            max_depth: 16,
        }
    }
}

impl ParseConfig {
    pub fn validate(&self) -> Result<(), ParseError> {
        if self.version == 0 {
            return Err(ParseError::InvalidConfig(
                "config version must be >= 1".into(),
            ));
        }
        if self.max_depth == 0 {
            return Err(ParseError::InvalidConfig(
                "max_depth must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_values_are_rejected() {
        let cfg = ParseConfig {
            version: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ParseError::InvalidConfig(_))));

        let cfg = ParseConfig {
            max_depth: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ParseError::InvalidConfig(_))));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: ParseConfig = serde_json::from_str(r#"{"max_depth": 4}"#).expect("parse");
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.max_depth, 4);
    }
}
