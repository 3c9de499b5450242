//! Configuration for the normalizer and its safety net.
//!
//! ```rust
//! use normalize::NormalizeConfig;
//!
//! let cfg = NormalizeConfig::default();
//! assert_eq!(cfg.min_retained_ratio, 0.2);
//! assert_eq!(cfg.min_measured_chars, 100);
//! cfg.validate().expect("defaults are valid");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tunables for [`normalize`](crate::normalize).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Bumped whenever the canonical output of a rewrite changes.
    pub version: u32,

    /// A rewrite keeping less than this share of the original body text is
    /// replaced by the fallback document.
    pub min_retained_ratio: f64,

    /// Originals at or below this many characters are never measured.
    pub min_measured_chars: usize,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            version: 1,
            min_retained_ratio: 0.2,
            min_measured_chars: 100,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum NormalizeConfigError {
    #[error("normalize config version must be >= 1")]
    InvalidVersion,
    #[error("min_retained_ratio must be within 0.0..=1.0, got {0}")]
    RatioOutOfRange(f64),
}

impl NormalizeConfig {
    pub fn validate(&self) -> Result<(), NormalizeConfigError> {
        if self.version == 0 {
            return Err(NormalizeConfigError::InvalidVersion);
        }
        if !(0.0..=1.0).contains(&self.min_retained_ratio) {
            return Err(NormalizeConfigError::RatioOutOfRange(
                self.min_retained_ratio,
            ));
        }
        Ok(())
    }
}
