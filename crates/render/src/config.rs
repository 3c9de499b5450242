//! Options for the markdown renderer.
//!
//! ```rust
//! use render::RenderConfig;
//!
//! let cfg = RenderConfig::default();
//! assert_eq!(cfg.max_heading_level, 6);
//! assert!(!cfg.include_anchors);
//! cfg.validate().expect("defaults are valid");
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderConfig {
    /// Bumped whenever rendered output for the same markup changes.
    pub version: u32,

    /// Emit `<br>` as a newline instead of a space.
    pub preserve_line_breaks: bool,

    /// Append `{#id}` to headings that carry an id.
    pub include_anchors: bool,

    /// Deepest `#` level produced for plain `h1`..`h6` tags.
    pub max_heading_level: u8,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            version: 1,
            preserve_line_breaks: false,
            include_anchors: false,
            max_heading_level: 6,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RenderConfigError {
    #[error("render config version must be >= 1")]
    InvalidVersion,
    #[error("max_heading_level must be within 1..=6, got {0}")]
    HeadingLevelOutOfRange(u8),
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), RenderConfigError> {
        if self.version == 0 {
            return Err(RenderConfigError::InvalidVersion);
        }
        if !(1..=6).contains(&self.max_heading_level) {
            return Err(RenderConfigError::HeadingLevelOutOfRange(self.max_heading_level));
        }
        Ok(())
    }
}
