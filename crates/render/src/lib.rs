//! Derived text forms of canonical legal markup.
//!
//! - [`to_markdown`]: markdown for reading and LLM context, with legal
//!   headings mapped by class (`h3.paragraph` to `###`, `.group` to `##`)
//! - [`to_plain_text`]: one line of whitespace-collapsed text for search
//!
//! Both are pure and deterministic; neither fails.
//!
//! ```rust
//! use render::{to_markdown, to_plain_text, RenderConfig};
//!
//! let markup = r#"<h3 class="paragraph"><a class="paragraf" id="X_P1">1 §</a></h3><p class="text">Lagen gäller.</p>"#;
//! assert_eq!(to_markdown(markup, &RenderConfig::default()), "### 1 §\n\nLagen gäller.\n");
//! assert_eq!(to_plain_text(markup), "1 § Lagen gäller.");
//! ```

mod config;
mod markdown;
mod plain;
mod table;

pub use crate::config::{RenderConfig, RenderConfigError};
pub use crate::markdown::to_markdown;
pub use crate::plain::to_plain_text;
