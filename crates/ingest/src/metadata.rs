//! Metadata sanitization and DOC_ID derivation.
//!
//! ```text
//! RawDocumentRecord
//!        │
//!        ▼
//! ┌─────────────────────────────┐
//! │ 1. Sanitize strings         │
//! │    - strip control chars    │
//! │    - collapse whitespace    │
//! ├─────────────────────────────┤
//! │ 2. Enforce required fields  │
//! │    - id, document number    │
//! │    - title (optional policy)│
//! ├─────────────────────────────┤
//! │ 3. Derive                   │
//! │    - DOC_ID                 │
//! │    - document type          │
//! └─────────────────────────────┘
//!        │
//!        ▼
//! IngestedDocument
//! ```

use crate::error::IngestError;

/// Derives the stable DOC_ID from an official document number.
///
/// All whitespace is removed and the first colon becomes a hyphen. The
/// result depends on the number alone.
///
/// ```rust
/// use ingest::doc_id;
///
/// assert_eq!(doc_id("SFS 1977:1160"), "SFS1977-1160");
/// assert_eq!(doc_id("AFS 2023:10"), "AFS2023-10");
/// ```
pub fn doc_id(document_number: &str) -> String {
    let compact: String = document_number
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    compact.replacen(':', "-", 1)
}

/// Trims, collapses inner whitespace and optionally strips control
/// characters. Returns `None` when nothing is left.
pub(crate) fn sanitize_optional_string(value: Option<String>, strip_control: bool) -> Option<String> {
    let value = value?;
    let cleaned: String = if strip_control {
        value.chars().filter(|c| !c.is_control() || c.is_whitespace()).collect()
    } else {
        value
    };
    let mut out = String::with_capacity(cleaned.len());
    for segment in cleaned.split_whitespace() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(segment);
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

pub(crate) fn sanitize_required_field(
    value: Option<String>,
    strip_control: bool,
    missing: IngestError,
) -> Result<String, IngestError> {
    sanitize_optional_string(value, strip_control).ok_or(missing)
}
