//! Error types produced by the ingest crate.
//!
//! All errors are typed, cloneable and comparable so callers (and tests) can
//! match on the exact failure.
//!
//! | Error | Description |
//! |-------|-------------|
//! | [`MissingRecordId`](IngestError::MissingRecordId) | Store record has no usable id |
//! | [`MissingDocumentNumber`](IngestError::MissingDocumentNumber) | No official document number, so no DOC_ID |
//! | [`MissingTitle`](IngestError::MissingTitle) | Title required by config but absent |
//! | [`UnknownContentType`](IngestError::UnknownContentType) | Content type tag is not a known document type |
//! | [`MarkupTooLarge`](IngestError::MarkupTooLarge) | Raw markup exceeds `max_markup_bytes` |
//! | [`InvalidConfig`](IngestError::InvalidConfig) | Configuration failed validation |
//!
//! ```rust
//! use ingest::IngestError;
//!
//! let err = IngestError::MarkupTooLarge { size: 10, limit: 4 };
//! assert_eq!(err.to_string(), "raw markup size 10 exceeds limit of 4 bytes");
//! ```
use thiserror::Error;

/// Errors that can occur while sanitizing a document record.
///
/// The enum is `#[non_exhaustive]`; include a catch-all arm when matching.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    #[error("record id is empty after sanitization")]
    MissingRecordId,

    /// The document number drives DOC_ID derivation, so it is always required.
    #[error("document number is missing or empty")]
    MissingDocumentNumber,

    #[error("title is required by ingest policy")]
    MissingTitle,

    #[error("unknown content type: {0}")]
    UnknownContentType(String),

    #[error("raw markup size {size} exceeds limit of {limit} bytes")]
    MarkupTooLarge { size: usize, limit: usize },

    #[error("invalid ingest configuration: {0}")]
    InvalidConfig(String),
}
