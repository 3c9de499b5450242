//! Ingest layer for the legal-document pipeline.
//!
//! Document records arrive from the store with loosely typed metadata: an id,
//! the official document number ("SFS 1977:1160"), a title, a content type tag
//! and the raw markup. This crate turns that into an [`IngestedDocument`] the
//! normalizer can trust.
//!
//! ## What we do here
//!
//! - **Sanitize metadata** - strip control characters, trim, collapse whitespace
//! - **Enforce required fields** - id and document number always, title on request
//! - **Derive the DOC_ID** - whitespace removed, first colon becomes `-`
//! - **Classify** - parse the content type tag or infer it from the number
//! - **Bound the input** - reject markup above `max_markup_bytes`
//! - **Log** - structured `tracing` events for success and failure
//!
//! ## Example
//!
//! ```
//! use ingest::{ingest, DocumentType, IngestConfig, RawDocumentRecord};
//!
//! let record = RawDocumentRecord {
//!     id: "sfs-1977-1160".into(),
//!     document_number: Some(" SFS 1977:1160 ".into()),
//!     title: Some("Arbetsmiljölag (1977:1160)".into()),
//!     content_type: Some("sfs_law".into()),
//!     markup: Some("<p>1 §</p>".into()),
//! };
//!
//! let doc = ingest(record, &IngestConfig::default()).expect("valid record");
//! assert_eq!(doc.doc_id, "SFS1977-1160");
//! assert_eq!(doc.header.document_number, "SFS 1977:1160");
//! assert_eq!(doc.document_type, DocumentType::SfsLaw);
//! ```
use std::time::Instant;

use tracing::{info, warn, Level};

mod config;
mod error;
mod metadata;
mod types;

pub use crate::config::{ConfigError, IngestConfig};
pub use crate::error::IngestError;
pub use crate::metadata::doc_id;
pub use crate::types::{DocumentHeader, DocumentType, IngestedDocument, RawDocumentRecord};

use crate::metadata::{sanitize_optional_string, sanitize_required_field};

/// Sanitize a raw store record into an [`IngestedDocument`].
pub fn ingest(raw: RawDocumentRecord, cfg: &IngestConfig) -> Result<IngestedDocument, IngestError> {
    let start = Instant::now();

    if let Err(err) = cfg.validate() {
        let err = IngestError::from(err);
        warn!(error = %err, "ingest_failure");
        return Err(err);
    }

    let RawDocumentRecord {
        id,
        document_number,
        title,
        content_type,
        markup,
    } = raw;

    let record_id = match sanitize_required_field(
        Some(id),
        cfg.strip_control_chars,
        IngestError::MissingRecordId,
    ) {
        Ok(id) => id,
        Err(err) => {
            let elapsed_micros = start.elapsed().as_micros();
            warn!(error = %err, elapsed_micros, "ingest_failure");
            return Err(err);
        }
    };

    let span = tracing::span!(Level::INFO, "ingest.ingest", record_id = %record_id);
    let _guard = span.enter();

    let number_hint = document_number.clone();
    match ingest_inner(record_id, document_number, title, content_type, markup, cfg) {
        Ok(doc) => {
            let elapsed_micros = start.elapsed().as_micros();
            info!(
                doc_id = %doc.doc_id,
                document_type = %doc.document_type,
                markup_len = doc.markup.len(),
                elapsed_micros,
                "ingest_success"
            );
            Ok(doc)
        }
        Err(err) => {
            let elapsed_micros = start.elapsed().as_micros();
            warn!(
                document_number = ?number_hint,
                error = %err,
                elapsed_micros,
                "ingest_failure"
            );
            Err(err)
        }
    }
}

fn ingest_inner(
    record_id: String,
    document_number: Option<String>,
    title: Option<String>,
    content_type: Option<String>,
    markup: Option<String>,
    cfg: &IngestConfig,
) -> Result<IngestedDocument, IngestError> {
    let markup = markup.unwrap_or_default();
    if let Some(limit) = cfg.max_markup_bytes {
        if markup.len() > limit {
            return Err(IngestError::MarkupTooLarge {
                size: markup.len(),
                limit,
            });
        }
    }

    let strip = cfg.strip_control_chars;
    let document_number =
        sanitize_required_field(document_number, strip, IngestError::MissingDocumentNumber)?;
    let title = match sanitize_optional_string(title, strip) {
        Some(title) => title,
        None if cfg.require_title => return Err(IngestError::MissingTitle),
        None => String::new(),
    };

    let document_type = match sanitize_optional_string(content_type, strip) {
        Some(tag) => tag.parse::<DocumentType>()?,
        None => cfg
            .default_document_type
            .unwrap_or_else(|| DocumentType::infer(&document_number)),
    };

    let header = DocumentHeader::new(document_number, title);
    Ok(IngestedDocument {
        id: record_id,
        doc_id: header.doc_id(),
        header,
        document_type,
        markup,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_record() -> RawDocumentRecord {
        RawDocumentRecord {
            id: "afs-2023-10".into(),
            document_number: Some("AFS 2023:10".into()),
            title: Some("Risker i arbetsmiljön".into()),
            content_type: None,
            markup: Some("<p>1 § Text.</p>".into()),
        }
    }

    #[test]
    fn infers_type_when_tag_missing() {
        let doc = ingest(base_record(), &IngestConfig::default()).expect("ingest");
        assert_eq!(doc.document_type, DocumentType::AgencyRegulation);
        assert_eq!(doc.doc_id, "AFS2023-10");
        assert_eq!(doc.id, "afs-2023-10");
    }

    #[test]
    fn explicit_tag_wins_over_inference() {
        let mut record = base_record();
        record.content_type = Some("EU_DIRECTIVE".into());
        let doc = ingest(record, &IngestConfig::default()).expect("ingest");
        assert_eq!(doc.document_type, DocumentType::EuDirective);
    }

    #[test]
    fn default_type_from_config_is_used() {
        let cfg = IngestConfig {
            default_document_type: Some(DocumentType::SfsAmendment),
            ..Default::default()
        };
        let doc = ingest(base_record(), &cfg).expect("ingest");
        assert_eq!(doc.document_type, DocumentType::SfsAmendment);
    }

    #[test]
    fn blank_id_is_rejected() {
        let mut record = base_record();
        record.id = " \t ".into();
        let err = ingest(record, &IngestConfig::default()).unwrap_err();
        assert_eq!(err, IngestError::MissingRecordId);
    }

    #[test]
    fn missing_number_is_rejected() {
        let mut record = base_record();
        record.document_number = Some("\u{0}".into());
        let err = ingest(record, &IngestConfig::default()).unwrap_err();
        assert_eq!(err, IngestError::MissingDocumentNumber);
    }

    #[test]
    fn title_policy_is_enforced() {
        let mut record = base_record();
        record.title = None;
        let lenient = ingest(record.clone(), &IngestConfig::default()).expect("lenient");
        assert_eq!(lenient.header.title, "");

        let strict = IngestConfig {
            require_title: true,
            ..Default::default()
        };
        assert_eq!(ingest(record, &strict).unwrap_err(), IngestError::MissingTitle);
    }

    #[test]
    fn oversized_markup_is_rejected() {
        let cfg = IngestConfig {
            max_markup_bytes: Some(4),
            ..Default::default()
        };
        let err = ingest(base_record(), &cfg).unwrap_err();
        assert!(matches!(err, IngestError::MarkupTooLarge { limit: 4, .. }));
    }

    #[test]
    fn missing_markup_counts_as_empty() {
        let mut record = base_record();
        record.markup = None;
        let doc = ingest(record, &IngestConfig::default()).expect("ingest");
        assert!(doc.markup.is_empty());
    }

    #[test]
    fn invalid_config_surfaces_as_error() {
        let cfg = IngestConfig {
            version: 0,
            ..Default::default()
        };
        let err = ingest(base_record(), &cfg).unwrap_err();
        assert!(matches!(err, IngestError::InvalidConfig(_)));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let mut record = base_record();
        record.content_type = Some("court_case".into());
        let err = ingest(record, &IngestConfig::default()).unwrap_err();
        assert_eq!(err, IngestError::UnknownContentType("court_case".into()));
    }
}
