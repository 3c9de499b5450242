//! Workspace umbrella crate for the legal document canonicalization pipeline.
//!
//! Stitches the stage crates together so callers can go from a stored record
//! to canonical markup, structured JSON and text derivations with one call:
//!
//! ```text
//! RawDocumentRecord ─ ingest ─ normalize ─ parse ─ validate ─┬─ canonical markup + hash
//!                                                            ├─ CanonicalDocumentJson
//!                                                            └─ markdown / plain text
//! ```
//!
//! Parse failure is the only hard error once a record is ingested. Content
//! loss in the normalizer downgrades to the fallback document, and schema
//! violations mark the output [`ValidationStatus::NeedsReview`] instead of
//! failing it.
//!
//! The [`batch`](run_batch) orchestrator runs the same stages over a
//! [`DocumentStore`] in two resumable phases.

mod batch;
mod config;
mod store;

pub use canonical::{
    BodyShape, CanonicalDocumentJson, CanonicalParagraf, CanonicalStycke, ParagrafStatus,
    ParseConfig, ParseError, ParseOptions, SCHEMA_VERSION, StyckeRole, ValidationError,
    hash_canonical_bytes, parse, validate, validate_document,
};
pub use ingest::{
    DocumentHeader, DocumentType, IngestConfig, IngestError, IngestedDocument, RawDocumentRecord,
    doc_id, ingest,
};
pub use normalize::{Dialect, NormalizeConfig, NormalizeOutcome, Normalized, normalize};
pub use render::{RenderConfig, to_markdown, to_plain_text};

pub use crate::batch::{
    BatchError, BatchOptions, BatchPhase, BatchReport, Checkpoint, DocumentFailure, PhaseReport,
    run_batch,
};
pub use crate::config::{BatchConfig, ConfigLoadError, PipelineConfig};
pub use crate::store::{
    CanonicalRecord, DerivedRecord, DocumentStore, FsDocumentStore, ListQuery, StoreError,
    StoredDocument,
};

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};
use std::time::{Duration, Instant};
use tracing::{Level, info, warn};

/// Errors that stop a document from producing output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    Ingest(IngestError),
    Parse(ParseError),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Ingest(err) => write!(f, "ingest failure: {err}"),
            PipelineError::Parse(err) => write!(f, "canonical parse failure: {err}"),
        }
    }
}

impl Error for PipelineError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            PipelineError::Ingest(err) => Some(err),
            PipelineError::Parse(err) => Some(err),
        }
    }
}

impl From<IngestError> for PipelineError {
    fn from(value: IngestError) -> Self {
        PipelineError::Ingest(value)
    }
}

impl From<ParseError> for PipelineError {
    fn from(value: ParseError) -> Self {
        PipelineError::Parse(value)
    }
}

/// Whether the JSON document passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ValidationStatus {
    Valid,
    /// Persisted anyway; `violations` holds one message per problem.
    NeedsReview { violations: Vec<String> },
}

impl ValidationStatus {
    fn from_result(result: Result<(), Vec<ValidationError>>) -> Self {
        match result {
            Ok(()) => ValidationStatus::Valid,
            Err(errors) => ValidationStatus::NeedsReview {
                violations: errors.iter().map(ToString::to_string).collect(),
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationStatus::Valid)
    }
}

/// Normalize-phase output: everything derived from the raw markup except
/// the text renderings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalOutput {
    pub doc_id: String,
    pub dialect: Dialect,
    pub outcome: NormalizeOutcome,
    pub canonical_markup: String,
    /// [`hash_canonical_bytes`] of the markup under the parse config version.
    pub canonical_hash: String,
    pub document: CanonicalDocumentJson,
    pub validation: ValidationStatus,
}

/// Derive-phase output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DerivedText {
    pub markdown: String,
    pub plain_text: String,
}

/// Everything [`process_document`] produces for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineOutput {
    #[serde(flatten)]
    pub canonical: CanonicalOutput,
    #[serde(flatten)]
    pub derived: DerivedText,
}

/// Metrics observer for pipeline stages.
pub trait PipelineMetrics: Send + Sync {
    fn record_ingest(&self, latency: Duration, result: Result<(), IngestError>);
    fn record_normalize(&self, latency: Duration, dialect: Dialect, outcome: NormalizeOutcome);
    fn record_parse(&self, latency: Duration, result: Result<(), ParseError>);
    fn record_validation(&self, latency: Duration, violations: usize);
    fn record_render(&self, latency: Duration);
}

/// Install or clear the global pipeline metrics recorder.
pub fn set_pipeline_metrics(recorder: Option<Arc<dyn PipelineMetrics>>) {
    let mut guard = metrics_lock()
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn PipelineMetrics>>> {
    static METRICS: OnceLock<RwLock<Option<Arc<dyn PipelineMetrics>>>> = OnceLock::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

fn metrics_recorder() -> Option<Arc<dyn PipelineMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

struct MetricsSpan {
    recorder: Arc<dyn PipelineMetrics>,
    start: Instant,
}

impl MetricsSpan {
    fn start() -> Option<Self> {
        metrics_recorder().map(|recorder| Self {
            recorder,
            start: Instant::now(),
        })
    }

    fn record_ingest(self, result: Result<(), IngestError>) {
        self.recorder.record_ingest(self.start.elapsed(), result);
    }

    fn record_normalize(self, normalized: &Normalized) {
        self.recorder
            .record_normalize(self.start.elapsed(), normalized.dialect, normalized.outcome);
    }

    fn record_parse(self, result: Result<(), ParseError>) {
        self.recorder.record_parse(self.start.elapsed(), result);
    }

    fn record_validation(self, violations: usize) {
        self.recorder
            .record_validation(self.start.elapsed(), violations);
    }

    fn record_render(self) {
        self.recorder.record_render(self.start.elapsed());
    }
}

/// Ingest a raw store record and run it through the whole pipeline.
pub fn process_record(
    raw: RawDocumentRecord,
    cfg: &PipelineConfig,
) -> Result<PipelineOutput, PipelineError> {
    let doc = ingest_record(raw, &cfg.ingest)?;
    process_document(doc, cfg)
}

/// Run an ingested document through normalize, parse, validate and render.
pub fn process_document(
    doc: IngestedDocument,
    cfg: &PipelineConfig,
) -> Result<PipelineOutput, PipelineError> {
    let canonical = canonicalize_document(&doc, cfg)?;
    let derived = derive_text(&canonical.canonical_markup, &cfg.render);
    Ok(PipelineOutput { canonical, derived })
}

pub(crate) fn ingest_record(
    raw: RawDocumentRecord,
    cfg: &IngestConfig,
) -> Result<IngestedDocument, PipelineError> {
    let metrics = MetricsSpan::start();
    let result = ingest(raw, cfg);
    if let Some(span) = metrics {
        span.record_ingest(result.as_ref().map(|_| ()).map_err(Clone::clone));
    }
    Ok(result?)
}

/// Normalize-phase stages for one document.
pub fn canonicalize_document(
    doc: &IngestedDocument,
    cfg: &PipelineConfig,
) -> Result<CanonicalOutput, PipelineError> {
    let start = Instant::now();
    let span = tracing::span!(Level::INFO, "pipeline.process", doc_id = %doc.doc_id);
    let _guard = span.enter();

    let metrics = MetricsSpan::start();
    let normalized = normalize(&doc.markup, &doc.header, &cfg.normalize);
    if let Some(span) = metrics {
        span.record_normalize(&normalized);
    }

    let options = ParseOptions {
        document_type: Some(doc.document_type),
        ..ParseOptions::default()
    };
    let metrics = MetricsSpan::start();
    let parsed = parse(&normalized.markup, &options, &cfg.parse);
    if let Some(span) = metrics {
        span.record_parse(parsed.as_ref().map(|_| ()).map_err(Clone::clone));
    }
    let document = match parsed {
        Ok(document) => document,
        Err(err) => {
            warn!(
                error = %err,
                dialect = %normalized.dialect,
                elapsed_micros = start.elapsed().as_micros(),
                "pipeline_parse_failure"
            );
            return Err(err.into());
        }
    };

    let metrics = MetricsSpan::start();
    let validation = ValidationStatus::from_result(validate_document(&document));
    if let Some(span) = metrics {
        let violations = match &validation {
            ValidationStatus::Valid => 0,
            ValidationStatus::NeedsReview { violations } => violations.len(),
        };
        span.record_validation(violations);
    }
    if let ValidationStatus::NeedsReview { violations } = &validation {
        warn!(
            violations = violations.len(),
            first = violations.first().map(String::as_str).unwrap_or(""),
            "pipeline_needs_review"
        );
    }

    let canonical_hash = hash_canonical_bytes(cfg.parse.version, normalized.markup.as_bytes());
    info!(
        dialect = %normalized.dialect,
        outcome = normalized.outcome.as_str(),
        valid = validation.is_valid(),
        elapsed_micros = start.elapsed().as_micros(),
        "pipeline_canonicalized"
    );

    Ok(CanonicalOutput {
        doc_id: doc.doc_id.clone(),
        dialect: normalized.dialect,
        outcome: normalized.outcome,
        canonical_markup: normalized.markup,
        canonical_hash,
        document,
        validation,
    })
}

/// Derive-phase rendering of canonical markup.
pub fn derive_text(canonical_markup: &str, cfg: &RenderConfig) -> DerivedText {
    let metrics = MetricsSpan::start();
    let derived = DerivedText {
        markdown: to_markdown(canonical_markup, cfg),
        plain_text: to_plain_text(canonical_markup),
    };
    if let Some(span) = metrics {
        span.record_render();
    }
    derived
}
