//! Two-phase batch orchestrator over a [`DocumentStore`].
//!
//! - **normalize**: ingest, normalize, parse, validate and hash each record,
//!   writing a [`CanonicalRecord`] back to the store
//! - **derive**: render markdown and plain text for every document that
//!   already has canonical markup, writing a [`DerivedRecord`]
//!
//! Ids are processed in ascending order, in chunks, on a bounded rayon pool.
//! After each chunk the phase's checkpoint file is rewritten with the last id
//! of that chunk, so `resume` restarts after the last fully finished chunk.
//! A failing document is recorded in the report and never stops the batch.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{Level, info, warn};

use crate::config::PipelineConfig;
use crate::store::{
    CanonicalRecord, DerivedRecord, DocumentStore, ListQuery, StoreError, write_atomic,
};
use crate::{ValidationStatus, canonicalize_document, derive_text, ingest_record};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("invalid batch options: {0}")]
    InvalidOptions(String),
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("checkpoint I/O error at {path}: {source}")]
    CheckpointIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("checkpoint at {path} is not valid JSON: {source}")]
    CheckpointFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Which phases a run executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchPhase {
    Normalize,
    Derive,
    /// Normalize, then derive.
    All,
}

impl BatchPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchPhase::Normalize => "normalize",
            BatchPhase::Derive => "derive",
            BatchPhase::All => "all",
        }
    }

    fn steps(self) -> &'static [BatchPhase] {
        match self {
            BatchPhase::Normalize => &[BatchPhase::Normalize],
            BatchPhase::Derive => &[BatchPhase::Derive],
            BatchPhase::All => &[BatchPhase::Normalize, BatchPhase::Derive],
        }
    }
}

impl fmt::Display for BatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normalize" => Ok(BatchPhase::Normalize),
            "derive" => Ok(BatchPhase::Derive),
            "all" => Ok(BatchPhase::All),
            other => Err(format!("unknown phase {other:?}, expected normalize, derive or all")),
        }
    }
}

/// Per-run options.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub phase: BatchPhase,
    /// Compute everything but write neither documents nor checkpoints.
    pub dry_run: bool,
    pub content_type: Option<String>,
    pub limit: Option<usize>,
    /// Start after the id recorded in the phase checkpoint.
    pub resume: bool,
    pub checkpoint_dir: PathBuf,
    pub workers: usize,
    pub chunk_size: usize,
    /// When set, no chunk is started after it turns true.
    pub cancel: Option<Arc<AtomicBool>>,
}

impl BatchOptions {
    /// Options seeded from the config's batch section.
    pub fn from_config(cfg: &PipelineConfig, checkpoint_dir: impl Into<PathBuf>) -> Self {
        Self {
            phase: BatchPhase::All,
            dry_run: false,
            content_type: None,
            limit: None,
            resume: false,
            checkpoint_dir: checkpoint_dir.into(),
            workers: cfg.batch.workers,
            chunk_size: cfg.batch.chunk_size,
            cancel: None,
        }
    }

    fn validate(&self) -> Result<(), BatchError> {
        if self.workers == 0 {
            return Err(BatchError::InvalidOptions("workers must be >= 1".into()));
        }
        if self.chunk_size == 0 {
            return Err(BatchError::InvalidOptions("chunk_size must be >= 1".into()));
        }
        Ok(())
    }

    fn cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
    }
}

/// Persisted cursor and running counters for one phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub phase: BatchPhase,
    pub last_id: Option<String>,
    pub processed: u64,
    pub succeeded: u64,
    pub needs_review: u64,
    pub failed: u64,
    pub skipped: u64,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    fn new(phase: BatchPhase) -> Self {
        Self {
            phase,
            last_id: None,
            processed: 0,
            succeeded: 0,
            needs_review: 0,
            failed: 0,
            skipped: 0,
            updated_at: Utc::now(),
        }
    }

    pub fn path(dir: &Path, phase: BatchPhase) -> PathBuf {
        dir.join(format!("{}.checkpoint.json", phase.as_str()))
    }

    pub fn load(dir: &Path, phase: BatchPhase) -> Result<Option<Self>, BatchError> {
        let path = Self::path(dir, phase);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(BatchError::CheckpointIo { path, source }),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| BatchError::CheckpointFormat { path, source })
    }

    fn save(&self, dir: &Path) -> Result<(), BatchError> {
        let path = Self::path(dir, self.phase);
        fs::create_dir_all(dir).map_err(|source| BatchError::CheckpointIo {
            path: dir.to_path_buf(),
            source,
        })?;
        let bytes = serde_json::to_vec_pretty(self).map_err(|source| {
            BatchError::CheckpointFormat {
                path: path.clone(),
                source,
            }
        })?;
        write_atomic(&path, &bytes).map_err(|source| BatchError::CheckpointIo { path, source })
    }
}

/// A document that hard-failed, with the error rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub id: String,
    pub error: String,
}

/// Counters for one phase of this run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseReport {
    pub phase: BatchPhase,
    pub processed: u64,
    pub succeeded: u64,
    pub needs_review: u64,
    pub skipped: u64,
    pub failures: Vec<DocumentFailure>,
    pub last_id: Option<String>,
    pub cancelled: bool,
}

impl PhaseReport {
    fn new(phase: BatchPhase) -> Self {
        Self {
            phase,
            processed: 0,
            succeeded: 0,
            needs_review: 0,
            skipped: 0,
            failures: Vec::new(),
            last_id: None,
            cancelled: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub phases: Vec<PhaseReport>,
}

impl BatchReport {
    /// True when any document hard-failed. `needs_review` does not count.
    pub fn has_failures(&self) -> bool {
        self.phases.iter().any(|phase| !phase.failures.is_empty())
    }

    pub fn failed(&self) -> usize {
        self.phases.iter().map(|phase| phase.failures.len()).sum()
    }
}

enum DocOutcome {
    Succeeded,
    NeedsReview,
    Skipped,
    Failed(String),
}

/// Run the selected phases over `store`.
pub fn run_batch(
    store: &dyn DocumentStore,
    cfg: &PipelineConfig,
    options: &BatchOptions,
) -> Result<BatchReport, BatchError> {
    options.validate()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .thread_name(|i| format!("lawcanon-worker-{i}"))
        .build()?;

    let mut report = BatchReport::default();
    for &phase in options.phase.steps() {
        let phase_report = run_phase(store, cfg, options, phase, &pool)?;
        let cancelled = phase_report.cancelled;
        report.phases.push(phase_report);
        if cancelled {
            break;
        }
    }
    Ok(report)
}

fn run_phase(
    store: &dyn DocumentStore,
    cfg: &PipelineConfig,
    options: &BatchOptions,
    phase: BatchPhase,
    pool: &rayon::ThreadPool,
) -> Result<PhaseReport, BatchError> {
    let start = Instant::now();
    let span = tracing::span!(Level::INFO, "batch.phase", phase = phase.as_str());
    let _guard = span.enter();

    let mut checkpoint = if options.resume {
        Checkpoint::load(&options.checkpoint_dir, phase)?.unwrap_or_else(|| Checkpoint::new(phase))
    } else {
        Checkpoint::new(phase)
    };

    let ids = store.list_ids(&ListQuery {
        after: checkpoint.last_id.as_deref(),
        content_type: options.content_type.as_deref(),
        limit: options.limit,
    })?;
    info!(
        documents = ids.len(),
        resume_after = checkpoint.last_id.as_deref().unwrap_or(""),
        dry_run = options.dry_run,
        "batch_phase_start"
    );

    let mut report = PhaseReport::new(phase);
    for chunk in ids.chunks(options.chunk_size) {
        if options.cancelled() {
            report.cancelled = true;
            warn!(last_id = report.last_id.as_deref().unwrap_or(""), "batch_cancelled");
            break;
        }

        let outcomes: Vec<(&String, DocOutcome)> = pool.install(|| {
            chunk
                .par_iter()
                .map(|id| (id, process_one(store, cfg, phase, id, options.dry_run)))
                .collect()
        });

        for (id, outcome) in outcomes {
            report.processed += 1;
            checkpoint.processed += 1;
            match outcome {
                DocOutcome::Succeeded => {
                    report.succeeded += 1;
                    checkpoint.succeeded += 1;
                }
                DocOutcome::NeedsReview => {
                    report.needs_review += 1;
                    checkpoint.needs_review += 1;
                }
                DocOutcome::Skipped => {
                    report.skipped += 1;
                    checkpoint.skipped += 1;
                }
                DocOutcome::Failed(error) => {
                    checkpoint.failed += 1;
                    report.failures.push(DocumentFailure {
                        id: id.clone(),
                        error,
                    });
                }
            }
        }

        report.last_id = chunk.last().cloned();
        checkpoint.last_id = report.last_id.clone();
        checkpoint.updated_at = Utc::now();
        if !options.dry_run {
            checkpoint.save(&options.checkpoint_dir)?;
        }
    }

    info!(
        processed = report.processed,
        succeeded = report.succeeded,
        needs_review = report.needs_review,
        skipped = report.skipped,
        failed = report.failures.len(),
        elapsed_micros = start.elapsed().as_micros(),
        "batch_phase_complete"
    );
    Ok(report)
}

fn process_one(
    store: &dyn DocumentStore,
    cfg: &PipelineConfig,
    phase: BatchPhase,
    id: &str,
    dry_run: bool,
) -> DocOutcome {
    let result = match phase {
        BatchPhase::Derive => derive_one(store, cfg, id, dry_run),
        _ => normalize_one(store, cfg, id, dry_run),
    };
    result.unwrap_or_else(|error| {
        warn!(id, phase = phase.as_str(), error = %error, "batch_document_failed");
        DocOutcome::Failed(error)
    })
}

fn normalize_one(
    store: &dyn DocumentStore,
    cfg: &PipelineConfig,
    id: &str,
    dry_run: bool,
) -> Result<DocOutcome, String> {
    let stored = store.load(id).map_err(|err| err.to_string())?;
    let doc = ingest_record(stored.record, &cfg.ingest).map_err(|err| err.to_string())?;
    let output = canonicalize_document(&doc, cfg).map_err(|err| err.to_string())?;

    let outcome = match output.validation {
        ValidationStatus::Valid => DocOutcome::Succeeded,
        ValidationStatus::NeedsReview { .. } => DocOutcome::NeedsReview,
    };
    if !dry_run {
        let record = CanonicalRecord {
            doc_id: output.doc_id,
            dialect: output.dialect,
            outcome: output.outcome,
            canonical_markup: output.canonical_markup,
            canonical_hash: output.canonical_hash,
            canonical_version: cfg.parse.version,
            json: output.document,
            validation: output.validation,
            processed_at: Utc::now(),
        };
        store
            .save_canonical(id, &record)
            .map_err(|err| err.to_string())?;
    }
    Ok(outcome)
}

fn derive_one(
    store: &dyn DocumentStore,
    cfg: &PipelineConfig,
    id: &str,
    dry_run: bool,
) -> Result<DocOutcome, String> {
    let stored = store.load(id).map_err(|err| err.to_string())?;
    let Some(canonical) = stored.canonical else {
        return Ok(DocOutcome::Skipped);
    };
    let derived = derive_text(&canonical.canonical_markup, &cfg.render);
    if !dry_run {
        let record = DerivedRecord {
            markdown: derived.markdown,
            plain_text: derived.plain_text,
            derived_at: Utc::now(),
        };
        store
            .save_derived(id, &record)
            .map_err(|err| err.to_string())?;
    }
    Ok(DocOutcome::Succeeded)
}
