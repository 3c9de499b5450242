use std::path::Path;

use lawcanon::{
    BatchError, BatchOptions, BatchPhase, Checkpoint, DocumentStore, FsDocumentStore,
    PipelineConfig, RawDocumentRecord, run_batch,
};
use tempfile::TempDir;

fn record(id: &str, number: Option<&str>, content_type: &str) -> RawDocumentRecord {
    RawDocumentRecord {
        id: id.into(),
        document_number: number.map(str::to_string),
        title: Some("Lag".into()),
        content_type: Some(content_type.into()),
        markup: Some(format!(
            "<p class=\"LedKapitel\">1 kap. Allmänt</p>\
             <p class=\"LedParagraf\">1 §</p>\
             <p class=\"LedParagrafText\">Dokument {id}.</p>"
        )),
    }
}

struct Fixture {
    dir: TempDir,
    store: FsDocumentStore,
}

impl Fixture {
    fn new(count: usize) -> Self {
        let dir = TempDir::new().expect("tempdir");
        let store = FsDocumentStore::open(dir.path().join("store")).expect("open store");
        for i in 1..=count {
            let number = format!("SFS 2022:{i}");
            store
                .insert(record(&format!("doc-{i:02}"), Some(&number), "SFS_LAW"))
                .expect("insert");
        }
        Self { dir, store }
    }

    fn checkpoint_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("checkpoints")
    }

    fn options(&self, phase: BatchPhase) -> BatchOptions {
        let mut options = BatchOptions::from_config(&PipelineConfig::default(), self.checkpoint_dir());
        options.phase = phase;
        options.workers = 2;
        options.chunk_size = 3;
        options
    }

    fn canonical_count(&self) -> usize {
        self.store
            .list_ids(&Default::default())
            .expect("list")
            .iter()
            .filter(|id| self.store.load(id).expect("load").canonical.is_some())
            .count()
    }
}

fn checkpoint(dir: &Path, phase: BatchPhase) -> Checkpoint {
    Checkpoint::load(dir, phase)
        .expect("readable checkpoint")
        .expect("checkpoint written")
}

#[test]
fn resume_skips_processed_ids() {
    let fx = Fixture::new(7);

    let mut first = fx.options(BatchPhase::Normalize);
    first.limit = Some(4);
    let report = run_batch(&fx.store, &PipelineConfig::default(), &first).expect("first run");
    assert_eq!(report.phases[0].processed, 4);
    assert_eq!(checkpoint(&fx.checkpoint_dir(), BatchPhase::Normalize).last_id.as_deref(), Some("doc-04"));

    let mut second = fx.options(BatchPhase::Normalize);
    second.resume = true;
    let report = run_batch(&fx.store, &PipelineConfig::default(), &second).expect("resumed run");
    assert_eq!(report.phases[0].processed, 3);
    assert_eq!(report.phases[0].last_id.as_deref(), Some("doc-07"));

    let cp = checkpoint(&fx.checkpoint_dir(), BatchPhase::Normalize);
    assert_eq!(cp.processed, 7);
    assert_eq!(cp.succeeded, 7);
    assert_eq!(fx.canonical_count(), 7);

    // nothing left after the cursor
    let report = run_batch(&fx.store, &PipelineConfig::default(), &second).expect("third run");
    assert_eq!(report.phases[0].processed, 0);
}

#[test]
fn phases_keep_separate_checkpoints() {
    let fx = Fixture::new(2);
    run_batch(&fx.store, &PipelineConfig::default(), &fx.options(BatchPhase::All)).expect("batch");

    let normalize = checkpoint(&fx.checkpoint_dir(), BatchPhase::Normalize);
    let derive = checkpoint(&fx.checkpoint_dir(), BatchPhase::Derive);
    assert_eq!(normalize.phase, BatchPhase::Normalize);
    assert_eq!(derive.phase, BatchPhase::Derive);
    assert_eq!(derive.succeeded, 2);

    let doc = fx.store.load("doc-01").expect("load");
    let derived = doc.derived.expect("derived text");
    assert!(derived.plain_text.contains("Dokument doc-01."));
    assert!(derived.markdown.contains("### 1 §"));
}

#[test]
fn dry_run_persists_nothing() {
    let fx = Fixture::new(3);
    let mut options = fx.options(BatchPhase::All);
    options.dry_run = true;

    let report = run_batch(&fx.store, &PipelineConfig::default(), &options).expect("dry run");
    assert_eq!(report.phases[0].succeeded, 3);
    // derive sees no canonical markup because phase A wrote nothing
    assert_eq!(report.phases[1].skipped, 3);

    assert_eq!(fx.canonical_count(), 0);
    assert!(!Checkpoint::path(&fx.checkpoint_dir(), BatchPhase::Normalize).exists());
}

#[test]
fn failing_document_does_not_abort_the_batch() {
    let fx = Fixture::new(4);
    fx.store
        .insert(record("doc-02", None, "SFS_LAW"))
        .expect("replace with broken record");

    let report = run_batch(&fx.store, &PipelineConfig::default(), &fx.options(BatchPhase::Normalize))
        .expect("batch completes");

    assert!(report.has_failures());
    let phase = &report.phases[0];
    assert_eq!(phase.processed, 4);
    assert_eq!(phase.succeeded, 3);
    assert_eq!(phase.failures.len(), 1);
    assert_eq!(phase.failures[0].id, "doc-02");
    assert!(phase.failures[0].error.contains("document number"));
    assert_eq!(fx.canonical_count(), 3);

    let cp = checkpoint(&fx.checkpoint_dir(), BatchPhase::Normalize);
    assert_eq!(cp.failed, 1);
    assert_eq!(cp.last_id.as_deref(), Some("doc-04"));
}

#[test]
fn needs_review_is_not_a_failure() {
    let fx = Fixture::new(0);
    let mut raw = record("doc-x", Some("SFS 2022:9"), "SFS_LAW");
    raw.markup = Some(
        r#"<article class="legal-document" id="OTHER">
<div class="lovhead"><h1><p class="text">SFS 2022:9</p><p class="text">Lag</p></h1></div>
<div class="body"><h3 class="paragraph"><a class="paragraf" id="OTHER_P1" name="OTHER_P1">1 §</a></h3><p class="text">Text.</p></div>
</article>"#
            .into(),
    );
    fx.store.insert(raw).expect("insert");

    let report = run_batch(&fx.store, &PipelineConfig::default(), &fx.options(BatchPhase::Normalize))
        .expect("batch");
    assert!(!report.has_failures());
    assert_eq!(report.phases[0].needs_review, 1);

    let canonical = fx.store.load("doc-x").expect("load").canonical.expect("persisted");
    assert!(!canonical.validation.is_valid());
}

#[test]
fn content_type_filter_and_limit() {
    let fx = Fixture::new(3);
    fx.store
        .insert(record("doc-00", Some("AFS 2023:10"), "AGENCY_REGULATION"))
        .expect("insert");

    let mut options = fx.options(BatchPhase::Normalize);
    options.content_type = Some("agency_regulation".into());
    let report = run_batch(&fx.store, &PipelineConfig::default(), &options).expect("batch");
    assert_eq!(report.phases[0].processed, 1);
    assert_eq!(
        fx.store.load("doc-00").expect("load").canonical.expect("written").doc_id,
        "AFS2023-10"
    );
}

#[test]
fn unreadable_checkpoint_aborts_resume() {
    let fx = Fixture::new(1);
    std::fs::create_dir_all(fx.checkpoint_dir()).expect("mkdir");
    std::fs::write(Checkpoint::path(&fx.checkpoint_dir(), BatchPhase::Normalize), "[]")
        .expect("write");

    let mut options = fx.options(BatchPhase::Normalize);
    options.resume = true;
    let result = run_batch(&fx.store, &PipelineConfig::default(), &options);
    assert!(matches!(result, Err(BatchError::CheckpointFormat { .. })));
}
