//! Thread safety of the pipeline and the batch worker pool

use std::sync::Arc;
use std::thread;

use lawcanon::{
    BatchOptions, BatchPhase, DocumentStore, FsDocumentStore, PipelineConfig, RawDocumentRecord,
    process_record, run_batch,
};
use tempfile::TempDir;

fn led_record(id: &str, paragraf: u32) -> RawDocumentRecord {
    RawDocumentRecord {
        id: id.into(),
        document_number: Some(format!("SFS 2021:{paragraf}")),
        title: Some("Förordning".into()),
        content_type: None,
        markup: Some(format!(
            "<p class=\"LedKapitel\">1 kap. Allmänt</p>\
             <p class=\"LedParagraf\">{paragraf} §</p>\
             <p class=\"LedParagrafText\">Bestämmelse nummer {paragraf}.</p>"
        )),
    }
}

#[test]
fn concurrent_runs_on_shared_config_agree() {
    let cfg = Arc::new(PipelineConfig::default());
    let expected = process_record(led_record("doc", 3), &cfg).expect("baseline");

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let cfg = Arc::clone(&cfg);
            thread::spawn(move || process_record(led_record("doc", 3), &cfg).expect("pipeline"))
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        let out = handle.join().expect("thread panicked");
        assert_eq!(out, expected, "thread {i} diverged");
    }
}

#[test]
fn independent_documents_do_not_interfere() {
    let cfg = Arc::new(PipelineConfig::default());
    let handles: Vec<_> = (1..=12u32)
        .map(|n| {
            let cfg = Arc::clone(&cfg);
            thread::spawn(move || {
                let out = process_record(led_record(&format!("doc-{n}"), n), &cfg).expect("pipeline");
                (n, out)
            })
        })
        .collect();

    for handle in handles {
        let (n, out) = handle.join().expect("thread panicked");
        assert_eq!(out.canonical.doc_id, format!("SFS2021-{n}"));
        let paragraf = out
            .canonical
            .document
            .all_paragrafs()
            .next()
            .expect("one paragraf");
        assert_eq!(paragraf.number, n.to_string());
    }
}

#[test]
fn worker_count_does_not_change_results() {
    let run = |workers: usize| {
        let dir = TempDir::new().expect("tempdir");
        let store = FsDocumentStore::open(dir.path().join("store")).expect("open");
        for n in 1..=9u32 {
            store.insert(led_record(&format!("doc-{n:02}"), n)).expect("insert");
        }
        let mut options = BatchOptions::from_config(&PipelineConfig::default(), dir.path().join("cp"));
        options.phase = BatchPhase::Normalize;
        options.workers = workers;
        options.chunk_size = 4;
        let report = run_batch(&store, &PipelineConfig::default(), &options).expect("batch");
        assert!(!report.has_failures());

        (1..=9u32)
            .map(|n| {
                let doc = store.load(&format!("doc-{n:02}")).expect("load");
                let canonical = doc.canonical.expect("canonical written");
                (canonical.canonical_hash, canonical.json)
            })
            .collect::<Vec<_>>()
    };

    assert_eq!(run(1), run(4));
}
