use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use lawcanon::{
    DocumentHeader, NormalizeConfig, PipelineConfig, RawDocumentRecord, RenderConfig, normalize,
    process_record, to_markdown,
};

/// Riksdag-style anchor markup with `chapters` chapters of `per_chapter` paragrafs.
fn riksdag_markup(chapters: usize, per_chapter: usize) -> String {
    let mut out = String::from(
        "<h2>Arbetsmiljölag (1977:1160)</h2>\n<b>SFS nr</b>: 1977:1160<br>\n<hr>\n<div>\n",
    );
    for k in 1..=chapters {
        out.push_str(&format!("<h3 name=\"K{k}\"><a name=\"K{k}\">{k} kap.</a> Rubrik {k}</h3>\n"));
        for p in 1..=per_chapter {
            out.push_str(&format!(
                "<a class=\"paragraf\" name=\"K{k}P{p}\"><b>{p} §</b></a> \
                 Arbetsgivaren ska systematiskt planera, leda och kontrollera verksamheten.\n"
            ));
        }
    }
    out.push_str("</div>");
    out
}

fn led_markup(paragrafs: usize) -> String {
    (1..=paragrafs)
        .map(|p| {
            format!(
                "<p class=\"LedParagraf\">{p} §</p>\
                 <p class=\"LedParagrafText\">Denna förordning gäller för statliga myndigheter.</p>"
            )
        })
        .collect()
}

fn record(markup: &str) -> RawDocumentRecord {
    RawDocumentRecord {
        id: "bench".into(),
        document_number: Some("SFS 1977:1160".into()),
        title: Some("Arbetsmiljölag".into()),
        content_type: None,
        markup: Some(markup.to_string()),
    }
}

fn bench_normalize(c: &mut Criterion) {
    let cfg = NormalizeConfig::default();
    let header = DocumentHeader::new("SFS 1977:1160", "Arbetsmiljölag");
    let mut group = c.benchmark_group("normalize");

    for (name, markup) in [
        ("riksdag_5x20", riksdag_markup(5, 20)),
        ("led_100", led_markup(100)),
    ] {
        group.throughput(Throughput::Bytes(markup.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), &markup, |b, markup| {
            b.iter(|| normalize(black_box(markup), &header, &cfg))
        });
    }
    group.finish();
}

fn bench_process_record(c: &mut Criterion) {
    let cfg = PipelineConfig::default();
    let mut group = c.benchmark_group("process_record");

    for (chapters, per_chapter) in [(1, 10), (10, 30)] {
        let markup = riksdag_markup(chapters, per_chapter);
        group.throughput(Throughput::Bytes(markup.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("riksdag", format!("{chapters}x{per_chapter}")),
            &markup,
            |b, markup| {
                b.iter(|| process_record(record(black_box(markup)), &cfg).expect("pipeline"))
            },
        );
    }
    group.finish();
}

fn bench_markdown(c: &mut Criterion) {
    let cfg = PipelineConfig::default();
    let canonical = process_record(record(&riksdag_markup(10, 30)), &cfg)
        .expect("pipeline")
        .canonical
        .canonical_markup;
    let render = RenderConfig::default();

    c.bench_function("to_markdown_10x30", |b| {
        b.iter(|| to_markdown(black_box(&canonical), &render))
    });
}

criterion_group!(benches, bench_normalize, bench_process_record, bench_markdown);
criterion_main!(benches);
