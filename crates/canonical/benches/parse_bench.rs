use canonical::{parse, validate_document, ParseConfig, ParseOptions};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

fn chaptered_markup(chapters: usize, paragrafs_per_chapter: usize) -> String {
    let mut body = String::new();
    for k in 1..=chapters {
        body.push_str(&format!(
            "<section class=\"kapitel\" id=\"SFS1977-1160_K{k}\"><h2 class=\"kapitel-rubrik\">{k} kap. Rubrik</h2>"
        ));
        for p in 1..=paragrafs_per_chapter {
            body.push_str(&format!(
                "<h3 class=\"paragraph\"><a class=\"paragraf\" id=\"SFS1977-1160_K{k}_P{p}\" name=\"SFS1977-1160_K{k}_P{p}\">{p} §</a></h3>\
                 <p class=\"text\">Arbetsgivaren ska vidta alla åtgärder som behövs.</p>\
                 <p class=\"text\">Lag (2002:585).</p>"
            ));
        }
        body.push_str("</section>");
    }
    format!(
        "<article class=\"legal-document\" id=\"SFS1977-1160\">\
         <div class=\"lovhead\"><h1><p class=\"text\">SFS 1977:1160</p><p class=\"text\">Arbetsmiljölag</p></h1></div>\
         <div class=\"body\">{body}</div></article>"
    )
}

fn bench_parse(c: &mut Criterion) {
    let config = ParseConfig::default();
    let options = ParseOptions::default();
    let mut group = c.benchmark_group("parse");

    for (chapters, per_chapter) in [(1, 5), (5, 20), (20, 40)] {
        let markup = chaptered_markup(chapters, per_chapter);
        group.throughput(Throughput::Bytes(markup.len() as u64));
        group.bench_function(format!("chapters_{chapters}x{per_chapter}"), |b| {
            b.iter(|| {
                parse(black_box(&markup), black_box(&options), black_box(&config)).expect("parse")
            })
        });
    }

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let markup = chaptered_markup(20, 40);
    let doc = parse(&markup, &ParseOptions::default(), &ParseConfig::default()).expect("parse");
    c.bench_function("validate_20x40", |b| {
        b.iter(|| validate_document(black_box(&doc)).expect("valid"))
    });
}

criterion_group!(benches, bench_parse, bench_validate);
criterion_main!(benches);
