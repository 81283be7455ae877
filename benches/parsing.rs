use criterion::{criterion_group, criterion_main, Criterion};
use std::path::Path;

fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    mhtml2html::parser::read_archive(path).unwrap()
}

fn bench_parse(c: &mut Criterion) {
    let text = load_fixture("page.mhtml");

    c.bench_function("parse_page_mhtml", |b| {
        b.iter(|| mhtml2html::parse(&text).unwrap().part_count())
    });
}

fn bench_convert(c: &mut Criterion) {
    let text = load_fixture("page.mhtml");

    c.bench_function("convert_page_mhtml", |b| {
        b.iter(|| {
            let dom = mhtml2html::convert(text.as_str()).unwrap();
            mhtml2html::export::html::to_html(&dom).unwrap().len()
        })
    });
}

criterion_group!(benches, bench_parse, bench_convert);
criterion_main!(benches);
