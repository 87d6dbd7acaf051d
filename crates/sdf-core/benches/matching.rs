use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use sdf_core::{find, parse, print, Schema, Value};

const GALLERY_SCHEMA: &str = r#"
    (schema {top-element (node-element {name "html" type "html-type"})} [
        (node-type {name "html-type" children (sequence [
            (node-element {name "head"})
            (node-element {name "body" type "body-type"})
        ])})

        (node-type {name "body-type" children (list (one-of [
            (node-element {name "p" type "p-type"})
            (node-element {name "img" type "img-type"})
        ]))})

        (node-type {name "p-type" children (literal-element {type "string"})})

        (node-type {name "img-type"} [
            (attribute {name "src" required true} (literal-element {type "string"}))
            (attribute {name "title" required false} (literal-element {type "string"}))
        ])
    ])
"#;

/// A flat gallery document with `entries` paragraph/image pairs.
fn gallery(entries: usize) -> String {
    let mut text = String::from("(html [(head) (body [\n");
    for i in 0..entries {
        text.push_str(&format!("(p \"caption number {i}\")\n"));
        text.push_str(&format!("(img {{src \"file{i}.png\" title \"image {i}\"}})\n"));
    }
    text.push_str("])])");
    text
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse");
    for entries in [10, 100, 1000] {
        let text = gallery(entries);
        group.bench_with_input(BenchmarkId::from_parameter(entries), &text, |b, text| {
            b.iter(|| std::hint::black_box(parse(text).unwrap()));
        });
    }
    group.finish();
}

fn bench_find(c: &mut Criterion) {
    let document = parse(&gallery(1000)).unwrap();
    let selectors = [
        ("absolute", "/html/body/img"),
        ("wildcard", "/+/img"),
        ("condition", "[@src$=\"9.png\"]"),
        ("kind", "^string"),
    ];

    let mut group = c.benchmark_group("find");
    for (name, selector) in selectors {
        group.bench_function(name, |b| {
            b.iter(|| std::hint::black_box(find(&document, selector).unwrap()));
        });
    }
    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let schema = Schema::parse(GALLERY_SCHEMA).unwrap();
    let mut group = c.benchmark_group("validate");
    for entries in [10, 100, 1000] {
        let document = parse(&gallery(entries)).unwrap();
        group.bench_with_input(
            BenchmarkId::from_parameter(entries),
            &document,
            |b, document: &Value| {
                b.iter(|| schema.validate(std::hint::black_box(document)).unwrap());
            },
        );
    }
    group.finish();
}

fn bench_print(c: &mut Criterion) {
    let document = parse(&gallery(1000)).unwrap();
    c.bench_function("print/1000", |b| {
        b.iter(|| std::hint::black_box(print(&document)));
    });
}

criterion_group!(benches, bench_parse, bench_find, bench_validate, bench_print);
criterion_main!(benches);
