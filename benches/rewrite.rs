//! Performance benchmarks for tree construction and rule application.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use json_sift::{Rewrite, SampleOp};
use serde_json::{json, Value};

/// Generate a flat struct with N fields.
fn generate_flat_doc(num_fields: usize) -> Value {
    let mut obj = serde_json::Map::new();
    for i in 0..num_fields {
        obj.insert(format!("field_{}", i), json!(i));
    }
    json!(obj)
}

/// Generate a deeply nested struct.
fn generate_nested_doc(depth: usize) -> Value {
    let mut current = json!({"value": 42});
    for i in (0..depth).rev() {
        let mut obj = serde_json::Map::new();
        obj.insert(format!("level_{}", i), current);
        current = json!(obj);
    }
    current
}

fn bench_build_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_and_render");
    for size in [10, 100, 1000] {
        let doc = generate_flat_doc(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &doc, |b, doc| {
            b.iter(|| {
                let outcome = Rewrite::from_value(black_box(doc.clone())).mode("over").run();
                black_box(outcome.to_value())
            })
        });
    }
    group.finish();
}

fn bench_exclude_rules(c: &mut Criterion) {
    let mut group = c.benchmark_group("exclude_rules");
    for size in [10, 100] {
        let doc = generate_flat_doc(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &doc, |b, doc| {
            b.iter(|| {
                let mut rewrite = Rewrite::from_value(black_box(doc.clone())).mode("over");
                for i in (0..size).step_by(2) {
                    rewrite = rewrite.exclude(format!("field_{}", i));
                }
                black_box(rewrite.run().to_value())
            })
        });
    }
    group.finish();
}

fn bench_deep_keep_cascade(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_keep_cascade");
    for depth in [8, 64] {
        let doc = generate_nested_doc(depth);
        let path = (0..depth)
            .map(|i| format!("level_{}", i))
            .collect::<Vec<_>>()
            .join(".")
            + ".value";
        group.bench_with_input(
            BenchmarkId::from_parameter(depth),
            &(doc, path),
            |b, (doc, path)| {
                b.iter(|| {
                    let outcome = Rewrite::from_value(black_box(doc.clone()))
                        .include(path.as_str())
                        .run();
                    black_box(outcome.to_value())
                })
            },
        );
    }
    group.finish();
}

fn bench_wildcard_replace(c: &mut Criterion) {
    let doc = json!({
        "exports": {
            ".": {"import": "./dist/index.js", "types": "./dist/index.d.ts"},
            "util": {"import": "./dist/util.js", "types": "./dist/util.d.ts"}
        }
    });
    c.bench_function("wildcard_replace", |b| {
        b.iter(|| {
            let outcome = Rewrite::from_value(black_box(doc.clone()))
                .mode("over")
                .sample(
                    "exports.*.*",
                    SampleOp::modifier(|value, _, _| {
                        let text = value.as_str().unwrap_or_default();
                        Ok(json_sift::ModifierOutcome::replace(text.replace("dist/", "")))
                    }),
                )
                .run();
            black_box(outcome.to_value())
        })
    });
}

criterion_group!(
    benches,
    bench_build_and_render,
    bench_exclude_rules,
    bench_deep_keep_cascade,
    bench_wildcard_replace
);
criterion_main!(benches);
