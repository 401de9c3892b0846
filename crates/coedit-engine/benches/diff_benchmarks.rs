//! Benchmarks for diffing and the edit path

use coedit_engine::prelude::*;
use coedit_engine::{render_diff, word_diff};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use std::sync::Arc;
use tokio::runtime::Runtime;

fn prose(words: usize, seed: usize) -> String {
    (0..words)
        .map(|i| format!("word{}", (i * 7 + seed) % (words / 2 + 1)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn bench_word_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("word_diff");
    for size in [100, 1_000, 10_000] {
        let old = prose(size, 0);
        let new = prose(size, 3);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| word_diff(black_box(&old), black_box(&new)))
        });
    }
    group.finish();
}

fn bench_render_diff(c: &mut Criterion) {
    let old = (0..500)
        .map(|i| format!("line {i}"))
        .collect::<Vec<_>>()
        .join("\n");
    let new = old.replace("line 250", "line two hundred fifty");

    c.bench_function("render_diff_500_lines", |b| {
        b.iter(|| render_diff(black_box(&old), black_box(&new)))
    });
}

fn bench_apply_edit(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let engine = CollabEngine::new(Arc::new(InMemoryRepository::new()), EngineConfig::default())
        .unwrap();
    let doc = rt
        .block_on(engine.create_document("Bench", &prose(1_000, 0)))
        .unwrap();
    let caller = CallerIdentity::member("bench", "Bench");
    let mut counter = 0usize;

    c.bench_function("apply_edit_in_memory", |b| {
        b.to_async(&rt).iter(|| {
            counter += 1;
            let content = prose(1_000, counter);
            let engine = engine.clone();
            let id = doc.id.clone();
            let caller = caller.clone();
            async move {
                engine
                    .apply_edit(&id, &caller, EditRequest::content(content))
                    .await
                    .unwrap()
            }
        })
    });
}

criterion_group!(benches, bench_word_diff, bench_render_diff, bench_apply_edit);
criterion_main!(benches);
