// Chunk: docs/chunks/line_tracker_tree - Differential AVL line tracker

//! Line tracker benchmark: offset→line lookups and edits on large documents.
//!
//! Target: lookups and single-char edits stay flat as the line count grows.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lite_text_buffer::{Document, LineTracker, ListLineTracker, TreeLineTracker};

fn content(lines: usize) -> String {
    (0..lines).map(|i| format!("line number {i}\n")).collect()
}

fn line_of_offset(c: &mut Criterion) {
    let mut group = c.benchmark_group("line_of_offset");
    for lines in [1_000, 100_000] {
        let mut tree = TreeLineTracker::new();
        tree.set(&content(lines));
        let len = tree.len();
        group.bench_with_input(BenchmarkId::new("tree", lines), &len, |b, &len| {
            let mut offset = 0;
            b.iter(|| {
                offset = (offset + 7919) % len;
                black_box(tree.line_number_of_offset(black_box(offset)))
            })
        });
    }
    group.finish();
}

fn insert_line_break(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_line_break");
    for lines in [1_000, 20_000] {
        let text = content(lines);

        group.bench_with_input(BenchmarkId::new("tree", lines), &text, |b, text| {
            let mut tracker = TreeLineTracker::new();
            tracker.set(text);
            b.iter(|| {
                tracker.replace(black_box(5), 0, "\n").ok();
                tracker.replace(black_box(5), 1, "").ok();
            })
        });

        group.bench_with_input(BenchmarkId::new("list", lines), &text, |b, text| {
            let mut tracker = ListLineTracker::new();
            tracker.set(text);
            b.iter(|| {
                tracker.replace(black_box(5), 0, "\n").ok();
                tracker.replace(black_box(5), 1, "").ok();
            })
        });
    }
    group.finish();
}

fn document_typing(c: &mut Criterion) {
    c.bench_function("document_type_in_middle", |b| {
        let mut doc = Document::from_str(&content(10_000));
        let middle = doc.len() / 2;
        b.iter(|| {
            doc.replace(black_box(middle), 0, "x").ok();
            doc.replace(black_box(middle), 1, "").ok();
        })
    });
}

criterion_group!(benches, line_of_offset, insert_line_break, document_typing);
criterion_main!(benches);
