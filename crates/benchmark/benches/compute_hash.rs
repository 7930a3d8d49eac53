#![allow(missing_docs)]

use std::hint::black_box;

use datahasher::compute_hash;
use datahasher_benchmark::{create_person, create_team};

#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn bench_leaf(c: &mut criterion::Criterion) {
    let text = "hello world!".repeat(64);

    c.bench_function("leaf_string", |b| {
        b.iter(|| compute_hash(black_box(text.as_str())));
    });
}

fn bench_struct(c: &mut criterion::Criterion) {
    let person = create_person(37);

    c.bench_function("flat_struct", |b| {
        b.iter(|| compute_hash(black_box(&person)));
    });
}

fn bench_team(c: &mut criterion::Criterion) {
    let mut group = c.benchmark_group("nested_team");

    for size in [16, 256, 4096] {
        let team = create_team(size);
        group.bench_function(format!("members_{size}"), |b| {
            b.iter(|| compute_hash(black_box(&team)));
        });
    }

    group.finish();
}

criterion::criterion_group!(benches, bench_leaf, bench_struct, bench_team);
criterion::criterion_main!(benches);
