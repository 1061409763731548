// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

#![allow(clippy::uninlined_format_args)] // Bench code readability over pedantic

//! Wire codec and cache throughput.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use mint_interop::codec::{decode, decode_with_extra, encode, encode_with_extra};
use mint_interop::{
    BoundingBoxCorners, DatasetRenderConfiguration, LatestValueCache, Mat4, Vec4,
};

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    let bbox = BoundingBoxCorners {
        min: Vec4::new(-1.0, -1.0, -1.0, 1.0),
        max: Vec4::new(1.0, 1.0, 1.0, 1.0),
    };
    group.bench_function("bounding_box", |b| b.iter(|| encode(black_box(&bbox))));
    group.bench_function("bounding_box_with_timestamp", |b| {
        b.iter(|| encode_with_extra(black_box(&bbox), Some(("timestamp", "1700000000000000000"))))
    });
    group.bench_function("mat4", |b| b.iter(|| encode(black_box(&Mat4::IDENTITY))));

    let config = DatasetRenderConfiguration::default();
    group.bench_function("render_configuration", |b| {
        b.iter(|| encode(black_box(&config)))
    });

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    let config = encode(&DatasetRenderConfiguration::default()).expect("encode");
    group.bench_function("render_configuration", |b| {
        b.iter(|| decode::<DatasetRenderConfiguration>(black_box(&config)))
    });

    let bbox = encode_with_extra(
        &BoundingBoxCorners::default(),
        Some(("timestamp", "1700000000000000000")),
    )
    .expect("encode");
    group.bench_function("bounding_box_with_timestamp", |b| {
        b.iter(|| decode_with_extra::<BoundingBoxCorners>(black_box(&bbox), "timestamp"))
    });

    group.finish();
}

fn bench_cache(c: &mut Criterion) {
    let cache = LatestValueCache::new();
    let payload = encode(&DatasetRenderConfiguration::default()).expect("encode");
    for i in 0..16 {
        cache.store(format!("topic{}", i), payload.clone());
    }

    c.bench_function("cache_store_get", |b| {
        b.iter(|| {
            cache.store("topic7".to_string(), black_box(payload.clone()));
            cache.get(black_box("topic7"))
        })
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_cache);
criterion_main!(benches);
