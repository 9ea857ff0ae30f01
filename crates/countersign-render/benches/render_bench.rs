// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the rendering pipeline: segment planning, canvas
// slicing, and a full raster composition of a mid-sized preview.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgb, RgbImage};

use countersign_render::{
    CapturedPreview, FooterSpec, PageLayout, RasterProducer, compose_document, plan_segments,
    slice,
};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Benchmark the pure planning arithmetic across a spread of canvas heights.
fn bench_plan_segments(c: &mut Criterion) {
    let layout = PageLayout::a4();

    c.bench_function("plan_segments (5 heights)", |b| {
        b.iter(|| {
            for height in [120.0, 260.0, 650.0, 1300.0, 5200.0] {
                black_box(plan_segments(black_box(height), &layout));
            }
        });
    });
}

/// Benchmark slicing a 1000x4000 canvas into page segments.
fn bench_slice_canvas(c: &mut Criterion) {
    let layout = PageLayout::a4();
    let canvas = RgbImage::from_pixel(1000, 4000, Rgb([235, 235, 235]));

    c.bench_function("slice (1000x4000)", |b| {
        b.iter(|| {
            black_box(slice(black_box(&canvas), &layout));
        });
    });
}

/// Benchmark a full raster composition: slice, embed, footer, serialise.
/// Uses an 800x2600 preview (two pages) to keep iteration times sane.
fn bench_compose_raster(c: &mut Criterion) {
    let layout = PageLayout::a4();
    let footer = FooterSpec::new("Countersign", "22 August 2026");
    let canvas = RgbImage::from_pixel(800, 2600, Rgb([245, 245, 245]));

    c.bench_function("compose_document raster (800x2600)", |b| {
        b.iter(|| {
            let preview = CapturedPreview {
                image: canvas.clone(),
                scale: 2.0,
            };
            let mut producer = RasterProducer::new(preview);
            let bytes = compose_document(
                "Benchmark Contract",
                &mut producer,
                &layout,
                None,
                &footer,
            )
            .expect("compose");
            black_box(bytes);
        });
    });
}

criterion_group!(
    benches,
    bench_plan_segments,
    bench_slice_canvas,
    bench_compose_raster
);
criterion_main!(benches);
