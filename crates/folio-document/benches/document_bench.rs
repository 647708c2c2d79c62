// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the folio-document crate. Covers the per-image
// geometry chain and a small end-to-end batch conversion.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

use folio_core::types::{AspectRatio, FitMode, PaperSize, PaperTarget, Quality, TransformRequest, Upload};
use folio_document::{ImageProcessor, convert_batch};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width) as u8, (y * 255 / height) as u8, 96])
    })
}

fn png_bytes(img: &RgbImage) -> Vec<u8> {
    let mut out = Vec::new();
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)
        .expect("encode fixture");
    out
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Arbitrary-angle rotation, 16:9 padding, and an A4 fit on a 400x300 image.
fn bench_geometry_chain(c: &mut Criterion) {
    let source = gradient(400, 300);

    c.bench_function("geometry_chain (400x300, 30deg, 16:9 pad, A4)", |b| {
        b.iter(|| {
            let out = ImageProcessor::from_rgb(black_box(source.clone()))
                .rotate(30.0)
                .frame(
                    AspectRatio::Ratio {
                        width: 16,
                        height: 9,
                    },
                    FitMode::Pad,
                )
                .fit_paper(PaperTarget::Paper(PaperSize::A4), FitMode::Pad);
            black_box(out.into_rgb());
        });
    });
}

/// Three PNG uploads through the whole pipeline at quality 70.
fn bench_convert_batch(c: &mut Criterion) {
    let uploads: Vec<Upload> = (0..3)
        .map(|i| Upload::new(format!("page-{i}.png"), png_bytes(&gradient(200, 150))))
        .collect();
    let request = TransformRequest {
        order: "page-2.png,page-0.png".into(),
        quality: Quality::clamped(70),
        ..Default::default()
    };

    c.bench_function("convert_batch (3 x 200x150, q70)", |b| {
        b.iter(|| {
            let artifact = convert_batch(black_box(&uploads), &request).expect("convert");
            black_box(artifact.bytes.len());
        });
    });
}

criterion_group!(benches, bench_geometry_chain, bench_convert_batch);
criterion_main!(benches);
