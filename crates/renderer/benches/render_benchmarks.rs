//! Benchmarks for the renderer crate - colorization and frame composition.
//!
//! Run with: cargo bench --package renderer --bench render_benchmarks

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use geo_common::DatasetKind;
use raster_cache::{RasterLayer, SampleType};
use renderer::gradient::colorize;
use renderer::{
    AnimationRenderer, Color, ColorMap, FrameRenderer, Normalization, RenderConfig,
    TimeSeriesFrame, Timeline, ValueRange,
};
use test_utils::{create_population_grid, create_precipitation_grid};

fn bench_colorize(c: &mut Criterion) {
    let mut group = c.benchmark_group("colorize");
    for size in [128usize, 512, 1024] {
        let data = create_precipitation_grid(size, size, 7);
        let norm = Normalization::for_kind(DatasetKind::Precipitation, ValueRange::new(0.0, 400.0));
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| {
                colorize(
                    black_box(data),
                    size,
                    &norm,
                    ColorMap::Blues,
                    Color::WHITE,
                    |v| v.is_finite(),
                )
            })
        });
    }
    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let data = create_population_grid(240, 290, 5000.0);
    let layer = RasterLayer::new("Gridded_Population_Density_Data", 2015, 240, 290, data, SampleType::F32)
        .expect("valid layer");
    let norm = Normalization::for_kind(DatasetKind::PopulationDensity, ValueRange::new(1.0, 5000.0));
    let renderer = FrameRenderer::new(1000, 800);

    c.bench_function("frame_1000x800", |b| {
        b.iter(|| {
            renderer.render(
                black_box(&layer),
                &norm,
                ColorMap::Viridis,
                "Population Density in Assaba - 2015",
                "Population Density",
            )
        })
    });
}

fn bench_animation(c: &mut Criterion) {
    let mut timeline = Timeline::new("Climate_Precipitation_Data", "Assaba");
    for year in 2010..2015 {
        let data = create_precipitation_grid(120, 145, year as u32);
        let layer = RasterLayer::new("Climate_Precipitation_Data", year, 120, 145, data, SampleType::F32)
            .expect("valid layer");
        timeline.push(TimeSeriesFrame::from_layer("Assaba", Arc::new(layer)));
    }
    let config = RenderConfig {
        frame_width: 400,
        frame_height: 320,
        ..RenderConfig::default()
    };
    let renderer = AnimationRenderer::new(config).expect("valid config");

    let mut group = c.benchmark_group("animation");
    group.sample_size(10);
    group.bench_function("five_frames_400x320", |b| {
        b.iter(|| renderer.render(black_box(&timeline), DatasetKind::Precipitation))
    });
    group.finish();
}

criterion_group!(benches, bench_colorize, bench_frame, bench_animation);
criterion_main!(benches);
