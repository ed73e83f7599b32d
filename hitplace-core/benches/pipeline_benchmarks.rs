/// Benchmarks for the per-frame placement and sampling paths
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use glam::Vec3;
use hitplace_core::export::samples_to_csv;
use hitplace_core::sim::{run_scenario, FailurePlan, Scenario, ScriptedTracker, SurfaceSpan};
use hitplace_core::{
    GltfModelProvider, HitplaceConfig, MetricSample, MetricSampler, PlacementConfig,
    PlacementPipeline, SamplerConfig,
};

fn tracking_pipeline() -> (PlacementPipeline, ScriptedTracker) {
    let surface = SurfaceSpan {
        from_ms: 0,
        to_ms: 1_000,
        position: Vec3::new(0.0, -1.2, -1.0),
        yaw_degrees: 30.0,
    };
    let mut tracker = ScriptedTracker::new(vec![surface], FailurePlan::default());
    let mut pipeline = PlacementPipeline::new(&PlacementConfig::default());

    pipeline.on_session_start(&mut tracker);
    while !pipeline.handshake().is_ready() {
        for (request, outcome) in tracker.drain_completions() {
            pipeline.resolve(&mut tracker, request, outcome);
        }
    }
    (pipeline, tracker)
}

fn benchmark_frame_update(c: &mut Criterion) {
    let (mut pipeline, tracker) = tracking_pipeline();

    let hit_frame = tracker.frame_at(500);
    c.bench_function("pipeline_update_hit", |b| {
        b.iter(|| black_box(pipeline.update(black_box(&hit_frame))))
    });

    let empty_frame = tracker.frame_at(5_000);
    c.bench_function("pipeline_update_no_hit", |b| {
        b.iter(|| black_box(pipeline.update(black_box(&empty_frame))))
    });
}

fn benchmark_sampler(c: &mut Criterion) {
    c.bench_function("sampler_tick_60fps_window", |b| {
        b.iter(|| {
            let mut sampler = MetricSampler::new(SamplerConfig::default());
            sampler.start_measurement(0);
            let mut now = 0;
            while now < 40_000 {
                sampler.tick(black_box(now));
                now += 16;
            }
            black_box(sampler.samples().len())
        })
    });

    let samples: Vec<MetricSample> = (0..30)
        .map(|i| MetricSample {
            timestamp: 1_700_000_005_000 + i * 1_000,
            fps: 55 + (i % 7) as u32,
        })
        .collect();
    c.bench_function("samples_to_csv_30", |b| {
        b.iter(|| black_box(samples_to_csv(black_box(&samples))))
    });
}

fn benchmark_demo_replay(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let scenario = Scenario::demo();
    let config = HitplaceConfig::default();

    let mut group = c.benchmark_group("replay");
    group.sample_size(10);
    group.bench_function("demo_scenario", |b| {
        b.iter(|| {
            runtime
                .block_on(run_scenario(&scenario, &config, &GltfModelProvider))
                .map(|report| report.frames)
        })
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_frame_update,
    benchmark_sampler,
    benchmark_demo_replay
);
criterion_main!(benches);
