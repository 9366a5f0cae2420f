use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use tlwall::prelude::*;

fn build_wall(points: usize) -> TlWall {
    let copper = Layer::conductor(Thickness::finite(1.0e-3).expect("thickness"), 5.96e7)
        .expect("copper layer");
    let steel = Layer::conductor(Thickness::Infinite, 1.45e6).expect("steel layer");
    let chamber = Chamber::circular(0.022, 1.0)
        .expect("chamber")
        .with_layers(vec![copper, steel], Boundary::Vacuum);
    let beam = Beam::from_gamma(7460.52).expect("beam");
    let freqs = FrequencyGrid::logspace(1.0e3, 1.0e9, points).expect("grid");
    TlWall::new(chamber, beam, freqs).expect("engine")
}

fn bench_wall_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("wall_sweep");
    for points in [100usize, 1_000, 10_000] {
        group.bench_function(BenchmarkId::new("two_layer_zlong", points), |b| {
            b.iter_batched(
                || build_wall(points),
                |wall| {
                    let _ = wall.zlong().expect("ZLong");
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_wall_sweep);
criterion_main!(benches);
