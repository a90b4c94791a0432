//! Criterion benchmark for a full generation run on a synthetic raster.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};
use roadgen::prelude::*;

fn noisy_raster(seed: u64) -> Raster {
    let mut rng = StdRng::seed_from_u64(seed);
    Raster::from_fn(128, 128, 512.0, 512.0, |_| (rng.gen(), rng.gen_range(20..=255)))
        .expect("valid raster")
}

fn bench_generate(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate");
    group.sample_size(20);
    for &randomize in &[false, true] {
        group.bench_with_input(
            BenchmarkId::new("noisy_512", randomize),
            &randomize,
            |b, &randomize| {
                let raster = noisy_raster(7);
                let mut cfg = GenCfg {
                    seed: 3,
                    start: Some([40.0, 40.0]),
                    ..GenCfg::default()
                };
                cfg.grid.randomize = randomize;
                b.iter(|| {
                    let mut g = RoadGenerator::new(cfg.clone(), &raster).expect("valid config");
                    g.generate().streets.len()
                })
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_generate);
criterion_main!(benches);
