//! Timing and size probe for one generation run.
//!
//! Builds a 512 × 512 city with a radial population peak and a diagonal river,
//! runs the generator from a fixed corner start, and prints edge counts,
//! rejection totals and wall time.
//!
//! Run: cargo run -p roadgen --example flat_city --release

use std::time::Instant;

use roadgen::prelude::*;

fn main() {
    let cfg = GenCfg {
        seed: 42,
        start: Some([30.0, 30.0]),
        ..GenCfg::default()
    };
    let (w, h) = (cfg.city_width, cfg.city_height);
    let raster = Raster::from_fn(256, 256, w, h, |p| {
        let d = ((p.x - 0.5 * w).powi(2) + (p.y - 0.5 * h).powi(2)).sqrt();
        let population = (255.0 * (1.0 - d / (0.75 * w)).max(0.0)) as u8;
        // River along x + y = w with half-width 12.
        let river = ((p.x + p.y - w) / std::f64::consts::SQRT_2).abs() < 12.0;
        (population, if river { 0 } else { 180 })
    })
    .expect("raster matches city");

    let mut gen = RoadGenerator::new(cfg, raster).expect("default config is valid");
    let start = Instant::now();
    let net = gen.generate();
    let elapsed_ms = start.elapsed().as_secs_f64() * 1e3;

    println!(
        "highways={} streets={} nodes={} total_length={:.1}",
        net.highways.len(),
        net.streets.len(),
        net.nodes.len(),
        net.total_length()
    );
    println!(
        "rounds highway={} grid={} rejected={}",
        net.stats.highway_rounds,
        net.stats.grid_rounds,
        net.stats.rejected.total()
    );
    println!("generate_time_ms={elapsed_ms:.3}");
}
