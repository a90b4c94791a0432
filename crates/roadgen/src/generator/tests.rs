use super::grid::grid_axes;
use super::highway::fan_offsets;
use super::*;
use crate::geom::{self, Point};
use crate::network::{Edge, RoadKind};
use crate::terrain::{FlatTerrain, RasterError};
use nalgebra::vector;
use rand::rngs::mock::StepRng;

fn dry_land() -> FlatTerrain {
    FlatTerrain::new(100.0, 50.0)
}

fn locked(x: f64, y: f64) -> GenCfg {
    GenCfg {
        start: Some([x, y]),
        ..GenCfg::default()
    }
}

/// Water band `x ∈ [x0, x1)` across an otherwise dry, empty map.
struct River {
    x0: f64,
    x1: f64,
}

impl Terrain for River {
    fn elevation(&self, p: Point) -> f64 {
        if p.x >= self.x0 && p.x < self.x1 {
            0.0
        } else {
            100.0
        }
    }

    fn population(&self, _p: Point) -> f64 {
        10.0
    }
}

/// Dense population only farther than 40 units from `y = 100`.
struct Bands;

impl Terrain for Bands {
    fn elevation(&self, _p: Point) -> f64 {
        100.0
    }

    fn population(&self, p: Point) -> f64 {
        if (p.y - 100.0).abs() > 40.0 {
            200.0
        } else {
            0.0
        }
    }
}

fn noisy_raster(seed: u64) -> Raster {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    let mut rng = StdRng::seed_from_u64(seed);
    Raster::from_fn(64, 64, 512.0, 512.0, |_| (rng.gen(), rng.gen_range(0..=80)))
        .expect("valid raster")
}

fn street(a: Point, b: Point) -> Edge {
    Edge::new(a, b, RoadKind::Street)
}

fn close(a: Point, b: Point) -> bool {
    (a - b).norm() < 1e-9
}

// ---------- construction ----------

#[test]
fn malformed_config_fails_at_construction() {
    let mut cfg = GenCfg::default();
    cfg.highway.search_radius = 0.0;
    match RoadGenerator::new(cfg, dry_land()) {
        Err(GenError::Config(_)) => {}
        other => panic!("expected config error, got {:?}", other.err()),
    }
    let mut cfg = GenCfg::default();
    cfg.city_width = -1.0;
    assert!(RoadGenerator::new(cfg, dry_land()).is_err());
}

#[test]
fn missized_raster_fails_at_construction() {
    let err = RoadGenerator::from_rgba(GenCfg::default(), vec![0; 10], 2, 2)
        .err()
        .expect("buffer too small");
    assert_eq!(
        err,
        GenError::Raster(RasterError::SizeMismatch {
            expected: 16,
            actual: 10
        })
    );
    assert!(RoadGenerator::from_rgba(GenCfg::default(), vec![], 0, 0).is_err());
}

#[test]
fn terrain_extent_must_match_city() {
    let small = Raster::from_fn(8, 8, 256.0, 256.0, |_| (0, 200)).unwrap();
    match RoadGenerator::new(GenCfg::default(), small) {
        Err(GenError::TerrainMismatch { expected, actual }) => {
            assert_eq!(expected, (512.0, 512.0));
            assert_eq!(actual, (256.0, 256.0));
        }
        other => panic!("expected mismatch, got {:?}", other.err()),
    }
}

// ---------- end to end ----------

#[test]
fn flat_land_with_locked_start_grows_highways() {
    let mut g = RoadGenerator::new(locked(50.0, 256.0), dry_land()).unwrap();
    let net = g.generate();
    assert!(!net.highways.is_empty());
    assert!(net.stats.seeded);
    assert_eq!(net.stats.start, Some([50.0, 256.0]));
    // Uniform population: the first segment runs straight toward the center.
    let first = net.highways[0];
    assert!(close(first.endpoint1, vector![50.0, 256.0]));
    assert!(close(first.endpoint2, vector![150.0, 256.0]));
    assert_eq!(g.state(), GenState::Done);
}

#[test]
fn flat_land_fills_in_streets() {
    let mut cfg = locked(50.0, 256.0);
    cfg.grid.randomize = false;
    let mut g = RoadGenerator::new(cfg, dry_land()).unwrap();
    let net = g.generate();
    assert!(!net.streets.is_empty());
    assert!(net.stats.grid_seeds > 0);
    let idx = g.index();
    for e in &net.streets {
        assert!(!idx.out_of_bounds(e.endpoint1) && !idx.out_of_bounds(e.endpoint2));
        assert_eq!(e.kind, RoadKind::Street);
    }
}

#[test]
fn all_water_yields_no_highways() {
    let water = FlatTerrain::new(0.0, 50.0);

    let mut g = RoadGenerator::new(locked(50.0, 256.0), water).unwrap();
    let net = g.generate();
    assert!(net.highways.is_empty() && net.streets.is_empty());
    assert!(net.stats.rejected.submerged > 0);

    let mut g = RoadGenerator::new(GenCfg::default(), water).unwrap();
    let net = g.generate();
    assert!(net.is_empty());
    assert!(!net.stats.seeded);
    assert!(net.nodes.is_empty());
}

#[test]
fn accepted_edges_are_long_enough_and_start_inside() {
    for seed in 0..4 {
        let cfg = GenCfg {
            seed,
            ..GenCfg::default()
        };
        let mut g = RoadGenerator::new(cfg.clone(), noisy_raster(seed)).unwrap();
        let net = g.generate();
        for e in net.edges() {
            let min = match e.kind {
                RoadKind::Highway => cfg.highway.min_length,
                RoadKind::Street => cfg.grid.min_length,
            };
            assert!(e.length() > 0.0);
            assert!(e.length() >= min - 1e-9, "{e:?} shorter than {min}");
            assert!(!g.index().out_of_bounds(e.endpoint1));
            assert!(!e.id.is_pending());
        }
    }
}

#[test]
fn generation_halts_within_round_caps() {
    for seed in [3, 17, 99] {
        let mut cfg = GenCfg {
            seed,
            ..GenCfg::default()
        };
        cfg.highway.max_rounds = 12;
        cfg.grid.max_rounds = 8;
        let mut g = RoadGenerator::new(cfg.clone(), noisy_raster(seed + 1)).unwrap();
        let net = g.generate();
        assert!(net.stats.highway_rounds <= cfg.highway.max_rounds);
        assert!(net.stats.grid_rounds <= cfg.grid.max_rounds);
        assert_eq!(net.stats.highways, net.highways.len());
        assert_eq!(net.stats.streets, net.streets.len());
    }
}

#[test]
fn same_seed_same_network() {
    let run = || {
        let cfg = GenCfg {
            seed: 11,
            ..GenCfg::default()
        };
        RoadGenerator::new(cfg, noisy_raster(5)).unwrap().generate()
    };
    let a = run();
    let b = run();
    assert_eq!(a.highways, b.highways);
    assert_eq!(a.streets, b.streets);
    assert_eq!(a.stats, b.stats);
}

#[test]
fn fixed_sequence_rng_is_deterministic() {
    let run = || {
        let rng = StepRng::new(0, 0x9E37_79B9_7F4A_7C15);
        RoadGenerator::with_rng(locked(60.0, 60.0), dry_land(), rng)
            .unwrap()
            .generate()
    };
    let a = run();
    assert!(!a.highways.is_empty());
    assert_eq!(a.streets, run().streets);
}

#[test]
fn turtle_cap_bounds_population() {
    let mut cfg = locked(50.0, 256.0);
    cfg.max_turtles = 1;
    let mut g = RoadGenerator::new(cfg, dry_land()).unwrap();
    let net = g.generate();
    assert!(net.stats.dropped_turtles > 0);
}

#[test]
fn step_walks_phases_in_order() {
    let mut g = RoadGenerator::new(locked(50.0, 256.0), dry_land()).unwrap();
    assert_eq!(g.state(), GenState::Seeding);
    assert_eq!(g.step(), GenState::HighwayGrowth);
    assert_eq!(g.step(), GenState::GridSeeding);
    assert!(!g.network().highways.is_empty());
    assert_eq!(g.step(), GenState::GridGrowth);
    assert_eq!(g.step(), GenState::Done);
    assert_eq!(g.step(), GenState::Done);
}

// ---------- seeding and highways ----------

#[test]
fn initial_heading_turns_toward_center() {
    let g = RoadGenerator::new(GenCfg::default(), dry_land()).unwrap();
    // Uniform scores pick 0°, which points away from the center from here.
    let h = g.initial_heading(vector![400.0, 256.0]);
    assert!(close(h, vector![-1.0, 0.0]));
    let h = g.initial_heading(vector![20.0, 256.0]);
    assert!(close(h, vector![1.0, 0.0]));
}

#[test]
fn fan_is_straight_first_then_alternating() {
    let offs = fan_offsets(90.0, 8);
    assert_eq!(offs.len(), 9);
    assert_eq!(offs[0], 0.0);
    assert_eq!(offs[1], -11.25);
    assert_eq!(offs[2], 11.25);
    assert_eq!(offs[7], -45.0);
    assert_eq!(offs[8], 45.0);
}

#[test]
fn highway_forks_between_two_dense_bands() {
    let g = RoadGenerator::new(GenCfg::default(), Bands).unwrap();
    let mut t = Turtle::highway(vector![256.0, 100.0], vector![1.0, 0.0]);
    let scan = g.scan_fan(&t);
    assert_eq!(scan.best, -45.0);
    assert_eq!(scan.second, 45.0);

    let mut spawned = Vec::new();
    g.branch_highway(&mut t, &mut spawned);
    assert_eq!(spawned.len(), 1);
    assert!(close(spawned[0].orientation, geom::heading_deg(45.0)));
    assert!(close(t.orientation, geom::heading_deg(-45.0)));
    assert_eq!(t.rotation_accumulated, -45.0);
}

#[test]
fn forks_inherit_the_lineage_rotation() {
    let g = RoadGenerator::new(GenCfg::default(), Bands).unwrap();
    let mut t = Turtle::highway(vector![256.0, 100.0], vector![1.0, 0.0]);
    t.rotation_accumulated = 120.0;
    let mut spawned = Vec::new();
    g.branch_highway(&mut t, &mut spawned);
    assert_eq!(spawned.len(), 1);
    // 120 + 45 would pass the 150 cap, so the fork keeps the parent's course.
    assert_eq!(spawned[0].rotation_accumulated, 120.0);
    assert!(close(spawned[0].orientation, vector![1.0, 0.0]));
    assert_eq!(t.rotation_accumulated, 75.0);
}

#[test]
fn tiny_heading_step_still_halts() {
    let mut cfg = locked(50.0, 256.0);
    cfg.seed_heading_step_deg = 1e-300;
    cfg.validate().unwrap();
    let mut g = RoadGenerator::new(cfg, dry_land()).unwrap();
    let net = g.generate();
    assert_eq!(g.state(), GenState::Done);
    assert!(close(net.highways[0].endpoint2, vector![150.0, 256.0]));
}

#[test]
fn uniform_fan_keeps_course_without_forking() {
    let g = RoadGenerator::new(GenCfg::default(), dry_land()).unwrap();
    let mut t = Turtle::highway(vector![100.0, 256.0], vector![1.0, 0.0]);
    let mut spawned = Vec::new();
    g.branch_highway(&mut t, &mut spawned);
    assert!(spawned.is_empty());
    assert!(close(t.orientation, vector![1.0, 0.0]));
}

// ---------- grid ----------

#[test]
fn grid_axes_prefer_global_orientation() {
    let (p, c) = grid_axes(vector![1.0, 0.0], 0.0, 45.0);
    assert!(close(p, vector![0.0, 1.0]) && close(c, vector![1.0, 0.0]));

    let (p, c) = grid_axes(geom::heading_deg(60.0), 0.0, 45.0);
    assert!(close(p, vector![1.0, 0.0]) && close(c, vector![0.0, 1.0]));

    let dir = geom::heading_deg(45.0);
    let (p, c) = grid_axes(dir, 0.0, 30.0);
    assert!(close(p, geom::perpendicular(dir)) && close(c, dir));
}

// ---------- repair ----------

#[test]
fn streets_walk_back_into_city() {
    let g = RoadGenerator::new(GenCfg::default(), dry_land()).unwrap();
    let e = g
        .fix_bounds(street(vector![500.0, 10.0], vector![540.0, 10.0]))
        .unwrap();
    assert!(close(e.endpoint2, vector![510.0, 10.0]));
    assert_eq!(
        g.fix_bounds(street(vector![511.0, 10.0], vector![611.0, 10.0])),
        Err(Rejection::OutOfBounds)
    );
    assert_eq!(
        g.fix_bounds(street(vector![-1.0, 10.0], vector![20.0, 10.0])),
        Err(Rejection::OutOfBounds)
    );
}

#[test]
fn highways_may_leave_the_map() {
    let g = RoadGenerator::new(GenCfg::default(), dry_land()).unwrap();
    let hw = Edge::new(vector![480.0, 10.0], vector![580.0, 10.0], RoadKind::Highway);
    let e = g.fix_bounds(hw).unwrap();
    assert_eq!(e.endpoint2, hw.endpoint2);
    assert!(!e.expandable);
}

#[test]
fn highways_bridge_narrow_water() {
    let g = RoadGenerator::new(GenCfg::default(), River { x0: 200.0, x1: 260.0 }).unwrap();
    let hw = Edge::new(vector![150.0, 256.0], vector![250.0, 256.0], RoadKind::Highway);
    let e = g.fix_water(hw).unwrap();
    assert!(close(e.endpoint2, vector![300.0, 256.0]));
}

#[test]
fn bridging_with_tiny_segments_and_huge_reach_halts() {
    let mut cfg = locked(150.0, 256.0);
    cfg.highway.segment_length = 1e-12;
    cfg.highway.max_length = 1e300;
    let river = || River { x0: 200.0, x1: 260.0 };
    let g = RoadGenerator::new(cfg.clone(), river()).unwrap();
    let hw = Edge::new(vector![150.0, 256.0], vector![250.0, 256.0], RoadKind::Highway);
    let e = g.fix_water(hw).unwrap();
    assert!(e.endpoint2.x >= 260.0 && e.endpoint2.x < 261.0);

    let mut g = RoadGenerator::new(cfg, river()).unwrap();
    g.generate();
    assert_eq!(g.state(), GenState::Done);
}

#[test]
fn highways_retreat_from_wide_water() {
    let mut cfg = GenCfg::default();
    cfg.highway.max_length = 100.0;
    let g = RoadGenerator::new(cfg, River { x0: 200.0, x1: 260.0 }).unwrap();
    let hw = Edge::new(vector![150.0, 256.0], vector![250.0, 256.0], RoadKind::Highway);
    let e = g.fix_water(hw).unwrap();
    assert!((e.endpoint2.x - 190.0).abs() < 1e-9);
}

#[test]
fn streets_stop_short_of_water() {
    let g = RoadGenerator::new(GenCfg::default(), River { x0: 200.0, x1: 260.0 }).unwrap();
    let e = g
        .fix_water(street(vector![180.0, 256.0], vector![220.0, 256.0]))
        .unwrap();
    assert!((e.endpoint2.x - 196.0).abs() < 1e-9);
    assert_eq!(
        g.fix_water(street(vector![210.0, 256.0], vector![250.0, 256.0])),
        Err(Rejection::Submerged)
    );
}

/// Generator with one committed street `(100,50)–(100,150)`.
fn with_vertical_street() -> RoadGenerator<FlatTerrain> {
    let mut g = RoadGenerator::new(GenCfg::default(), dry_land()).unwrap();
    g.commit(street(vector![100.0, 50.0], vector![100.0, 150.0]))
        .unwrap();
    g
}

#[test]
fn crossing_truncates_at_nearest_intersection() {
    let g = with_vertical_street();
    let e = g
        .fix_nearby(street(vector![50.0, 100.0], vector![150.0, 100.0]))
        .unwrap();
    assert!(close(e.endpoint2, vector![100.0, 100.0]));
    assert!(!e.expandable);
}

#[test]
fn superimposed_roads_are_rejected() {
    let g = with_vertical_street();
    assert_eq!(
        g.fix_nearby(street(vector![100.0, 60.0], vector![100.0, 200.0])),
        Err(Rejection::Overlapping)
    );
    // Continuing from the end is only a touch at the start.
    assert!(g
        .fix_nearby(street(vector![100.0, 150.0], vector![100.0, 190.0]))
        .is_ok());
}

#[test]
fn far_end_snaps_to_nearby_node() {
    let g = with_vertical_street();
    let e = g
        .fix_nearby(street(vector![60.0, 150.0], vector![95.0, 150.0]))
        .unwrap();
    assert_eq!(e.endpoint2, vector![100.0, 150.0]);
    assert!(!e.expandable);
}

#[test]
fn truncation_below_minimum_is_rejected() {
    let g = with_vertical_street();
    assert_eq!(
        g.fix_nearby(street(vector![97.0, 100.0], vector![103.0, 100.0])),
        Err(Rejection::TooShort)
    );
}

#[test]
fn dangling_end_extends_to_network() {
    let g = with_vertical_street();
    let e = g
        .repair(street(vector![60.0, 120.0], vector![90.0, 120.0]))
        .unwrap();
    assert!(close(e.endpoint2, vector![100.0, 120.0]));
    assert!(!e.expandable);

    let lone = street(vector![60.0, 300.0], vector![90.0, 300.0]);
    assert_eq!(g.repair(lone).unwrap(), lone);
}

#[test]
fn commit_registers_edge_and_endpoints() {
    let mut g = with_vertical_street();
    let id = g
        .commit(Edge::new(vector![10.0, 10.0], vector![60.0, 10.0], RoadKind::Highway))
        .unwrap();
    assert_eq!(g.index().edge(id).kind, RoadKind::Highway);
    assert_eq!(g.index().nodes().len(), 4);
    assert_eq!(g.stats().highways, 1);
    assert_eq!(g.stats().streets, 1);
    let off_map = street(vector![600.0, 600.0], vector![700.0, 700.0]);
    assert_eq!(g.commit(off_map), Err(Rejection::Unindexed));
}
