use rand::Rng;
use tracing::{debug, warn};

use super::RoadGenerator;
use crate::geom::{self, Point};
use crate::terrain::Terrain;
use crate::turtle::Turtle;

/// Upper bound on headings tried when seeding, whatever the configured step.
const MAX_HEADING_SAMPLES: usize = 3600;

impl<T: Terrain, R: Rng> RoadGenerator<T, R> {
    /// Place the first highway turtle, or `None` if no dry start was found.
    pub(super) fn seed(&mut self) -> Option<Turtle> {
        let start = match self.cfg.start {
            Some([x, y]) => Point::new(x, y),
            None => self.random_start()?,
        };
        let heading = self.initial_heading(start);
        self.stats.seeded = true;
        self.stats.start = Some([start.x, start.y]);
        debug!(x = start.x, y = start.y, hx = heading.x, hy = heading.y, "seeded highway");
        Some(Turtle::highway(start, heading))
    }

    /// Random point within 1–10 % of a city corner, re-rolled while wet.
    fn random_start(&mut self) -> Option<Point> {
        let (w, h) = (self.cfg.city_width, self.cfg.city_height);
        for _ in 0..self.cfg.start_attempts {
            let mut x = self.rng.gen::<f64>() * 0.09 * w + 0.01 * w;
            let mut y = self.rng.gen::<f64>() * 0.09 * h + 0.01 * h;
            if self.rng.gen_bool(0.5) {
                x += 0.9 * w;
            }
            if self.rng.gen_bool(0.5) {
                y += 0.9 * h;
            }
            let p = Point::new(x, y);
            if self.dry(p) {
                return Some(p);
            }
        }
        warn!(
            attempts = self.cfg.start_attempts,
            "no dry start position found; network stays empty"
        );
        None
    }

    /// Heading with the most population one cell ahead, pulled toward the
    /// center when it points more than 90° away from it.
    pub(super) fn initial_heading(&self, start: Point) -> Point {
        let probe = self.index.cell_width();
        let step = self.cfg.seed_heading_step_deg;
        let samples = ((360.0 / step).ceil() as usize).clamp(1, MAX_HEADING_SAMPLES);
        let mut best = (geom::heading_deg(0.0), -1.0);
        for k in 0..samples {
            let deg = k as f64 * step;
            if deg >= 360.0 {
                break;
            }
            let dir = geom::heading_deg(deg);
            let ahead = start + dir * probe;
            let weight = if self.dry(ahead) {
                self.terrain.population(ahead)
            } else {
                0.0
            };
            if weight > best.1 {
                best = (dir, weight);
            }
        }
        let candidate = best.0;
        match geom::direction(start, self.index.center()) {
            Some(to_center) if geom::angle_between_deg(candidate, to_center) > 90.0 => to_center,
            _ => candidate,
        }
    }
}
