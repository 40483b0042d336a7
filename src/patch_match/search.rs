//! Random initialization and exponential random search, one row at a time.
//!
//! Every row draws from its own generator seeded by `(seed, stream, row)`,
//! so rows can run in any order or in parallel with identical results.

use super::distance::PatchDistance;
use crate::patch::Point;
use crate::util::math::row_seed;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Stream id used by random initialization; search passes use `1..`.
pub(crate) const INIT_STREAM: u64 = 0;

pub(crate) fn row_rng(seed: u64, stream: u64, row: usize) -> StdRng {
    StdRng::seed_from_u64(row_seed(seed, stream, row))
}

/// Target centers eligible for random initialization.
///
/// Prefers centers whose full patch is inside and valid; falls back to every
/// in-bounds center when none qualifies.
pub(crate) fn init_pool(distance: &PatchDistance<'_>) -> Vec<Point> {
    let target = distance.target();
    let (w, h) = (target.width() as i32, target.height() as i32);
    let half = distance.half();

    let mut pool = Vec::new();
    for y in half..h - half {
        for x in half..w - half {
            let p = Point::new(x, y);
            if distance.is_valid_center(p) {
                pool.push(p);
            }
        }
    }
    if pool.is_empty() {
        pool = (0..h)
            .flat_map(|y| (0..w).map(move |x| Point::new(x, y)))
            .collect();
    }
    pool
}

/// Assigns a random pool entry to every pixel of row `y`.
pub(crate) fn init_row(
    y: usize,
    targets: &mut [Point],
    distances: &mut [f64],
    pool: &[Point],
    distance: &PatchDistance<'_>,
    seed: u64,
) {
    let mut rng = row_rng(seed, INIT_STREAM, y);
    for (x, (t, d)) in targets.iter_mut().zip(distances.iter_mut()).enumerate() {
        let p = pool[rng.random_range(0..pool.len())];
        *t = p;
        *d = distance.distance(Point::new(x as i32, y as i32), p);
    }
}

/// Recomputes the distances of row `y` for given matches.
pub(crate) fn score_row(
    y: usize,
    targets: &[Point],
    distances: &mut [f64],
    distance: &PatchDistance<'_>,
) {
    for (x, (t, d)) in targets.iter().zip(distances.iter_mut()).enumerate() {
        *d = distance.distance(Point::new(x as i32, y as i32), *t);
    }
}

/// Samples around each pixel's current match in windows shrinking by
/// `alpha` from `max_radius` while the radius stays above one.
#[allow(clippy::too_many_arguments)]
pub(crate) fn search_row(
    y: usize,
    targets: &mut [Point],
    distances: &mut [f64],
    distance: &PatchDistance<'_>,
    max_radius: f64,
    alpha: f64,
    seed: u64,
    pass: u64,
) {
    let target = distance.target();
    let (w, h) = (target.width() as i32, target.height() as i32);
    let mut rng = row_rng(seed, pass, y);

    for (x, (t, d)) in targets.iter_mut().zip(distances.iter_mut()).enumerate() {
        if *d == 0.0 {
            continue;
        }
        let s = Point::new(x as i32, y as i32);
        let mut k = 0;
        loop {
            let radius = (max_radius * alpha.powi(k)) as i32;
            if radius <= 1 {
                break;
            }
            k += 1;

            let x0 = (t.x - radius).clamp(0, w - 1);
            let x1 = (t.x + radius).clamp(0, w - 1);
            let y0 = (t.y - radius).clamp(0, h - 1);
            let y1 = (t.y + radius).clamp(0, h - 1);
            let candidate = Point::new(rng.random_range(x0..=x1), rng.random_range(y0..=y1));
            let cd = distance.distance(s, candidate);
            if cd < *d {
                *d = cd;
                *t = candidate;
            }
        }
    }
}
