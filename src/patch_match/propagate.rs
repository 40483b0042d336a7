//! Sequential propagation sweeps.

use super::distance::PatchDistance;
use super::CorrespondenceField;
use crate::patch::Point;

/// Raster sweep that offers each pixel its visited neighbours' matches,
/// shifted by the neighbour offset.
///
/// Forward sweeps go top-left to bottom-right and read the left then upper
/// neighbour; backward sweeps run in reverse and read the right then lower
/// neighbour. Pixels with zero distance are skipped. Candidates replace the
/// current match only when strictly better.
pub(crate) fn propagate(
    field: &mut CorrespondenceField,
    distance: &PatchDistance<'_>,
    forward: bool,
) {
    let (w, h) = (field.width, field.height);
    if w == 0 || h == 0 {
        return;
    }
    let step: i32 = if forward { 1 } else { -1 };

    for i in 0..h {
        let y = if forward { i } else { h - 1 - i };
        for j in 0..w {
            let x = if forward { j } else { w - 1 - j };
            let idx = y * w + x;
            if field.distances[idx] == 0.0 {
                continue;
            }
            let s = Point::new(x as i32, y as i32);

            let horizontal = if forward { x > 0 } else { x + 1 < w };
            if horizontal {
                let n = (idx as isize - step as isize) as usize;
                let candidate = field.targets[n].offset(step, 0);
                try_candidate(field, distance, idx, s, candidate);
            }
            let vertical = if forward { y > 0 } else { y + 1 < h };
            if vertical {
                let n = (idx as isize - step as isize * w as isize) as usize;
                let candidate = field.targets[n].offset(0, step);
                try_candidate(field, distance, idx, s, candidate);
            }
        }
    }
}

#[inline]
fn try_candidate(
    field: &mut CorrespondenceField,
    distance: &PatchDistance<'_>,
    idx: usize,
    s: Point,
    candidate: Point,
) {
    let d = distance.distance(s, candidate);
    if d < field.distances[idx] {
        field.distances[idx] = d;
        field.targets[idx] = candidate;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::Image;
    use crate::patch_match::Norm;

    fn pattern(w: usize, h: usize) -> Image<u8> {
        let data = (0..w * h)
            .map(|i| ((i % w) * 17 + (i / w) * 31) as u8 % 251)
            .collect();
        Image::new(data, w, h, 1).unwrap()
    }

    #[test]
    fn exact_match_spreads_forward() {
        let img = pattern(12, 12);
        let d = PatchDistance::new(&img, &img, None, 1, Norm::L1);
        let (seed, far) = (Point::new(2, 2), Point::new(9, 9));
        let targets: Vec<Point> = (0..144)
            .map(|i| if i == 2 * 12 + 2 { seed } else { far })
            .collect();
        let dists = (0..144)
            .map(|i| {
                let s = Point::new((i % 12) as i32, (i / 12) as i32);
                d.distance(s, targets[i])
            })
            .collect();
        let mut field = CorrespondenceField::new(12, 12, targets, dists).unwrap();

        propagate(&mut field, &d, true);

        for x in 2..11 {
            assert_eq!(field.target_at(x, 2), Point::new(x as i32, 2));
            assert_eq!(field.distance_at(x, 2), 0.0);
        }
        assert_eq!(field.target_at(2, 3), Point::new(2, 3));
    }

    #[test]
    fn worse_candidates_are_ignored() {
        let img = pattern(8, 8);
        let d = PatchDistance::new(&img, &img, None, 1, Norm::L2Sqr);
        let targets: Vec<Point> = (0..64)
            .map(|i| Point::new((i % 8) as i32, (i / 8) as i32))
            .collect();
        let (initial, dists) = (targets.clone(), vec![0.0; 64]);
        let mut field = CorrespondenceField::new(8, 8, initial, dists).unwrap();
        propagate(&mut field, &d, false);
        assert_eq!(field.targets(), &targets[..]);
    }
}
