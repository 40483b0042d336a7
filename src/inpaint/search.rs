//! Source-patch search for the greedy inpainter.

use crate::image::{Image, Mask};
use crate::patch::Point;

/// One source-patch query: the target patch content and its known pixels.
pub(crate) struct SourceQuery<'a> {
    pub image: &'a Image<u8>,
    /// Eligible source centers.
    pub source_region: &'a Mask,
    /// Center of the target patch.
    pub target: Point,
    /// Known pixels of the target patch, `(2 * half + 1)` square.
    pub known: &'a Mask,
    pub half: usize,
    /// Accepted top-left anchors from the candidate filter, if any.
    pub candidates: Option<&'a Mask>,
}

impl SourceQuery<'_> {
    /// L1 difference over known pixels, abandoned once it reaches `bound`.
    fn patch_error(&self, cx: usize, cy: usize, bound: u64) -> Option<u64> {
        let side = 2 * self.half + 1;
        let c = self.image.channels();
        let tx0 = self.target.x as usize - self.half;
        let ty0 = self.target.y as usize - self.half;
        let (sx0, sy0) = (cx - self.half, cy - self.half);

        let mut err = 0u64;
        for dy in 0..side {
            let known = self.known.row(dy);
            let t_row = &self.image.row(ty0 + dy)[tx0 * c..(tx0 + side) * c];
            let s_row = &self.image.row(sy0 + dy)[sx0 * c..(sx0 + side) * c];
            for dx in 0..side {
                if known[dx] == 0 {
                    continue;
                }
                let t = &t_row[dx * c..dx * c + c];
                let s = &s_row[dx * c..dx * c + c];
                for (a, b) in t.iter().zip(s) {
                    err += u64::from(a.abs_diff(*b));
                }
            }
            if err >= bound {
                return None;
            }
        }
        Some(err)
    }

    fn eligible(&self, x: usize, y: usize) -> bool {
        if self.source_region.at(x, y) == 0 {
            return false;
        }
        match self.candidates {
            Some(cands) => cands.at(x - self.half, y - self.half) != 0,
            None => true,
        }
    }

    /// Best center in row `y`, as `(error, x)`.
    fn scan_row(&self, y: usize) -> Option<(u64, usize)> {
        let w = self.image.width();
        let mut best: Option<(u64, usize)> = None;
        for x in self.half..w - self.half {
            if !self.eligible(x, y) {
                continue;
            }
            let bound = best.map_or(u64::MAX, |(e, _)| e);
            if let Some(err) = self.patch_error(x, y, bound) {
                best = Some((err, x));
            }
        }
        best
    }

    fn rows(&self) -> std::ops::Range<usize> {
        self.half..self.image.height() - self.half
    }

    /// Returns the eligible center with the smallest error, first in raster
    /// order on ties.
    pub(crate) fn best_source(&self) -> Option<Point> {
        let mut best: Option<(u64, Point)> = None;
        for y in self.rows() {
            if let Some((err, x)) = self.scan_row(y) {
                if improves(&best, err) {
                    best = Some((err, Point::new(x as i32, y as i32)));
                }
            }
        }
        best.map(|(_, p)| p)
    }

    /// Row-parallel [`best_source`](Self::best_source) with identical results.
    #[cfg(feature = "rayon")]
    pub(crate) fn best_source_par(&self) -> Option<Point> {
        use rayon::prelude::*;

        let rows: Vec<Option<(u64, usize)>> = self
            .rows()
            .into_par_iter()
            .map(|y| self.scan_row(y))
            .collect();

        let mut best: Option<(u64, Point)> = None;
        for (y, row) in self.rows().zip(rows) {
            if let Some((err, x)) = row {
                if improves(&best, err) {
                    best = Some((err, Point::new(x as i32, y as i32)));
                }
            }
        }
        best.map(|(_, p)| p)
    }
}

fn improves(best: &Option<(u64, Point)>, err: u64) -> bool {
    best.map_or(true, |(e, _)| err < e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_image(size: usize) -> Image<u8> {
        let data = (0..size * size)
            .flat_map(|i| {
                let v = ((i % size) * 7 + (i / size) * 3) as u8;
                [v, v / 2, 255 - v]
            })
            .collect();
        Image::new(data, size, size, 3).unwrap()
    }

    #[test]
    fn finds_exact_copy_of_known_pixels() {
        let mut img = gradient_image(20);
        // stamp a distinctive patch at (14, 14) and its twin at (5, 5)
        for (cx, cy) in [(5usize, 5usize), (14, 14)] {
            for dy in 0..3 {
                for dx in 0..3 {
                    img.pixel_mut(cx - 1 + dx, cy - 1 + dy)
                        .copy_from_slice(&[200, (dx * 40) as u8, (dy * 40) as u8]);
                }
            }
        }
        let inside = |x: usize, y: usize| (10..18).contains(&x) && (10..18).contains(&y);
        let source_region = Image::mask_from_fn(20, 20, inside).unwrap();
        let known = Image::filled(3, 3, 1, 255u8).unwrap();
        let query = SourceQuery {
            image: &img,
            source_region: &source_region,
            target: Point::new(5, 5),
            known: &known,
            half: 1,
            candidates: None,
        };
        assert_eq!(query.best_source(), Some(Point::new(14, 14)));
    }

    #[test]
    fn unknown_pixels_do_not_count() {
        let img = gradient_image(12);
        let mut known = Image::filled(3, 3, 1, 0u8).unwrap();
        known.set(0, 0, 255);
        let source_region = Image::filled(12, 12, 1, 255u8).unwrap();
        let query = SourceQuery {
            image: &img,
            source_region: &source_region,
            target: Point::new(6, 6),
            known: &known,
            half: 1,
            candidates: None,
        };
        assert_eq!(query.patch_error(6, 6, u64::MAX), Some(0));
        assert_eq!(query.patch_error(7, 6, 1), None);
    }

    #[test]
    fn candidate_mask_restricts_the_scan() {
        let img = gradient_image(12);
        let known = Image::filled(3, 3, 1, 255u8).unwrap();
        let source_region = Image::filled(12, 12, 1, 255u8).unwrap();
        let none = Image::filled(10, 10, 1, 0u8).unwrap();
        let query = SourceQuery {
            image: &img,
            source_region: &source_region,
            target: Point::new(6, 6),
            known: &known,
            half: 1,
            candidates: Some(&none),
        };
        assert_eq!(query.best_source(), None);

        let mut one = none.clone();
        one.set(2, 3, 255);
        let query = SourceQuery {
            candidates: Some(&one),
            ..query
        };
        assert_eq!(query.best_source(), Some(Point::new(3, 4)));
    }
}
