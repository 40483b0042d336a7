//! Patch dissimilarity between a source and a target image.

use crate::image::integral::IntegralImage;
use crate::image::{Image, Mask};
use crate::patch::{comparable_patch_regions, is_centered_patch_crossing_boundary, Point, Rect};

/// Norm applied to per-channel pixel differences.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Norm {
    /// Sum of absolute differences.
    L1,
    /// Euclidean norm.
    L2,
    /// Sum of squared differences.
    #[default]
    L2Sqr,
}

/// Distance used to reject a candidate.
pub const MAX_DISTANCE: f64 = f64::MAX;

/// Evaluates patch distances for one source/target pair.
pub(crate) struct PatchDistance<'a> {
    source: &'a Image<u8>,
    target: &'a Image<u8>,
    /// Integral of a 0/1 validity image of the target.
    valid: Option<IntegralImage>,
    half: i32,
    norm: Norm,
}

impl<'a> PatchDistance<'a> {
    pub(crate) fn new(
        source: &'a Image<u8>,
        target: &'a Image<u8>,
        mask: Option<&Mask>,
        half: usize,
        norm: Norm,
    ) -> Self {
        let valid = mask.map(|m| {
            let mut ones = m.clone();
            for v in ones.data_mut() {
                *v = u8::from(*v != 0);
            }
            IntegralImage::from_image(&ones)
        });
        Self {
            source,
            target,
            valid,
            half: half as i32,
            norm,
        }
    }

    pub(crate) fn target(&self) -> &Image<u8> {
        self.target
    }

    pub(crate) fn half(&self) -> i32 {
        self.half
    }

    fn is_valid_rect(&self, rect: Rect) -> bool {
        match &self.valid {
            Some(integral) => integral.rect_sum(rect)[0] == rect.area() as u64,
            None => true,
        }
    }

    /// True when the full target patch around `t` is inside the image and
    /// entirely valid.
    pub(crate) fn is_valid_center(&self, t: Point) -> bool {
        !is_centered_patch_crossing_boundary(t, self.half, self.target)
            && self.is_valid_rect(Rect::centered(t, self.half))
    }

    /// Distance between the source patch at `s` and the target patch at `t`.
    ///
    /// Returns [`MAX_DISTANCE`] when the target patch leaves the target
    /// image, when the patches have no comparable overlap, or when the
    /// compared target pixels are not all valid.
    pub(crate) fn distance(&self, s: Point, t: Point) -> f64 {
        if is_centered_patch_crossing_boundary(t, self.half, self.target) {
            return MAX_DISTANCE;
        }
        let (rs, rt) = comparable_patch_regions(self.source, self.target, s, t, self.half);
        if rs.is_empty() || !self.is_valid_rect(rt) {
            return MAX_DISTANCE;
        }

        let a = self.source.view_rect(rs);
        let b = self.target.view_rect(rt);
        let mut acc = 0u64;
        for y in 0..a.height() {
            let (ra, rb) = (a.row(y), b.row(y));
            match self.norm {
                Norm::L1 => {
                    for (p, q) in ra.iter().zip(rb) {
                        acc += u64::from(p.abs_diff(*q));
                    }
                }
                Norm::L2 | Norm::L2Sqr => {
                    for (p, q) in ra.iter().zip(rb) {
                        let d = u64::from(p.abs_diff(*q));
                        acc += d * d;
                    }
                }
            }
        }

        match self.norm {
            Norm::L2 => (acc as f64).sqrt(),
            Norm::L1 | Norm::L2Sqr => acc as f64,
        }
    }
}
