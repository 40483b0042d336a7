//! PatchMatch dense correspondence search.
//!
//! For every pixel of a source image the search keeps the center of a
//! similar patch in a target image. Matches start random (or from a prior)
//! and improve over passes; each pass is a propagation sweep followed by a
//! random-search sweep. Sweep direction alternates, forward first.
//!
//! Per-pixel distances never increase: every update requires a strictly
//! smaller distance.
//!
//! With the `rayon` feature and `parallel` set, random initialization and
//! random search run row-parallel. Each row draws from its own seeded
//! generator, so parallel and sequential runs produce the same field.
//! Propagation always runs sequentially.

mod distance;
mod propagate;
mod search;

pub use distance::{Norm, MAX_DISTANCE};

use crate::image::{Image, Mask};
use crate::patch::Point;
use crate::trace::{trace_event, trace_span};
use crate::util::{PatchFillError, PatchFillResult};
use distance::PatchDistance;

/// Parameters of the correspondence search.
#[derive(Clone, Debug)]
pub struct PatchMatchConfig {
    /// Patches are `(2 * half_patch_size + 1)` squares.
    pub half_patch_size: usize,
    /// Passes run by [`PatchMatcher::run`].
    pub iterations: usize,
    pub norm: Norm,
    /// Window shrink factor of the random search, in `(0, 1)`.
    pub alpha: f64,
    pub seed: u64,
    /// Run random stages row-parallel when the `rayon` feature is enabled.
    pub parallel: bool,
}

impl Default for PatchMatchConfig {
    fn default() -> Self {
        Self {
            half_patch_size: 3,
            iterations: 5,
            norm: Norm::L2Sqr,
            alpha: 0.5,
            seed: 0x5EED_0F_FA7C,
            parallel: false,
        }
    }
}

/// Starting point of a search.
#[derive(Clone, Debug, Default)]
pub enum Prior {
    /// Random initialization.
    #[default]
    None,
    /// Target centers per source pixel, row-major; distances are recomputed.
    Correspondences(Vec<Point>),
    /// A complete field reused as is.
    Field(CorrespondenceField),
}

/// Best-known target center and distance for every source pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrespondenceField {
    width: usize,
    height: usize,
    targets: Vec<Point>,
    distances: Vec<f64>,
}

impl CorrespondenceField {
    /// Builds a field from row-major target centers and distances.
    pub fn new(
        width: usize,
        height: usize,
        targets: Vec<Point>,
        distances: Vec<f64>,
    ) -> PatchFillResult<Self> {
        let needed = width * height;
        if targets.len() != needed || distances.len() != needed {
            return Err(PatchFillError::BufferTooSmall {
                needed,
                got: targets.len().min(distances.len()),
            });
        }
        Ok(Self {
            width,
            height,
            targets,
            distances,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Target center matched to source pixel `(x, y)`.
    pub fn target_at(&self, x: usize, y: usize) -> Point {
        self.targets[y * self.width + x]
    }

    /// Displacement from `(x, y)` to its target center.
    pub fn offset_at(&self, x: usize, y: usize) -> (i32, i32) {
        let t = self.target_at(x, y);
        (t.x - x as i32, t.y - y as i32)
    }

    pub fn distance_at(&self, x: usize, y: usize) -> f64 {
        self.distances[y * self.width + x]
    }

    pub fn targets(&self) -> &[Point] {
        &self.targets
    }

    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// Mean over distances below [`MAX_DISTANCE`]; `None` if there are none.
    pub fn mean_distance(&self) -> Option<f64> {
        let (sum, n) = self
            .distances
            .iter()
            .filter(|&&d| d < MAX_DISTANCE)
            .fold((0.0, 0usize), |(s, n), &d| (s + d, n + 1));
        (n > 0).then(|| sum / n as f64)
    }

    /// Builds a source-sized image by sampling `target` at every match.
    ///
    /// Matches outside `target` are clamped to its border.
    pub fn reconstruct(&self, target: &Image<u8>) -> PatchFillResult<Image<u8>> {
        let c = target.channels();
        let mut out = Image::filled(self.width, self.height, c, 0u8)?;
        let (tw, th) = (target.width() as i32, target.height() as i32);
        for y in 0..self.height {
            for x in 0..self.width {
                let t = self.target_at(x, y);
                let tx = t.x.clamp(0, tw - 1) as usize;
                let ty = t.y.clamp(0, th - 1) as usize;
                out.pixel_mut(x, y).copy_from_slice(target.pixel(tx, ty));
            }
        }
        Ok(out)
    }
}

/// Configured source/target pair.
#[derive(Clone, Debug)]
pub struct PatchMatcher<'a> {
    source: &'a Image<u8>,
    target: &'a Image<u8>,
    mask: Option<&'a Mask>,
    config: PatchMatchConfig,
}

impl<'a> PatchMatcher<'a> {
    pub fn new(source: &'a Image<u8>, target: &'a Image<u8>) -> Self {
        Self {
            source,
            target,
            mask: None,
            config: PatchMatchConfig::default(),
        }
    }

    /// Marks valid target pixels; matches never use a patch touching an
    /// invalid one.
    pub fn with_mask(mut self, mask: &'a Mask) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_config(mut self, config: PatchMatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PatchMatchConfig {
        &self.config
    }

    fn validate(&self) -> PatchFillResult<()> {
        let c = self.source.channels();
        if c != 1 && c != 3 {
            return Err(PatchFillError::UnsupportedChannels {
                expected: "1 or 3",
                got: c,
            });
        }
        if self.target.channels() != c {
            return Err(PatchFillError::UnsupportedChannels {
                expected: "target channels equal to source channels",
                got: self.target.channels(),
            });
        }
        if self.config.half_patch_size == 0 {
            return Err(PatchFillError::InvalidParameter(
                "half patch size must be positive",
            ));
        }
        let side = 2 * self.config.half_patch_size + 1;
        if side > self.target.width() || side > self.target.height() {
            return Err(PatchFillError::TemplateTooLarge {
                tpl_width: side,
                tpl_height: side,
                img_width: self.target.width(),
                img_height: self.target.height(),
            });
        }
        if let Some(mask) = self.mask {
            if !mask.same_size(self.target) {
                return Err(PatchFillError::SizeMismatch {
                    context: "target mask",
                    expected: self.target.size(),
                    got: mask.size(),
                });
            }
            if mask.channels() != 1 {
                return Err(PatchFillError::UnsupportedChannels {
                    expected: "single-channel mask",
                    got: mask.channels(),
                });
            }
        }
        if !(self.config.alpha > 0.0 && self.config.alpha < 1.0) {
            return Err(PatchFillError::InvalidParameter("alpha must lie in (0, 1)"));
        }
        Ok(())
    }

    /// Builds the starting field from `prior`.
    pub fn initialize(&self, prior: Prior) -> PatchFillResult<CorrespondenceSearch<'a>> {
        let _span = trace_span!("patch_match_initialize").entered();
        self.validate()?;

        let distance = PatchDistance::new(
            self.source,
            self.target,
            self.mask,
            self.config.half_patch_size,
            self.config.norm,
        );
        let (w, h) = self.source.size();
        let n = w * h;

        let field = match prior {
            Prior::Field(field) => {
                if field.size() != (w, h) {
                    return Err(PatchFillError::SizeMismatch {
                        context: "prior field",
                        expected: (w, h),
                        got: field.size(),
                    });
                }
                field
            }
            Prior::Correspondences(targets) => {
                if targets.len() != n {
                    return Err(PatchFillError::BufferTooSmall {
                        needed: n,
                        got: targets.len(),
                    });
                }
                let distances = vec![MAX_DISTANCE; n];
                let mut field = CorrespondenceField::new(w, h, targets, distances)?;
                for_each_row(&mut field, self.config.parallel, |y, t, d| {
                    search::score_row(y, t, d, &distance)
                });
                field
            }
            Prior::None => {
                let pool = search::init_pool(&distance);
                let (targets, distances) = (vec![Point::default(); n], vec![MAX_DISTANCE; n]);
                let mut field = CorrespondenceField::new(w, h, targets, distances)?;
                let seed = self.config.seed;
                for_each_row(&mut field, self.config.parallel, |y, t, d| {
                    search::init_row(y, t, d, &pool, &distance, seed)
                });
                field
            }
        };

        trace_event!(
            "patch_match_initialized",
            width = w,
            height = h,
            mean_distance = field.mean_distance().unwrap_or(MAX_DISTANCE)
        );

        Ok(CorrespondenceSearch {
            distance,
            field,
            config: self.config.clone(),
            passes: 0,
        })
    }

    /// Initializes from `prior` and runs the configured number of passes.
    pub fn run(&self, prior: Prior) -> PatchFillResult<CorrespondenceField> {
        let mut search = self.initialize(prior)?;
        for _ in 0..self.config.iterations {
            search.iterate();
        }
        Ok(search.into_field())
    }
}

/// A search in progress; each [`iterate`](Self::iterate) runs one pass.
pub struct CorrespondenceSearch<'a> {
    distance: PatchDistance<'a>,
    field: CorrespondenceField,
    config: PatchMatchConfig,
    passes: usize,
}

impl CorrespondenceSearch<'_> {
    /// Runs one propagation sweep and one random-search sweep.
    pub fn iterate(&mut self) {
        self.passes += 1;
        let pass = self.passes as u64;
        let forward = self.passes % 2 == 1;
        let _span = trace_span!("patch_match_pass", pass, forward).entered();

        propagate::propagate(&mut self.field, &self.distance, forward);

        let target = self.distance.target();
        let max_radius = target.width().max(target.height()) as f64;
        let (alpha, seed) = (self.config.alpha, self.config.seed);
        let distance = &self.distance;
        for_each_row(&mut self.field, self.config.parallel, |y, t, d| {
            search::search_row(y, t, d, distance, max_radius, alpha, seed, pass)
        });

        trace_event!(
            "patch_match_pass",
            pass = pass,
            mean_distance = self.field.mean_distance().unwrap_or(MAX_DISTANCE)
        );
    }

    /// Number of passes run so far.
    pub fn passes(&self) -> usize {
        self.passes
    }

    pub fn field(&self) -> &CorrespondenceField {
        &self.field
    }

    pub fn into_field(self) -> CorrespondenceField {
        self.field
    }
}

/// Applies `f(row, targets, distances)` to every row of `field`.
fn for_each_row<F>(field: &mut CorrespondenceField, parallel: bool, f: F)
where
    F: Fn(usize, &mut [Point], &mut [f64]) + Sync,
{
    let w = field.width;
    if w == 0 {
        return;
    }

    #[cfg(feature = "rayon")]
    if parallel {
        use rayon::prelude::*;
        field
            .targets
            .par_chunks_mut(w)
            .zip(field.distances.par_chunks_mut(w))
            .enumerate()
            .for_each(|(y, (t, d))| f(y, t, d));
        return;
    }
    #[cfg(not(feature = "rayon"))]
    let _ = parallel;

    for (y, (t, d)) in field
        .targets
        .chunks_mut(w)
        .zip(field.distances.chunks_mut(w))
        .enumerate()
    {
        f(y, t, d);
    }
}

/// Computes a correspondence field from `source` into `target`.
pub fn compute_correspondence(
    source: &Image<u8>,
    target: &Image<u8>,
    mask: Option<&Mask>,
    prior: Prior,
    config: &PatchMatchConfig,
) -> PatchFillResult<CorrespondenceField> {
    let mut matcher = PatchMatcher::new(source, target).with_config(config.clone());
    if let Some(mask) = mask {
        matcher = matcher.with_mask(mask);
    }
    matcher.run(prior)
}
