//! Greedy exemplar-based inpainting.
//!
//! The inpainter fills a masked region one patch at a time. Each step picks
//! the fill-front pixel whose patch is both well known (confidence) and
//! crossed by a strong edge (data term), finds the most similar fully known
//! patch elsewhere in the image, and copies the missing pixels from it.
//!
//! Comparisons use a match patch about 1.25 times larger than the copied
//! patch. A band of the match half-size along the image border is never
//! filled.
//!
//! ```no_run
//! use patchfill::{ExemplarInpainter, Image};
//!
//! # fn demo(image: Image<u8>, target: Image<u8>) -> patchfill::PatchFillResult<()> {
//! let mut inpainter = ExemplarInpainter::new();
//! inpainter.set_source_image(image);
//! inpainter.set_target_mask(target);
//! inpainter.set_patch_size(9);
//! inpainter.initialize()?;
//! while inpainter.has_more_steps() {
//!     inpainter.step()?;
//! }
//! # Ok(())
//! # }
//! ```

mod front;
mod search;

use crate::candidate::TemplateMatchCandidates;
use crate::image::filter::erode_rect;
use crate::image::{Image, Mask};
use crate::patch::{Point, Rect};
use crate::trace::{trace_event, trace_span};
use crate::util::{PatchFillError, PatchFillResult};
use search::SourceQuery;

/// Parameters of the greedy inpainter.
#[derive(Clone, Debug)]
pub struct InpaintConfig {
    /// Side length of the copied patch.
    pub patch_size: usize,
    /// Candidate-filter block grid along `(x, y)`.
    pub partition: (usize, usize),
    /// Candidate-filter mismatches tolerated per channel.
    pub max_weak_errors: usize,
    /// Candidate-filter mean-difference threshold.
    pub max_mean_difference: f32,
    /// Prefilter source positions before the exact scan.
    pub use_candidate_filter: bool,
    /// Run the candidate filter and the source scan row-parallel when the
    /// `rayon` feature is enabled.
    pub parallel: bool,
}

impl Default for InpaintConfig {
    fn default() -> Self {
        Self {
            patch_size: 9,
            partition: (3, 3),
            max_weak_errors: 3,
            max_mean_difference: 10.0,
            use_candidate_filter: true,
            parallel: false,
        }
    }
}

/// Outcome of one inpainting step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepReport {
    /// Center of the filled patch.
    pub target: Point,
    /// Center of the patch the pixels were copied from.
    pub source: Point,
    /// Number of pixels filled in this step.
    pub filled: usize,
    /// True when the prefiltered scan found nothing and the full scan ran.
    pub used_fallback: bool,
}

struct FillState {
    image: Image<u8>,
    target: Mask,
    source: Mask,
    restrict: Option<Mask>,
    confidence: Image<f32>,
    iso_x: Image<f32>,
    iso_y: Image<f32>,
    half_patch: usize,
    half_match: usize,
    candidates: Option<TemplateMatchCandidates>,
    candidate_buf: Mask,
    remaining: usize,
}

/// Criminisi-style inpainter driven one step at a time by the caller.
#[derive(Default)]
pub struct ExemplarInpainter {
    config: InpaintConfig,
    image: Option<Image<u8>>,
    source_mask: Option<Mask>,
    target_mask: Option<Mask>,
    state: Option<FillState>,
}

impl ExemplarInpainter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: InpaintConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &InpaintConfig {
        &self.config
    }

    /// Sets the 3-channel image to repair. Discards any running fill.
    pub fn set_source_image(&mut self, image: Image<u8>) {
        self.image = Some(image);
        self.state = None;
    }

    /// Restricts where patches may be copied from. An all-zero mask means no
    /// restriction.
    pub fn set_source_mask(&mut self, mask: Mask) {
        self.source_mask = Some(mask);
        self.state = None;
    }

    /// Sets the region to fill; nonzero pixels are missing.
    pub fn set_target_mask(&mut self, mask: Mask) {
        self.target_mask = Some(mask);
        self.state = None;
    }

    pub fn set_patch_size(&mut self, patch_size: usize) {
        self.config.patch_size = patch_size;
        self.state = None;
    }

    /// Current image: the partially filled one after [`initialize`](Self::initialize),
    /// otherwise the configured input.
    pub fn image(&self) -> Option<&Image<u8>> {
        match &self.state {
            Some(state) => Some(&state.image),
            None => self.image.as_ref(),
        }
    }

    /// Pixels still waiting to be filled.
    pub fn target_region(&self) -> Option<&Mask> {
        match &self.state {
            Some(state) => Some(&state.target),
            None => self.target_mask.as_ref(),
        }
    }

    /// Consumes the inpainter and returns the current image.
    pub fn into_image(self) -> Option<Image<u8>> {
        match self.state {
            Some(state) => Some(state.image),
            None => self.image,
        }
    }

    /// True while target pixels remain. False before initialization.
    pub fn has_more_steps(&self) -> bool {
        self.state.as_ref().is_some_and(|s| s.remaining > 0)
    }

    /// Validates the inputs and builds the fill state.
    pub fn initialize(&mut self) -> PatchFillResult<()> {
        let _span = trace_span!("inpaint_initialize").entered();
        self.state = None;

        let image = self
            .image
            .as_ref()
            .ok_or(PatchFillError::InvalidParameter("source image is not set"))?;
        let target_mask = self
            .target_mask
            .as_ref()
            .ok_or(PatchFillError::InvalidParameter("target mask is not set"))?;
        if image.channels() != 3 {
            return Err(PatchFillError::UnsupportedChannels {
                expected: "3",
                got: image.channels(),
            });
        }
        check_mask(target_mask, image, "target mask")?;
        if let Some(mask) = &self.source_mask {
            check_mask(mask, image, "source mask")?;
        }
        if self.config.patch_size == 0 {
            return Err(PatchFillError::InvalidParameter(
                "patch size must be positive",
            ));
        }

        let half_patch = (self.config.patch_size / 2).max(1);
        let half_match = (half_patch as f32 * 1.25) as usize;
        let side = 2 * half_match + 1;
        if side > image.width() || side > image.height() {
            return Err(PatchFillError::TemplateTooLarge {
                tpl_width: side,
                tpl_height: side,
                img_width: image.width(),
                img_height: image.height(),
            });
        }

        let (w, h) = image.size();
        let inside = |x: usize, y: usize, margin: usize| {
            x >= margin && y >= margin && x + margin < w && y + margin < h
        };

        let target = Image::mask_from_fn(w, h, |x, y| {
            inside(x, y, half_match) && target_mask.at(x, y) != 0
        })?;
        let complement = Image::mask_from_fn(w, h, |x, y| {
            inside(x, y, half_match) && target.at(x, y) == 0
        })?;
        let restrict = self
            .source_mask
            .as_ref()
            .filter(|m| m.count_nonzero() > 0)
            .cloned();
        let mut source = erode_rect(&complement, half_match);
        if let Some(restrict) = &restrict {
            for (s, &r) in source.data_mut().iter_mut().zip(restrict.data()) {
                if r == 0 {
                    *s = 0;
                }
            }
        }

        let (iso_x, iso_y) = front::isophotes(image);
        let mut confidence = Image::with_shape_of(image, 1, 1.0f32);
        for (c, &t) in confidence.data_mut().iter_mut().zip(target.data()) {
            if t != 0 {
                *c = 0.0;
            }
        }

        let candidates = if self.config.use_candidate_filter {
            Some(TemplateMatchCandidates::new(
                image,
                (side, side),
                self.config.partition,
            )?)
        } else {
            None
        };
        let candidate_buf = Image::filled(w - side + 1, h - side + 1, 1, 0u8)?;

        let remaining = target.count_nonzero();
        trace_event!(
            "inpaint_initialized",
            remaining = remaining,
            half_patch = half_patch,
            half_match = half_match
        );

        self.state = Some(FillState {
            image: image.clone(),
            target,
            source,
            restrict,
            confidence,
            iso_x,
            iso_y,
            half_patch,
            half_match,
            candidates,
            candidate_buf,
            remaining,
        });
        Ok(())
    }

    /// Fills one patch.
    pub fn step(&mut self) -> PatchFillResult<StepReport> {
        let _span = trace_span!("inpaint_step").entered();
        let config = &self.config;
        let state = self.state.as_mut().ok_or(PatchFillError::NotInitialized)?;
        if state.remaining == 0 {
            return Err(PatchFillError::InvalidParameter("no target pixels remain"));
        }

        let front = front::update_fill_front(
            &state.target,
            &mut state.confidence,
            state.half_patch,
            state.half_match,
        );
        let target = front::select_target(
            &front,
            &state.target,
            &state.confidence,
            &state.iso_x,
            &state.iso_y,
        )
        .ok_or(PatchFillError::FillFrontStalled {
            remaining: state.remaining,
        })?;

        let (source, used_fallback) = state.find_source(target, config)?;
        let filled = state.propagate(target, source);
        state.remaining -= filled;

        trace_event!(
            "inpaint_step",
            target_x = target.x,
            target_y = target.y,
            source_x = source.x,
            source_y = source.y,
            filled = filled,
            fallback = used_fallback
        );

        Ok(StepReport {
            target,
            source,
            filled,
            used_fallback,
        })
    }

    /// Runs [`step`](Self::step) until no target pixels remain.
    pub fn run(&mut self) -> PatchFillResult<usize> {
        let mut steps = 0;
        while self.has_more_steps() {
            self.step()?;
            steps += 1;
        }
        Ok(steps)
    }
}

impl FillState {
    fn known_pixels(&self, rect: Rect) -> Mask {
        let view = self.target.view_rect(rect);
        let mut known = view.to_image();
        for v in known.data_mut() {
            *v = if *v == 0 { 255 } else { 0 };
        }
        known
    }

    fn find_source(
        &mut self,
        target: Point,
        config: &InpaintConfig,
    ) -> PatchFillResult<(Point, bool)> {
        let rect = Rect::centered(target, self.half_match as i32);
        let known = self.known_pixels(rect);

        let mut filtered = None;
        if let Some(finder) = &self.candidates {
            let template = self.image.view_rect(rect);
            let mask = Some(known.view());
            let (weak, diff) = (config.max_weak_errors, config.max_mean_difference);
            let out = &mut self.candidate_buf;

            #[cfg(feature = "rayon")]
            if config.parallel {
                *out = finder.find_candidates_par(template, mask, weak, diff)?;
            } else {
                finder.find_candidates_into(template, mask, weak, diff, out)?;
            }
            #[cfg(not(feature = "rayon"))]
            finder.find_candidates_into(template, mask, weak, diff, out)?;

            filtered = self.scan(target, &known, Some(&self.candidate_buf), config.parallel);
        }

        match filtered {
            Some(p) => Ok((p, false)),
            None => self
                .scan(target, &known, None, config.parallel)
                .map(|p| (p, self.candidates.is_some()))
                .ok_or(PatchFillError::SourceExhausted {
                    x: target.x as usize,
                    y: target.y as usize,
                }),
        }
    }

    fn scan(
        &self,
        target: Point,
        known: &Mask,
        candidates: Option<&Mask>,
        parallel: bool,
    ) -> Option<Point> {
        let query = SourceQuery {
            image: &self.image,
            source_region: &self.source,
            target,
            known,
            half: self.half_match,
            candidates,
        };

        #[cfg(feature = "rayon")]
        if parallel {
            return query.best_source_par();
        }
        #[cfg(not(feature = "rayon"))]
        let _ = parallel;

        query.best_source()
    }

    /// Copies the missing pixels of the target patch from the source patch
    /// and returns how many were filled.
    fn propagate(&mut self, target: Point, source: Point) -> usize {
        let half = self.half_patch as i32;
        let dst = Rect::centered(target, half);
        let src = Rect::centered(source, half);
        let copy_mask = self.target.view_rect(dst).to_image();
        let filled = copy_mask.count_nonzero();

        self.image.copy_rect_masked(src, dst, copy_mask.view());
        self.iso_x.copy_rect_masked(src, dst, copy_mask.view());
        self.iso_y.copy_rect_masked(src, dst, copy_mask.view());
        let c = self.confidence.at(target.x as usize, target.y as usize);
        self.confidence.fill_rect_masked(dst, c, copy_mask.view());
        self.target.fill_rect_masked(dst, 0, copy_mask.view());

        self.grow_source(dst);
        filled
    }

    /// Marks pixels near `filled` as eligible sources once their whole match
    /// window is known.
    fn grow_source(&mut self, filled: Rect) {
        let (w, h) = self.image.size();
        let hm = self.half_match;
        let lo = 2 * hm;
        let reach = hm as i32;
        let x0 = ((filled.x - reach).max(0) as usize).max(lo);
        let y0 = ((filled.y - reach).max(0) as usize).max(lo);
        let x1 = ((filled.right() + reach) as usize).min(w.saturating_sub(lo));
        let y1 = ((filled.bottom() + reach) as usize).min(h.saturating_sub(lo));

        for y in y0..y1 {
            for x in x0..x1 {
                if self.source.at(x, y) != 0 {
                    continue;
                }
                if self.restrict.as_ref().is_some_and(|r| r.at(x, y) == 0) {
                    continue;
                }
                let window = Rect::centered(Point::new(x as i32, y as i32), hm as i32);
                if self.target.view_rect(window).count_nonzero() == 0 {
                    self.source.set(x, y, 255);
                }
            }
        }
    }
}

fn check_mask(mask: &Mask, image: &Image<u8>, context: &'static str) -> PatchFillResult<()> {
    if !mask.same_size(image) {
        return Err(PatchFillError::SizeMismatch {
            context,
            expected: image.size(),
            got: mask.size(),
        });
    }
    if mask.channels() != 1 {
        return Err(PatchFillError::UnsupportedChannels {
            expected: "single-channel mask",
            got: mask.channels(),
        });
    }
    Ok(())
}

/// Fills `target_mask` in `image` and returns the repaired image.
///
/// `source_mask`, when given and not empty, restricts where content is
/// copied from.
pub fn inpaint(
    image: &Image<u8>,
    target_mask: &Mask,
    source_mask: Option<&Mask>,
    patch_size: usize,
) -> PatchFillResult<Image<u8>> {
    inpaint_with_config(
        image,
        target_mask,
        source_mask,
        InpaintConfig {
            patch_size,
            ..InpaintConfig::default()
        },
    )
}

/// [`inpaint`] with explicit parameters.
pub fn inpaint_with_config(
    image: &Image<u8>,
    target_mask: &Mask,
    source_mask: Option<&Mask>,
    config: InpaintConfig,
) -> PatchFillResult<Image<u8>> {
    let mut inpainter = ExemplarInpainter::with_config(config);
    inpainter.set_source_image(image.clone());
    inpainter.set_target_mask(target_mask.clone());
    if let Some(mask) = source_mask {
        inpainter.set_source_mask(mask.clone());
    }
    inpainter.initialize()?;
    inpainter.run()?;
    inpainter
        .into_image()
        .ok_or(PatchFillError::NotInitialized)
}
