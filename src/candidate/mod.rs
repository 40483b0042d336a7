//! Weak-classifier template-match prefilter.
//!
//! A template is split into a grid of blocks. For every block and channel a
//! weak classifier records whether the block mean lies above the template
//! mean. Each anchor position in the source image is then tested with the
//! same classifiers evaluated through integral-image lookups; positions whose
//! global mean is too far off, or whose classifiers disagree too often, are
//! rejected. Accepted positions are only candidates: the caller still has to
//! compare pixels.
//!
//! Classifier signs are decided with exact integer arithmetic, so a template
//! cut from the source image always accepts its own anchor.

mod blocks;

use crate::image::integral::{IntegralImage, MAX_CHANNELS};
use crate::image::{Image, ImageView, Mask};
use crate::patch::Rect;
use crate::trace::{trace_event, trace_span};
use crate::util::{PatchFillError, PatchFillResult};

/// Value written for accepted anchors.
pub const CANDIDATE: u8 = 255;

/// Parameters of the standalone candidate search.
#[derive(Clone, Debug)]
pub struct CandidateConfig {
    /// Number of blocks along `(x, y)`.
    pub partition: (usize, usize),
    /// Classifier mismatches tolerated per channel.
    pub max_weak_errors: usize,
    /// Largest accepted difference between position and template means.
    pub max_mean_difference: f32,
    /// Scan rows in parallel when the `rayon` feature is enabled.
    pub parallel: bool,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            partition: (3, 3),
            max_weak_errors: 3,
            max_mean_difference: 20.0,
            parallel: false,
        }
    }
}

/// Classifier responses of one query template.
struct Reference {
    blocks: Vec<Rect>,
    /// `signs[c * blocks.len() + b]`
    signs: Vec<bool>,
    means: [f64; MAX_CHANNELS],
}

/// Reusable candidate finder bound to one source image and template size.
#[derive(Clone, Debug)]
pub struct TemplateMatchCandidates {
    integral: IntegralImage,
    template_size: (usize, usize),
    blocks: Vec<Rect>,
}

impl TemplateMatchCandidates {
    /// Precomputes integrals of `image` and the block layout for templates of
    /// `template_size`, split into a `partition` grid.
    pub fn new(
        image: &Image<u8>,
        template_size: (usize, usize),
        partition: (usize, usize),
    ) -> PatchFillResult<Self> {
        check_channels(image.channels())?;
        let (tw, th) = template_size;
        if tw == 0 || th == 0 {
            return Err(PatchFillError::InvalidDimensions {
                width: tw,
                height: th,
            });
        }
        if partition.0 == 0 || partition.1 == 0 {
            return Err(PatchFillError::InvalidParameter(
                "partition must have at least one block per axis",
            ));
        }
        if tw > image.width() || th > image.height() {
            return Err(PatchFillError::TemplateTooLarge {
                tpl_width: tw,
                tpl_height: th,
                img_width: image.width(),
                img_height: image.height(),
            });
        }

        Ok(Self {
            integral: IntegralImage::from_image(image),
            template_size,
            blocks: blocks::block_rects(tw, th, partition),
        })
    }

    /// Template size this finder was built for.
    pub fn template_size(&self) -> (usize, usize) {
        self.template_size
    }

    /// Size of the candidate mask, one entry per anchor.
    pub fn candidates_size(&self) -> (usize, usize) {
        let (w, h) = self.integral.source_size();
        (w - self.template_size.0 + 1, h - self.template_size.1 + 1)
    }

    /// Returns a mask with [`CANDIDATE`] at every accepted top-left anchor.
    ///
    /// `mask`, when given, marks the valid template pixels; blocks that are
    /// not fully valid are left out of the comparison.
    pub fn find_candidates(
        &self,
        template: ImageView<'_, u8>,
        mask: Option<ImageView<'_, u8>>,
        max_weak_errors: usize,
        max_mean_difference: f32,
    ) -> PatchFillResult<Mask> {
        let (cw, ch) = self.candidates_size();
        let mut out = Image::filled(cw, ch, 1, 0u8)?;
        self.find_candidates_into(
            template,
            mask,
            max_weak_errors,
            max_mean_difference,
            &mut out,
        )?;
        Ok(out)
    }

    /// Like [`find_candidates`](Self::find_candidates), writing into `out`.
    pub fn find_candidates_into(
        &self,
        template: ImageView<'_, u8>,
        mask: Option<ImageView<'_, u8>>,
        max_weak_errors: usize,
        max_mean_difference: f32,
        out: &mut Mask,
    ) -> PatchFillResult<()> {
        let _span = trace_span!("find_candidates").entered();
        let reference = self.reference(template, mask)?;
        self.check_output(out)?;

        let (cw, ch) = self.candidates_size();
        let max_diff = f64::from(max_mean_difference);
        for y in 0..ch {
            let row = out.row_mut(y);
            for (x, slot) in row.iter_mut().enumerate().take(cw) {
                *slot = self.classify(x, y, &reference, max_weak_errors, max_diff);
            }
        }

        trace_event!("candidates", accepted = out.count_nonzero());
        Ok(())
    }

    /// Row-parallel variant of [`find_candidates`](Self::find_candidates).
    #[cfg(feature = "rayon")]
    pub fn find_candidates_par(
        &self,
        template: ImageView<'_, u8>,
        mask: Option<ImageView<'_, u8>>,
        max_weak_errors: usize,
        max_mean_difference: f32,
    ) -> PatchFillResult<Mask> {
        use rayon::prelude::*;

        let _span = trace_span!("find_candidates", parallel = true).entered();
        let reference = self.reference(template, mask)?;
        let (cw, ch) = self.candidates_size();
        let mut out = Image::filled(cw, ch, 1, 0u8)?;
        let max_diff = f64::from(max_mean_difference);

        out.data_mut()
            .par_chunks_mut(cw)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, slot) in row.iter_mut().enumerate() {
                    *slot = self.classify(x, y, &reference, max_weak_errors, max_diff);
                }
            });

        trace_event!("candidates", accepted = out.count_nonzero());
        Ok(out)
    }

    fn check_output(&self, out: &Mask) -> PatchFillResult<()> {
        let expected = self.candidates_size();
        if out.size() != expected || out.channels() != 1 {
            return Err(PatchFillError::SizeMismatch {
                context: "candidate mask",
                expected,
                got: out.size(),
            });
        }
        Ok(())
    }

    fn reference(
        &self,
        template: ImageView<'_, u8>,
        mask: Option<ImageView<'_, u8>>,
    ) -> PatchFillResult<Reference> {
        let channels = self.integral.channels();
        if template.channels() != channels {
            return Err(PatchFillError::UnsupportedChannels {
                expected: "template channels equal to source image channels",
                got: template.channels(),
            });
        }
        if template.size() != self.template_size {
            return Err(PatchFillError::SizeMismatch {
                context: "template",
                expected: self.template_size,
                got: template.size(),
            });
        }
        if let Some(mask) = mask {
            if mask.size() != self.template_size {
                return Err(PatchFillError::SizeMismatch {
                    context: "template mask",
                    expected: self.template_size,
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

        let mut blocks = self.blocks.clone();
        if let Some(mask) = mask {
            blocks::retain_covered_blocks(&mut blocks, mask);
        }

        let (tw, th) = self.template_size;
        let mut sums = [0u64; MAX_CHANNELS];
        let mut count = 0u64;
        for y in 0..th {
            let row = template.row(y);
            let mask_row = mask.map(|m| m.row(y));
            for x in 0..tw {
                if mask_row.is_some_and(|m| m[x] == 0) {
                    continue;
                }
                count += 1;
                for (c, sum) in sums.iter_mut().enumerate().take(channels) {
                    *sum += u64::from(row[x * channels + c]);
                }
            }
        }

        let mut means = [0.0f64; MAX_CHANNELS];
        if count > 0 {
            for (mean, &sum) in means.iter_mut().zip(&sums) {
                *mean = sum as f64 / count as f64;
            }
        }

        // Surviving blocks are fully valid, so plain block sums suffice.
        let mut signs = vec![false; channels * blocks.len()];
        for (b, rect) in blocks.iter().enumerate() {
            let block_area = rect.area() as u64;
            let block_sums = block_sum(template, *rect, channels);
            for c in 0..channels {
                signs[c * blocks.len() + b] = block_sums[c] * count > sums[c] * block_area;
            }
        }

        Ok(Reference {
            blocks,
            signs,
            means,
        })
    }

    #[inline]
    fn classify(
        &self,
        x: usize,
        y: usize,
        reference: &Reference,
        max_weak_errors: usize,
        max_diff: f64,
    ) -> u8 {
        let (tw, th) = self.template_size;
        let area = (tw * th) as u64;
        let n_blocks = reference.blocks.len();

        for c in 0..self.integral.channels() {
            let pos_sum = self.integral.sum_channel(x, y, tw, th, c);
            let pos_mean = pos_sum as f64 / area as f64;
            if (pos_mean - reference.means[c]).abs() > max_diff {
                return 0;
            }

            let signs = &reference.signs[c * n_blocks..(c + 1) * n_blocks];
            let mut errors = 0usize;
            for (rect, &expected) in reference.blocks.iter().zip(signs) {
                let block_area = rect.area() as u64;
                let sum = self.integral.sum_channel(
                    x + rect.x as usize,
                    y + rect.y as usize,
                    rect.width as usize,
                    rect.height as usize,
                    c,
                );
                if (sum * area > pos_sum * block_area) != expected {
                    errors += 1;
                    if errors > max_weak_errors {
                        return 0;
                    }
                }
            }
        }
        CANDIDATE
    }
}

fn block_sum(view: ImageView<'_, u8>, rect: Rect, channels: usize) -> [u64; MAX_CHANNELS] {
    let mut out = [0u64; MAX_CHANNELS];
    for y in rect.y as usize..rect.bottom() as usize {
        let row = view.row(y);
        for x in rect.x as usize..rect.right() as usize {
            for (c, sum) in out.iter_mut().enumerate().take(channels) {
                *sum += u64::from(row[x * channels + c]);
            }
        }
    }
    out
}

fn check_channels(channels: usize) -> PatchFillResult<()> {
    if channels == 1 || channels == 3 {
        Ok(())
    } else {
        Err(PatchFillError::UnsupportedChannels {
            expected: "1 or 3",
            got: channels,
        })
    }
}

/// One-shot candidate search of `template` over `image`.
pub fn find_template_match_candidates(
    image: &Image<u8>,
    template: ImageView<'_, u8>,
    mask: Option<ImageView<'_, u8>>,
    config: &CandidateConfig,
) -> PatchFillResult<Mask> {
    let finder = TemplateMatchCandidates::new(image, template.size(), config.partition)?;

    #[cfg(feature = "rayon")]
    if config.parallel {
        return finder.find_candidates_par(
            template,
            mask,
            config.max_weak_errors,
            config.max_mean_difference,
        );
    }

    finder.find_candidates(
        template,
        mask,
        config.max_weak_errors,
        config.max_mean_difference,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(size: usize) -> Image<u8> {
        let data = (0..size * size)
            .map(|i| {
                let (x, y) = (i % size, i / size);
                if (x / 4 + y / 4) % 2 == 0 {
                    30
                } else {
                    220
                }
            })
            .collect();
        Image::new(data, size, size, 1).unwrap()
    }

    #[test]
    fn output_has_one_entry_per_anchor() {
        let img = checker(20);
        let finder = TemplateMatchCandidates::new(&img, (7, 5), (3, 3)).unwrap();
        let tpl = img.view_rect(Rect::new(2, 3, 7, 5));
        let out = finder.find_candidates(tpl, None, 3, 20.0).unwrap();
        assert_eq!(out.size(), (14, 16));
        assert_eq!(out.at(2, 3), CANDIDATE);
    }

    #[test]
    fn flat_region_rejects_textured_template() {
        let mut img = checker(24);
        img.view_rect_mut(Rect::new(12, 12, 12, 12)).fill(30);
        let tpl = img.view_rect(Rect::new(0, 0, 8, 8)).to_image();
        let finder = TemplateMatchCandidates::new(&img, (8, 8), (3, 3)).unwrap();
        let out = finder.find_candidates(tpl.view(), None, 0, 20.0).unwrap();
        assert_eq!(out.at(14, 14), 0);
        assert_eq!(out.at(0, 0), CANDIDATE);
    }

    #[test]
    fn preconditions_are_reported() {
        let img = checker(10);
        assert!(matches!(
            TemplateMatchCandidates::new(&img, (11, 3), (3, 3)),
            Err(PatchFillError::TemplateTooLarge { .. })
        ));
        assert!(matches!(
            TemplateMatchCandidates::new(&img, (3, 3), (0, 3)),
            Err(PatchFillError::InvalidParameter(_))
        ));
        let two = Image::filled(10, 10, 2, 0u8).unwrap();
        assert!(matches!(
            TemplateMatchCandidates::new(&two, (3, 3), (3, 3)),
            Err(PatchFillError::UnsupportedChannels { .. })
        ));

        let finder = TemplateMatchCandidates::new(&img, (3, 3), (3, 3)).unwrap();
        let wrong = img.view_rect(Rect::new(0, 0, 4, 3));
        assert!(finder.find_candidates(wrong, None, 3, 20.0).is_err());
        let tpl = img.view_rect(Rect::new(0, 0, 3, 3));
        let bad_mask = Image::filled(2, 2, 1, 255u8).unwrap();
        assert!(finder
            .find_candidates(tpl, Some(bad_mask.view()), 3, 20.0)
            .is_err());
    }
}
