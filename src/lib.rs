//! Patchfill reconstructs missing image regions from the rest of the image.
//!
//! The crate provides two algorithmic cores on top of shared patch and
//! integral-image utilities:
//!
//! - [`ExemplarInpainter`]: greedy, priority-driven exemplar inpainting that
//!   fills a masked region one patch at a time.
//! - [`PatchMatcher`]: randomized dense correspondence search (PatchMatch)
//!   between a source and a target image.
//!
//! [`TemplateMatchCandidates`] is the weak-classifier prefilter the
//! inpainter uses to skip unlikely source positions; it is also usable on its
//! own. Parallel scans are available through the `rayon` feature, image
//! loading through `image-io`, and spans/events through `tracing`.

pub mod candidate;
pub mod image;
pub mod inpaint;
pub mod patch;
pub mod patch_match;
mod trace;
pub mod util;

pub use candidate::{find_template_match_candidates, CandidateConfig, TemplateMatchCandidates};
pub use image::integral::IntegralImage;
pub use image::{Image, ImageView, ImageViewMut, Mask};
pub use inpaint::{inpaint, inpaint_with_config, ExemplarInpainter, InpaintConfig, StepReport};
pub use patch::{Bounds, Ownership, Patch, Point, Rect};
pub use patch_match::{
    compute_correspondence, CorrespondenceField, CorrespondenceSearch, Norm, PatchMatchConfig,
    PatchMatcher, Prior,
};
pub use util::{PatchFillError, PatchFillResult};
