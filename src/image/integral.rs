//! Integral images for constant-time rectangle sums.
//!
//! For a `W x H` image the integral has `(W + 1) x (H + 1)` entries per
//! channel; entry `(x, y)` holds the sum of all source pixels with column `< x`
//! and row `< y`. Queries use four-corner inclusion-exclusion and perform no
//! bounds checking beyond what slice indexing does.

use crate::image::{Image, ImageView};
use crate::patch::Rect;

/// Upper bound on channels handled by the pixel-level algorithms.
pub const MAX_CHANNELS: usize = 3;

/// Per-channel rectangle sums; entries past `channels()` are zero.
pub type ChannelSums = [u64; MAX_CHANNELS];

/// Per-channel prefix-sum table of an 8-bit image.
#[derive(Clone, Debug)]
pub struct IntegralImage {
    sums: Vec<u64>,
    width: usize,
    height: usize,
    channels: usize,
}

impl IntegralImage {
    /// Builds the integral of `image`.
    pub fn new(image: ImageView<'_, u8>) -> Self {
        let channels = image.channels();
        let width = image.width() + 1;
        let height = image.height() + 1;
        let stride = width * channels;
        let mut sums = vec![0u64; stride * height];

        if !image.is_empty() {
            let mut running = vec![0u64; channels];
            for y in 0..image.height() {
                running.fill(0);
                let src = image.row(y);
                let (prev, cur) = sums.split_at_mut((y + 1) * stride);
                let prev = &prev[y * stride..];
                let cur = &mut cur[..stride];
                for x in 0..image.width() {
                    for c in 0..channels {
                        running[c] += u64::from(src[x * channels + c]);
                        let idx = (x + 1) * channels + c;
                        cur[idx] = prev[idx] + running[c];
                    }
                }
            }
        }

        Self {
            sums,
            width,
            height,
            channels,
        }
    }

    /// Builds the integral of an owned image.
    pub fn from_image(image: &Image<u8>) -> Self {
        Self::new(image.view())
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Size of the source image, `(W, H)`.
    pub fn source_size(&self) -> (usize, usize) {
        (self.width - 1, self.height - 1)
    }

    #[inline]
    fn at(&self, x: usize, y: usize, c: usize) -> u64 {
        self.sums[(y * self.width + x) * self.channels + c]
    }

    /// Sum of channel `c` over the `w x h` rectangle anchored at `(x, y)`.
    #[inline]
    pub fn sum_channel(&self, x: usize, y: usize, w: usize, h: usize, c: usize) -> u64 {
        let (x1, y1) = (x + w, y + h);
        self.at(x1, y1, c) + self.at(x, y, c) - self.at(x, y1, c) - self.at(x1, y, c)
    }

    /// Per-channel sums over `rect`.
    ///
    /// The rectangle must lie inside the source image.
    pub fn rect_sum(&self, rect: Rect) -> ChannelSums {
        let mut out = [0u64; MAX_CHANNELS];
        if rect.is_empty() {
            return out;
        }
        let (x, y) = (rect.x as usize, rect.y as usize);
        let (w, h) = (rect.width as usize, rect.height as usize);
        for (c, slot) in out.iter_mut().enumerate().take(self.channels) {
            *slot = self.sum_channel(x, y, w, h, c);
        }
        out
    }

    /// Per-channel means over `rect`; zero for an empty rectangle.
    pub fn rect_mean(&self, rect: Rect) -> [f64; MAX_CHANNELS] {
        let area = rect.area();
        let sums = self.rect_sum(rect);
        let mut out = [0.0f64; MAX_CHANNELS];
        if area == 0 {
            return out;
        }
        for (slot, sum) in out.iter_mut().zip(sums) {
            *slot = sum as f64 / area as f64;
        }
        out
    }
}
