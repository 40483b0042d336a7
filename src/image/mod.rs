//! Owned images and borrowed views.
//!
//! `Image<T>` stores interleaved channels in row-major order without padding.
//! `ImageView` and `ImageViewMut` borrow a rectangular region of an image and
//! keep the parent's stride, so a view over a sub-rectangle is zero-copy and
//! writes through `ImageViewMut` land in the parent buffer.

use crate::patch::Rect;
use crate::util::{PatchFillError, PatchFillResult};

pub mod filter;
pub mod gradient;
pub mod integral;
#[cfg(feature = "image-io")]
pub mod io;

/// Single-channel 8-bit mask; `0` is excluded, any other value is included.
pub type Mask = Image<u8>;

/// Owned 2D grid with interleaved channels.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T> {
    data: Vec<T>,
    width: usize,
    height: usize,
    channels: usize,
}

impl<T: Copy> Image<T> {
    /// Wraps a contiguous buffer of `width * height * channels` elements.
    pub fn new(
        data: Vec<T>,
        width: usize,
        height: usize,
        channels: usize,
    ) -> PatchFillResult<Self> {
        let needed = required_len(width, height, channels)?;
        if data.len() < needed {
            return Err(PatchFillError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(PatchFillError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Creates an image with every element set to `value`.
    pub fn filled(width: usize, height: usize, channels: usize, value: T) -> PatchFillResult<Self> {
        let needed = required_len(width, height, channels)?;
        Ok(Self {
            data: vec![value; needed],
            width,
            height,
            channels,
        })
    }

    /// Creates an image with the spatial size of `other`.
    pub fn with_shape_of<U>(other: &Image<U>, channels: usize, value: T) -> Self {
        Self {
            data: vec![value; other.width * other.height * channels],
            width: other.width,
            height: other.height,
            channels,
        }
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of interleaved channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns `(width, height)`.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns true when `other` has the same width and height.
    pub fn same_size<U>(&self, other: &Image<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Returns the backing buffer.
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Returns the backing buffer mutably.
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Returns the channel values of pixel `(x, y)`.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &[T] {
        let start = (y * self.width + x) * self.channels;
        &self.data[start..start + self.channels]
    }

    /// Returns the channel values of pixel `(x, y)` mutably.
    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [T] {
        let start = (y * self.width + x) * self.channels;
        &mut self.data[start..start + self.channels]
    }

    /// Returns the first channel of pixel `(x, y)`.
    #[inline]
    pub fn at(&self, x: usize, y: usize) -> T {
        self.data[(y * self.width + x) * self.channels]
    }

    /// Sets every channel of pixel `(x, y)`.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.pixel_mut(x, y).fill(value);
    }

    /// Returns row `y` including all channels.
    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        let stride = self.width * self.channels;
        &self.data[y * stride..(y + 1) * stride]
    }

    /// Returns row `y` mutably.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let stride = self.width * self.channels;
        &mut self.data[y * stride..(y + 1) * stride]
    }

    /// Sets every element to `value`.
    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }

    /// Returns the full-image view.
    pub fn view(&self) -> ImageView<'_, T> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            channels: self.channels,
            stride: self.width * self.channels,
        }
    }

    /// Returns a view over `rect`, or `None` if it leaves the image.
    pub fn try_view_rect(&self, rect: Rect) -> Option<ImageView<'_, T>> {
        let (start, end) = self.rect_span(rect)?;
        Some(ImageView {
            data: &self.data[start..end],
            width: rect.width as usize,
            height: rect.height as usize,
            channels: self.channels,
            stride: self.width * self.channels,
        })
    }

    /// Returns a view over `rect`. Panics if `rect` leaves the image.
    pub fn view_rect(&self, rect: Rect) -> ImageView<'_, T> {
        self.try_view_rect(rect)
            .expect("patch rectangle within image bounds")
    }

    /// Returns a mutable view over `rect`. Panics if `rect` leaves the image.
    pub fn view_rect_mut(&mut self, rect: Rect) -> ImageViewMut<'_, T> {
        let (start, end) = self
            .rect_span(rect)
            .expect("patch rectangle within image bounds");
        let stride = self.width * self.channels;
        ImageViewMut {
            data: &mut self.data[start..end],
            width: rect.width as usize,
            height: rect.height as usize,
            channels: self.channels,
            stride,
        }
    }

    /// Copies pixels from `src` to `dst` wherever `mask` is nonzero.
    ///
    /// Both rectangles and the mask must share a size. Pixels are copied one
    /// at a time, so overlapping rectangles are allowed as long as no masked
    /// destination pixel is also read as a source afterwards.
    pub fn copy_rect_masked(&mut self, src: Rect, dst: Rect, mask: ImageView<'_, u8>) {
        debug_assert_eq!((src.width, src.height), (dst.width, dst.height));
        debug_assert_eq!(mask.size(), (dst.width as usize, dst.height as usize));
        if mask.is_empty() {
            return;
        }
        let c = self.channels;
        for dy in 0..mask.height() {
            let mask_row = mask.row(dy);
            for dx in 0..mask.width() {
                if mask_row[dx] == 0 {
                    continue;
                }
                let s = ((src.y as usize + dy) * self.width + src.x as usize + dx) * c;
                let d = ((dst.y as usize + dy) * self.width + dst.x as usize + dx) * c;
                self.data.copy_within(s..s + c, d);
            }
        }
    }

    /// Writes `value` into every channel of `rect` wherever `mask` is nonzero.
    pub fn fill_rect_masked(&mut self, rect: Rect, value: T, mask: ImageView<'_, u8>) {
        if mask.is_empty() {
            return;
        }
        let mut view = self.view_rect_mut(rect);
        for dy in 0..mask.height() {
            let mask_row = mask.row(dy);
            for (dx, &m) in mask_row.iter().enumerate() {
                if m != 0 {
                    view.pixel_mut(dx, dy).fill(value);
                }
            }
        }
    }

    fn rect_span(&self, rect: Rect) -> Option<(usize, usize)> {
        if rect.x < 0 || rect.y < 0 || rect.width < 0 || rect.height < 0 {
            return None;
        }
        let (x, y) = (rect.x as usize, rect.y as usize);
        let (w, h) = (rect.width as usize, rect.height as usize);
        if x + w > self.width || y + h > self.height {
            return None;
        }
        if w == 0 || h == 0 {
            return Some((0, 0));
        }
        let stride = self.width * self.channels;
        let start = y * stride + x * self.channels;
        let end = start + (h - 1) * stride + w * self.channels;
        Some((start, end))
    }
}

impl Image<u8> {
    /// Counts pixels whose first channel is nonzero.
    pub fn count_nonzero(&self) -> usize {
        self.data
            .chunks_exact(self.channels)
            .filter(|px| px[0] != 0)
            .count()
    }

    /// Returns a single-channel mask with `255` where `keep` is true.
    pub fn mask_from_fn(
        width: usize,
        height: usize,
        keep: impl Fn(usize, usize) -> bool,
    ) -> PatchFillResult<Self> {
        let mut mask = Self::filled(width, height, 1, 0)?;
        for y in 0..height {
            for x in 0..width {
                if keep(x, y) {
                    mask.data[y * width + x] = 255;
                }
            }
        }
        Ok(mask)
    }
}

/// Borrowed rectangular view into an image.
#[derive(Copy, Clone, Debug)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
}

impl<'a, T: Copy> ImageView<'a, T> {
    /// Returns the view width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the view height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the number of channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns `(width, height)`.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns true if the view covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Returns row `y` of the view, `width * channels` elements long.
    #[inline]
    pub fn row(&self, y: usize) -> &'a [T] {
        let start = y * self.stride;
        &self.data[start..start + self.width * self.channels]
    }

    /// Returns the channel values of pixel `(x, y)` relative to the view.
    #[inline]
    pub fn pixel(&self, x: usize, y: usize) -> &'a [T] {
        let start = y * self.stride + x * self.channels;
        &self.data[start..start + self.channels]
    }

    /// Copies the view into an independent image.
    pub fn to_image(&self) -> Image<T> {
        let mut data = Vec::with_capacity(self.width * self.height * self.channels);
        if !self.is_empty() {
            for y in 0..self.height {
                data.extend_from_slice(self.row(y));
            }
        }
        Image {
            data,
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }
}

impl ImageView<'_, u8> {
    /// Counts pixels whose first channel is nonzero.
    pub fn count_nonzero(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (0..self.height)
            .map(|y| {
                self.row(y)
                    .chunks_exact(self.channels)
                    .filter(|px| px[0] != 0)
                    .count()
            })
            .sum()
    }
}

/// Mutable rectangular view into an image.
#[derive(Debug)]
pub struct ImageViewMut<'a, T> {
    data: &'a mut [T],
    width: usize,
    height: usize,
    channels: usize,
    stride: usize,
}

impl<T: Copy> ImageViewMut<'_, T> {
    /// Returns `(width, height)`.
    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Returns row `y` of the view mutably.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let start = y * self.stride;
        &mut self.data[start..start + self.width * self.channels]
    }

    /// Returns pixel `(x, y)` relative to the view mutably.
    #[inline]
    pub fn pixel_mut(&mut self, x: usize, y: usize) -> &mut [T] {
        let start = y * self.stride + x * self.channels;
        &mut self.data[start..start + self.channels]
    }

    /// Sets every element of the view to `value`.
    pub fn fill(&mut self, value: T) {
        if self.width == 0 {
            return;
        }
        for y in 0..self.height {
            self.row_mut(y).fill(value);
        }
    }
}

fn required_len(width: usize, height: usize, channels: usize) -> PatchFillResult<usize> {
    if width == 0 || height == 0 {
        return Err(PatchFillError::InvalidDimensions { width, height });
    }
    if channels == 0 {
        return Err(PatchFillError::UnsupportedChannels {
            expected: "at least 1",
            got: channels,
        });
    }
    width
        .checked_mul(height)
        .and_then(|v| v.checked_mul(channels))
        .ok_or(PatchFillError::InvalidDimensions { width, height })
}
