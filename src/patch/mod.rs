//! Patch extraction.
//!
//! A patch is a rectangular view into an image or a scalar field, addressed
//! either by its top-left corner or by a center and half-size. Two orthogonal
//! choices control extraction:
//!
//! - [`Bounds`]: `Unclamped` trusts the caller to stay inside the grid (and
//!   panics otherwise); `Clamped` shrinks each side against the grid border,
//!   possibly down to zero area.
//! - [`Ownership`]: `Borrowed` shares the parent's storage; `Copied` returns an
//!   independent buffer.

mod rect;

pub use rect::{Point, Rect};

use crate::image::{Image, ImageView, ImageViewMut};

/// Border policy for patch extraction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Bounds {
    /// Caller guarantees the rectangle is inside the grid.
    #[default]
    Unclamped,
    /// Rectangle is clipped against the grid borders.
    Clamped,
}

/// Storage policy for patch extraction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Ownership {
    /// The patch aliases the parent grid.
    #[default]
    Borrowed,
    /// The patch owns a copy of the pixels.
    Copied,
}

/// Extracted patch, either borrowed from its parent or copied out of it.
#[derive(Clone, Debug)]
pub enum Patch<'a, T> {
    Borrowed(ImageView<'a, T>),
    Copied(Image<T>),
}

impl<T: Copy> Patch<'_, T> {
    /// Returns a view of the patch pixels.
    pub fn view(&self) -> ImageView<'_, T> {
        match self {
            Patch::Borrowed(view) => *view,
            Patch::Copied(img) => img.view(),
        }
    }

    /// Returns `(width, height)`.
    pub fn size(&self) -> (usize, usize) {
        self.view().size()
    }

    /// Returns true if the patch covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.view().is_empty()
    }

    /// Converts the patch into an owned image, copying if borrowed.
    pub fn into_image(self) -> Image<T> {
        match self {
            Patch::Borrowed(view) => view.to_image(),
            Patch::Copied(img) => img,
        }
    }
}

/// Resolves the rectangle a top-left patch request covers under `bounds`.
pub fn top_left_rect<T: Copy>(image: &Image<T>, rect: Rect, bounds: Bounds) -> Rect {
    match bounds {
        Bounds::Unclamped => rect,
        Bounds::Clamped => rect.clamped(image.width(), image.height()),
    }
}

/// Resolves the rectangle a centered patch request covers under `bounds`.
pub fn centered_rect<T: Copy>(image: &Image<T>, center: Point, half: i32, bounds: Bounds) -> Rect {
    top_left_rect(image, Rect::centered(center, half), bounds)
}

/// Returns the patch whose top-left corner and size are given by `rect`.
pub fn top_left_patch<T: Copy>(
    image: &Image<T>,
    rect: Rect,
    bounds: Bounds,
    ownership: Ownership,
) -> Patch<'_, T> {
    let rect = top_left_rect(image, rect, bounds);
    let view = image.view_rect(rect);
    match ownership {
        Ownership::Borrowed => Patch::Borrowed(view),
        Ownership::Copied => Patch::Copied(view.to_image()),
    }
}

/// Returns the `(2 * half + 1)`-sided patch centered on `center`.
pub fn centered_patch<T: Copy>(
    image: &Image<T>,
    center: Point,
    half: i32,
    bounds: Bounds,
    ownership: Ownership,
) -> Patch<'_, T> {
    top_left_patch(image, Rect::centered(center, half), bounds, ownership)
}

/// Returns a writable centered patch aliasing `image`.
pub fn centered_patch_mut<T: Copy>(
    image: &mut Image<T>,
    center: Point,
    half: i32,
    bounds: Bounds,
) -> ImageViewMut<'_, T> {
    let rect = centered_rect(image, center, half, bounds);
    image.view_rect_mut(rect)
}

/// Computes twin rectangles for comparing a patch around `ap` in `a` with a
/// patch around `bp` in `b`.
///
/// Both rectangles have the same size, stay inside their own image and sit at
/// the same offset from their respective centers. Each side shrinks
/// independently, so the size may be smaller than `2 * half + 1`; a zero-area
/// result means the patches have no comparable overlap.
pub fn comparable_patch_regions<A: Copy, B: Copy>(
    a: &Image<A>,
    b: &Image<B>,
    ap: Point,
    bp: Point,
    half: i32,
) -> (Rect, Rect) {
    let left = (-half).max(-ap.x).max(-bp.x);
    let right = (half + 1)
        .min(a.width() as i32 - ap.x)
        .min(b.width() as i32 - bp.x);
    let top = (-half).max(-ap.y).max(-bp.y);
    let bottom = (half + 1)
        .min(a.height() as i32 - ap.y)
        .min(b.height() as i32 - bp.y);

    let width = (right - left).max(0);
    let height = (bottom - top).max(0);
    (
        Rect::new(ap.x + left, ap.y + top, width, height),
        Rect::new(bp.x + left, bp.y + top, width, height),
    )
}

/// Returns true if the unclamped centered patch around `p` leaves `image`.
pub fn is_centered_patch_crossing_boundary<T: Copy>(p: Point, half: i32, image: &Image<T>) -> bool {
    p.x < half
        || p.x >= image.width() as i32 - half
        || p.y < half
        || p.y >= image.height() as i32 - half
}
