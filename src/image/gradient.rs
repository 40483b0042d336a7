//! Sparse Sobel gradients evaluated at single pixels.

use crate::image::Image;
use crate::util::math::normalize2;

/// Sobel gradient `(d/dx, d/dy)` of the first channel at `(x, y)`.
///
/// The 3x3 neighbourhood must lie inside the image; pixels on the outermost
/// ring yield a zero gradient.
pub fn gradient(image: &Image<u8>, x: usize, y: usize) -> (f32, f32) {
    let (w, h) = image.size();
    if x == 0 || y == 0 || x + 1 >= w || y + 1 >= h {
        return (0.0, 0.0);
    }
    let p = |px: usize, py: usize| f32::from(image.at(px, py));
    let gx = (p(x + 1, y - 1) + 2.0 * p(x + 1, y) + p(x + 1, y + 1))
        - (p(x - 1, y - 1) + 2.0 * p(x - 1, y) + p(x - 1, y + 1));
    let gy = (p(x - 1, y + 1) + 2.0 * p(x, y + 1) + p(x + 1, y + 1))
        - (p(x - 1, y - 1) + 2.0 * p(x, y - 1) + p(x + 1, y - 1));
    (gx, gy)
}

/// Unit-length Sobel gradient at `(x, y)`; flat neighbourhoods give `(0, 0)`.
pub fn normalized_gradient(image: &Image<u8>, x: usize, y: usize) -> (f32, f32) {
    let (gx, gy) = gradient(image, x, y);
    normalize2(gx, gy)
}
