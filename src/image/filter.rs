//! Dense 3x3 filters and morphology used by the greedy inpainter.

use crate::image::{Image, Mask};

#[inline]
fn replicate(i: isize, n: usize) -> usize {
    i.clamp(0, n as isize - 1) as usize
}

#[inline]
fn reflect101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let mut i = i;
    if i < 0 {
        i = -i;
    }
    if i >= n {
        i = 2 * n - 2 - i;
    }
    i as usize
}

/// 3x3 box blur with mirrored borders, rounded back to 8 bits.
pub fn box_blur_3x3(image: &Image<u8>) -> Image<u8> {
    let (w, h, c) = (image.width(), image.height(), image.channels());
    let mut out = Image::with_shape_of(image, c, 0u8);
    for y in 0..h {
        for x in 0..w {
            for ch in 0..c {
                let mut sum = 0u32;
                for dy in -1isize..=1 {
                    let sy = reflect101(y as isize + dy, h);
                    for dx in -1isize..=1 {
                        let sx = reflect101(x as isize + dx, w);
                        sum += u32::from(image.pixel(sx, sy)[ch]);
                    }
                }
                out.pixel_mut(x, y)[ch] = ((sum + 4) / 9) as u8;
            }
        }
    }
    out
}

/// Per-channel 3x3 Sobel derivatives with replicated borders.
///
/// Returns `(d/dx, d/dy)` with the same channel count as `image`.
pub fn sobel(image: &Image<u8>) -> (Image<f32>, Image<f32>) {
    let (w, h, c) = (image.width(), image.height(), image.channels());
    let mut gx = Image::with_shape_of(image, c, 0.0f32);
    let mut gy = Image::with_shape_of(image, c, 0.0f32);
    for y in 0..h {
        let ym = replicate(y as isize - 1, h);
        let yp = replicate(y as isize + 1, h);
        for x in 0..w {
            let xm = replicate(x as isize - 1, w);
            let xp = replicate(x as isize + 1, w);
            for ch in 0..c {
                let p = |px: usize, py: usize| f32::from(image.pixel(px, py)[ch]);
                let dx = (p(xp, ym) + 2.0 * p(xp, y) + p(xp, yp))
                    - (p(xm, ym) + 2.0 * p(xm, y) + p(xm, yp));
                let dy = (p(xm, yp) + 2.0 * p(x, yp) + p(xp, yp))
                    - (p(xm, ym) + 2.0 * p(x, ym) + p(xp, ym));
                gx.pixel_mut(x, y)[ch] = dx;
                gy.pixel_mut(x, y)[ch] = dy;
            }
        }
    }
    (gx, gy)
}

/// Second-derivative response of a mask, saturated to 8 bits.
///
/// Uses the aperture-3 Laplacian `[2 0 2; 0 -8 0; 2 0 2]` with replicated
/// borders. Negative responses clip to zero, so the result is nonzero only on
/// excluded pixels that touch the included region diagonally, which is the
/// outer ring of the region.
pub fn laplacian_front(mask: &Mask) -> Mask {
    let (w, h) = mask.size();
    let mut out = Image::with_shape_of(mask, 1, 0u8);
    for y in 0..h {
        let ym = replicate(y as isize - 1, h);
        let yp = replicate(y as isize + 1, h);
        for x in 0..w {
            let xm = replicate(x as isize - 1, w);
            let xp = replicate(x as isize + 1, w);
            let corners = i32::from(mask.at(xm, ym))
                + i32::from(mask.at(xp, ym))
                + i32::from(mask.at(xm, yp))
                + i32::from(mask.at(xp, yp));
            let v = 2 * corners - 8 * i32::from(mask.at(x, y));
            out.set(x, y, v.clamp(0, 255) as u8);
        }
    }
    out
}

/// Erosion by a `(2 * half + 1)` square; pixels outside the mask are ignored.
pub fn erode_rect(mask: &Mask, half: usize) -> Mask {
    let (w, h) = mask.size();
    let mut horizontal = Image::with_shape_of(mask, 1, 0u8);
    for y in 0..h {
        let row = mask.row(y);
        for x in 0..w {
            let x0 = x.saturating_sub(half);
            let x1 = (x + half).min(w - 1);
            let v = row[x0..=x1].iter().copied().min().unwrap_or(0);
            horizontal.set(x, y, v);
        }
    }

    let mut out = Image::with_shape_of(mask, 1, 0u8);
    for y in 0..h {
        let y0 = y.saturating_sub(half);
        let y1 = (y + half).min(h - 1);
        for x in 0..w {
            let v = (y0..=y1).map(|yy| horizontal.at(x, yy)).min().unwrap_or(0);
            out.set(x, y, v);
        }
    }
    out
}
