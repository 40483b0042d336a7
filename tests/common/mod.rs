//! Synthetic images shared by the integration tests.
#![allow(dead_code)]

use patchfill::{Image, Mask};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// White RGB canvas covered with `count` random thick colored lines.
pub fn random_lines(width: usize, height: usize, count: usize, seed: u64) -> Image<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut img = Image::filled(width, height, 3, 255u8).unwrap();
    for _ in 0..count {
        let (x0, y0) = (rng.random_range(0..width) as f32, rng.random_range(0..height) as f32);
        let (x1, y1) = (rng.random_range(0..width) as f32, rng.random_range(0..height) as f32);
        let color = [
            rng.random_range(0..=255u8),
            rng.random_range(0..=255u8),
            rng.random_range(0..=255u8),
        ];
        let radius = rng.random_range(1..=2i32);
        let steps = ((x1 - x0).abs().max((y1 - y0).abs()) * 2.0) as usize + 1;
        for s in 0..=steps {
            let t = s as f32 / steps as f32;
            let cx = (x0 + (x1 - x0) * t).round() as i32;
            let cy = (y0 + (y1 - y0) * t).round() as i32;
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let (px, py) = (cx + dx, cy + dy);
                    if px >= 0 && py >= 0 && (px as usize) < width && (py as usize) < height {
                        let dst = img.pixel_mut(px as usize, py as usize);
                        dst.copy_from_slice(&color);
                    }
                }
            }
        }
    }
    img
}

/// Uniform noise with `channels` channels.
pub fn noise(width: usize, height: usize, channels: usize, seed: u64) -> Image<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let len = width * height * channels;
    let data = (0..len).map(|_| rng.random()).collect();
    Image::new(data, width, height, channels).unwrap()
}

/// `out(x, y) = img(x - dx, y - dy)`; uncovered pixels keep `fill`.
pub fn shifted(img: &Image<u8>, dx: usize, dy: usize, fill: u8) -> Image<u8> {
    let mut out = Image::filled(img.width(), img.height(), img.channels(), fill).unwrap();
    for y in dy..img.height() {
        for x in dx..img.width() {
            let src = img.pixel(x - dx, y - dy);
            out.pixel_mut(x, y).copy_from_slice(src);
        }
    }
    out
}

/// Mask with `255` inside the axis-aligned box `[x0, x0 + w) x [y0, y0 + h)`.
pub fn box_mask(width: usize, height: usize, x0: usize, y0: usize, w: usize, h: usize) -> Mask {
    Image::mask_from_fn(width, height, |x, y| {
        (x0..x0 + w).contains(&x) && (y0..y0 + h).contains(&y)
    })
    .unwrap()
}

/// Mean absolute per-channel difference over `[x0, x1) x [y0, y1)`.
pub fn mean_abs_diff(
    a: &Image<u8>,
    b: &Image<u8>,
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
) -> f64 {
    let mut acc = 0u64;
    let mut n = 0u64;
    for y in y0..y1 {
        for x in x0..x1 {
            for (p, q) in a.pixel(x, y).iter().zip(b.pixel(x, y)) {
                acc += u64::from(p.abs_diff(*q));
                n += 1;
            }
        }
    }
    acc as f64 / n as f64
}
