//! Fill-front maintenance and priority selection.

use crate::image::filter::{box_blur_3x3, laplacian_front, sobel};
use crate::image::gradient::normalized_gradient;
use crate::image::{Image, Mask};
use crate::patch::{Point, Rect};

const DATA_EPSILON: f32 = 1e-4;

/// Isophote field `(x, y)` of the blurred image, channel-averaged and scaled
/// to unit intensity range.
pub(crate) fn isophotes(image: &Image<u8>) -> (Image<f32>, Image<f32>) {
    let blurred = box_blur_3x3(image);
    let (gx, gy) = sobel(&blurred);
    let channels = image.channels();
    let scale = 1.0 / (channels as f32 * 255.0);

    let mut iso_x = Image::with_shape_of(image, 1, 0.0f32);
    let mut iso_y = Image::with_shape_of(image, 1, 0.0f32);
    for y in 0..image.height() {
        for x in 0..image.width() {
            let dx: f32 = gx.pixel(x, y).iter().sum::<f32>() * scale;
            let dy: f32 = gy.pixel(x, y).iter().sum::<f32>() * scale;
            iso_x.set(x, y, -dy);
            iso_y.set(x, y, dx);
        }
    }
    (iso_x, iso_y)
}

/// Recomputes the fill front inside `[margin, size - margin)` and refreshes
/// the confidence of every front pixel in raster order.
///
/// Each refreshed value is the mean confidence of the clamped patch of
/// `half_patch` around the pixel, read after earlier front pixels were
/// already updated.
pub(crate) fn update_fill_front(
    target: &Mask,
    confidence: &mut Image<f32>,
    half_patch: usize,
    margin: usize,
) -> Vec<Point> {
    let border = laplacian_front(target);
    let (w, h) = target.size();
    let mut front = Vec::new();

    for y in margin..h.saturating_sub(margin) {
        for x in margin..w.saturating_sub(margin) {
            if border.at(x, y) == 0 {
                continue;
            }
            let p = Point::new(x as i32, y as i32);
            let rect = Rect::centered(p, half_patch as i32).clamped(w, h);
            confidence.set(x, y, patch_mean(confidence, rect));
            front.push(p);
        }
    }
    front
}

fn patch_mean(field: &Image<f32>, rect: Rect) -> f32 {
    let area = rect.area();
    if area == 0 {
        return 0.0;
    }
    let view = field.view_rect(rect);
    let sum: f32 = (0..view.height())
        .map(|y| view.row(y).iter().sum::<f32>())
        .sum();
    sum / area as f32
}

/// Returns the front pixel with the highest `confidence * data` priority.
///
/// The data term is the alignment between the front normal and the isophote.
/// Ties keep the first pixel in raster order.
pub(crate) fn select_target(
    front: &[Point],
    target: &Mask,
    confidence: &Image<f32>,
    iso_x: &Image<f32>,
    iso_y: &Image<f32>,
) -> Option<Point> {
    let mut best: Option<(f32, Point)> = None;
    for &p in front {
        let (x, y) = (p.x as usize, p.y as usize);
        let (nx, ny) = normalized_gradient(target, x, y);
        let data = (nx * iso_x.at(x, y) + ny * iso_y.at(x, y)).abs() + DATA_EPSILON;
        let priority = confidence.at(x, y) * data;
        match best {
            Some((max, _)) if priority <= max => {}
            _ => best = Some((priority, p)),
        }
    }
    best.map(|(_, p)| p)
}
