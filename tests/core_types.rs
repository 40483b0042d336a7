mod common;

use patchfill::patch::{
    centered_patch, comparable_patch_regions, is_centered_patch_crossing_boundary, top_left_patch,
};
use patchfill::{Bounds, Image, IntegralImage, Ownership, Point, Rect};

#[test]
fn clamped_patches_stay_inside_the_grid() {
    let img = common::noise(17, 11, 3, 1);
    for cy in -4..15 {
        for cx in -4..21 {
            for half in 0..5 {
                let c = Point::new(cx, cy);
                let patch = centered_patch(&img, c, half, Bounds::Clamped, Ownership::Borrowed);
                let (w, h) = patch.size();
                assert!(w <= 17 && h <= 11);
                let rect = Rect::centered(c, half).clamped(17, 11);
                assert!(rect.is_inside(17, 11));
                let expected = (rect.width.max(0) as usize, rect.height.max(0) as usize);
                assert_eq!(expected, (w, h));
            }
        }
    }
}

#[test]
fn unclamped_equals_clamped_when_inside() {
    let img = common::noise(20, 20, 1, 2);
    for c in 3..17 {
        let p = Point::new(c, 19 - c);
        let a = centered_patch(&img, p, 3, Bounds::Unclamped, Ownership::Copied).into_image();
        let b = centered_patch(&img, p, 3, Bounds::Clamped, Ownership::Copied).into_image();
        assert_eq!(a, b);
        assert_eq!(a.size(), (7, 7));
    }
}

#[test]
fn top_left_patch_clamps_negative_origin() {
    let img = common::noise(8, 8, 1, 3);
    let rect = Rect::new(-2, -1, 4, 4);
    let patch = top_left_patch(&img, rect, Bounds::Clamped, Ownership::Borrowed);
    assert_eq!(patch.size(), (2, 3));
    assert_eq!(patch.view().pixel(0, 0), img.pixel(0, 0));
}

#[test]
fn comparable_regions_of_interior_point_are_full_patches() {
    let img = common::noise(30, 30, 3, 4);
    let p = Point::new(10, 12);
    let (a, b) = comparable_patch_regions(&img, &img, p, p, 4);
    assert_eq!(a, b);
    assert_eq!(a, Rect::new(6, 8, 9, 9));
    assert!(!is_centered_patch_crossing_boundary(p, 4, &img));
}

#[test]
fn integral_sums_match_direct_accumulation() {
    let mut img = Image::filled(4, 4, 3, 0u8).unwrap();
    for px in img.data_mut().chunks_exact_mut(3) {
        px.copy_from_slice(&[1, 2, 3]);
    }
    let integral = IntegralImage::from_image(&img);
    assert_eq!(integral.rect_sum(Rect::new(0, 0, 2, 2)), [4, 8, 12]);
    assert_eq!(integral.rect_sum(Rect::new(1, 1, 3, 3)), [9, 18, 27]);

    let noisy = common::noise(23, 17, 3, 5);
    let integral = IntegralImage::from_image(&noisy);
    let mut direct = [0u64; 3];
    for px in noisy.data().chunks_exact(3) {
        for c in 0..3 {
            direct[c] += u64::from(px[c]);
        }
    }
    assert_eq!(integral.rect_sum(Rect::new(0, 0, 23, 17)), direct);
}
