mod common;

use patchfill::{inpaint, ExemplarInpainter, Image, InpaintConfig, PatchFillError};

#[test]
fn empty_target_returns_the_input() {
    let img = common::random_lines(60, 50, 12, 1);
    let target = Image::filled(60, 50, 1, 0u8).unwrap();
    assert_eq!(inpaint(&img, &target, None, 9).unwrap(), img);
}

#[test]
fn border_only_target_has_no_steps() {
    let img = common::random_lines(60, 50, 12, 2);
    let mut inp = ExemplarInpainter::new();
    inp.set_source_image(img.clone());
    // patch size 9 trims a 5 pixel band
    inp.set_target_mask(common::box_mask(60, 50, 0, 0, 60, 5));
    inp.set_patch_size(9);
    inp.initialize().unwrap();
    assert!(!inp.has_more_steps());
    assert_eq!(inp.image(), Some(&img));

    inp.set_target_mask(common::box_mask(60, 50, 0, 0, 60, 6));
    inp.initialize().unwrap();
    assert!(inp.has_more_steps());
}

#[test]
fn fill_strictly_shrinks_and_terminates() {
    let img = common::random_lines(80, 64, 20, 3);
    let target = common::box_mask(80, 64, 30, 25, 14, 10);
    let mut inp = ExemplarInpainter::new();
    inp.set_source_image(img.clone());
    inp.set_target_mask(target.clone());
    inp.set_patch_size(7);
    inp.initialize().unwrap();

    let initial = inp.target_region().unwrap().count_nonzero();
    assert_eq!(initial, 140);
    let mut remaining = initial;
    let mut steps = 0;
    while inp.has_more_steps() {
        inp.step().unwrap();
        let now = inp.target_region().unwrap().count_nonzero();
        assert!(now < remaining);
        remaining = now;
        steps += 1;
        assert!(steps <= initial);
    }

    let out = inp.image().unwrap();
    for y in 0..64 {
        for x in 0..80 {
            if target.at(x, y) == 0 {
                assert_eq!(out.pixel(x, y), img.pixel(x, y));
            }
        }
    }
}

#[test]
fn source_mask_limits_where_content_comes_from() {
    let img = common::random_lines(80, 60, 15, 4);
    let target = common::box_mask(80, 60, 50, 20, 10, 10);
    let source = common::box_mask(80, 60, 0, 0, 40, 60);
    let mut inp = ExemplarInpainter::new();
    inp.set_source_image(img);
    inp.set_target_mask(target);
    inp.set_source_mask(source);
    inp.set_patch_size(5);
    inp.initialize().unwrap();
    while inp.has_more_steps() {
        let report = inp.step().unwrap();
        assert!(report.source.x < 40, "copied from {:?}", report.source);
    }
}

#[test]
fn disabling_the_filter_still_fills_everything() {
    let img = common::random_lines(50, 50, 10, 5);
    let target = common::box_mask(50, 50, 20, 20, 8, 8);
    let config = InpaintConfig {
        patch_size: 5,
        use_candidate_filter: false,
        ..InpaintConfig::default()
    };
    let mut inp = ExemplarInpainter::with_config(config);
    inp.set_source_image(img);
    inp.set_target_mask(target);
    inp.initialize().unwrap();
    let steps = inp.run().unwrap();
    assert!(steps > 0);
    assert_eq!(inp.target_region().unwrap().count_nonzero(), 0);
}

#[test]
fn preconditions_fail_at_initialize() {
    let img = common::random_lines(40, 40, 5, 6);
    let mut inp = ExemplarInpainter::new();
    inp.set_source_image(img.clone());
    inp.set_target_mask(Image::filled(39, 40, 1, 0u8).unwrap());
    assert!(matches!(
        inp.initialize(),
        Err(PatchFillError::SizeMismatch { .. })
    ));

    inp.set_target_mask(Image::filled(40, 40, 1, 0u8).unwrap());
    inp.set_patch_size(0);
    assert!(matches!(
        inp.initialize(),
        Err(PatchFillError::InvalidParameter(_))
    ));

    let gray = common::noise(40, 40, 1, 7);
    let empty = Image::filled(40, 40, 1, 0u8).unwrap();
    let err = inpaint(&gray, &empty, None, 9).unwrap_err();
    assert!(err.is_precondition());

    let mut fresh = ExemplarInpainter::new();
    assert_eq!(fresh.step().unwrap_err(), PatchFillError::NotInitialized);
}
