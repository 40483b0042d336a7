mod common;

use patchfill::candidate::CANDIDATE;
use patchfill::{
    find_template_match_candidates, CandidateConfig, Image, Rect, TemplateMatchCandidates,
};

#[test]
fn template_cut_from_image_is_its_own_candidate() {
    let img = common::random_lines(120, 90, 25, 10);
    let finder = TemplateMatchCandidates::new(&img, (15, 15), (3, 3)).unwrap();
    for &(x, y) in &[(0, 0), (17, 40), (60, 12), (105, 75), (52, 53)] {
        let tpl = img.view_rect(Rect::new(x, y, 15, 15));
        let (ux, uy) = (x as usize, y as usize);
        let out = finder.find_candidates(tpl, None, 3, 20.0).unwrap();
        assert_eq!(out.at(ux, uy), CANDIDATE, "anchor ({x}, {y})");
        let strict = finder.find_candidates(tpl, None, 0, 0.0).unwrap();
        assert_eq!(strict.at(ux, uy), CANDIDATE);
    }
}

#[test]
fn more_tolerance_never_loses_candidates() {
    let img = common::noise(80, 60, 3, 11);
    let tpl = img.view_rect(Rect::new(30, 20, 12, 12)).to_image();
    let finder = TemplateMatchCandidates::new(&img, (12, 12), (3, 3)).unwrap();

    let mut previous: Option<Image<u8>> = None;
    for max_weak in 0..6 {
        let out = finder
            .find_candidates(tpl.view(), None, max_weak, 20.0)
            .unwrap();
        if let Some(prev) = &previous {
            for (a, b) in prev.data().iter().zip(out.data()) {
                assert!(*a == 0 || *b == CANDIDATE);
            }
            assert!(out.count_nonzero() >= prev.count_nonzero());
        }
        previous = Some(out);
    }
}

#[test]
fn smooth_gradient_rejects_most_positions() {
    let size = 200;
    let data = (0..size * size)
        .map(|i| (((i % size) + (i / size)) / 2) as u8)
        .collect();
    let img = Image::new(data, size, size, 1).unwrap();
    let tpl = img.view_rect(Rect::new(50, 70, 16, 16));
    let config = CandidateConfig {
        max_mean_difference: 10.0,
        ..CandidateConfig::default()
    };
    let out = find_template_match_candidates(&img, tpl, None, &config).unwrap();

    assert_eq!(out.size(), (185, 185));
    assert_eq!(out.at(50, 70), CANDIDATE);
    let total = out.width() * out.height();
    let rejected = total - out.count_nonzero();
    assert!(rejected * 4 >= total * 3, "rejected {rejected} of {total}");
}

#[test]
fn masked_pixels_do_not_influence_the_result() {
    let img = common::random_lines(64, 64, 12, 12);
    let clean = img.view_rect(Rect::new(20, 20, 9, 9)).to_image();
    let mut corrupted = clean.clone();
    corrupted.view_rect_mut(Rect::new(0, 0, 3, 3)).fill(0);
    let mask = Image::mask_from_fn(9, 9, |x, y| x >= 3 || y >= 3).unwrap();

    let finder = TemplateMatchCandidates::new(&img, (9, 9), (3, 3)).unwrap();
    let a = finder
        .find_candidates(clean.view(), Some(mask.view()), 2, 30.0)
        .unwrap();
    let b = finder
        .find_candidates(corrupted.view(), Some(mask.view()), 2, 30.0)
        .unwrap();
    assert_eq!(a.size(), (56, 56));
    assert_eq!(a, b);
}
