#![cfg(feature = "rayon")]

mod common;

use patchfill::{
    compute_correspondence, find_template_match_candidates, inpaint_with_config, CandidateConfig,
    ExemplarInpainter, InpaintConfig, PatchMatchConfig, Prior, Rect,
};

#[test]
fn parallel_candidates_match_sequential() {
    let img = common::random_lines(96, 80, 20, 40);
    let tpl = img.view_rect(Rect::new(33, 21, 13, 13));
    let seq = find_template_match_candidates(&img, tpl, None, &CandidateConfig::default()).unwrap();
    let par_cfg = CandidateConfig {
        parallel: true,
        ..CandidateConfig::default()
    };
    let par = find_template_match_candidates(&img, tpl, None, &par_cfg).unwrap();
    assert_eq!(seq, par);
}

#[test]
fn parallel_correspondence_matches_sequential() {
    let source = common::random_lines(70, 60, 15, 41);
    let target = common::shifted(&source, 6, 4, 255);
    let seq_cfg = PatchMatchConfig {
        half_patch_size: 3,
        iterations: 3,
        ..PatchMatchConfig::default()
    };
    let par_cfg = PatchMatchConfig {
        parallel: true,
        ..seq_cfg.clone()
    };
    let seq = compute_correspondence(&source, &target, None, Prior::None, &seq_cfg).unwrap();
    let par = compute_correspondence(&source, &target, None, Prior::None, &par_cfg).unwrap();
    assert_eq!(seq, par);
}

#[test]
fn parallel_inpaint_matches_sequential() {
    let img = common::random_lines(64, 56, 14, 42);
    let target = common::box_mask(64, 56, 24, 20, 12, 9);
    let seq_cfg = InpaintConfig {
        patch_size: 7,
        ..InpaintConfig::default()
    };
    let par_cfg = InpaintConfig {
        parallel: true,
        ..seq_cfg.clone()
    };
    let seq = inpaint_with_config(&img, &target, None, seq_cfg).unwrap();
    let par = inpaint_with_config(&img, &target, None, par_cfg).unwrap();
    assert_eq!(seq, par);
}

#[test]
fn parallel_inpaint_steps_match_sequential() {
    let img = common::random_lines(64, 56, 14, 43);
    let target = common::box_mask(64, 56, 20, 18, 10, 10);
    let reports = |parallel: bool| {
        let mut inpainter = ExemplarInpainter::with_config(InpaintConfig {
            patch_size: 7,
            parallel,
            ..InpaintConfig::default()
        });
        inpainter.set_source_image(img.clone());
        inpainter.set_target_mask(target.clone());
        inpainter.initialize().unwrap();
        let mut out = Vec::new();
        while inpainter.has_more_steps() {
            out.push(inpainter.step().unwrap());
        }
        out
    };
    let seq = reports(false);
    assert!(!seq.is_empty());
    assert_eq!(seq, reports(true));
}
