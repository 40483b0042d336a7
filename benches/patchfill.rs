use criterion::{criterion_group, criterion_main, Criterion};
use patchfill::{
    find_template_match_candidates, inpaint_with_config, CandidateConfig, Image, InpaintConfig,
    PatchMatchConfig, PatchMatcher, Prior, Rect,
};
use std::hint::black_box;

fn make_image(width: usize, height: usize) -> Image<u8> {
    let mut data = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        for x in 0..width {
            let value = ((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF;
            data.extend_from_slice(&[value as u8, (value / 2) as u8, 255 - value as u8]);
        }
    }
    Image::new(data, width, height, 3).unwrap()
}

fn shift(image: &Image<u8>, dx: usize, dy: usize) -> Image<u8> {
    let mut out = Image::filled(image.width(), image.height(), 3, 0u8).unwrap();
    for y in dy..image.height() {
        for x in dx..image.width() {
            let src = image.pixel(x - dx, y - dy);
            out.pixel_mut(x, y).copy_from_slice(src);
        }
    }
    out
}

fn bench_candidates(c: &mut Criterion) {
    let image = make_image(256, 256);
    let template = image.view_rect(Rect::new(90, 70, 15, 15)).to_image();

    c.bench_function("candidates_sequential", |b| {
        let config = CandidateConfig::default();
        let run = || find_template_match_candidates(&image, template.view(), None, &config);
        b.iter(|| black_box(run().unwrap()));
    });

    #[cfg(feature = "rayon")]
    c.bench_function("candidates_parallel", |b| {
        let config = CandidateConfig {
            parallel: true,
            ..CandidateConfig::default()
        };
        let run = || find_template_match_candidates(&image, template.view(), None, &config);
        b.iter(|| black_box(run().unwrap()));
    });
}

fn bench_patch_match(c: &mut Criterion) {
    let source = make_image(128, 128);
    let target = shift(&source, 9, 5);
    let config = PatchMatchConfig {
        half_patch_size: 3,
        iterations: 3,
        ..PatchMatchConfig::default()
    };

    let matcher = PatchMatcher::new(&source, &target).with_config(config.clone());
    c.bench_function("patch_match_128", |b| {
        b.iter(|| black_box(matcher.run(Prior::None).unwrap()));
    });

    #[cfg(feature = "rayon")]
    {
        let par = PatchMatchConfig {
            parallel: true,
            ..config
        };
        let matcher_par = PatchMatcher::new(&source, &target).with_config(par);
        c.bench_function("patch_match_128_parallel", |b| {
            b.iter(|| black_box(matcher_par.run(Prior::None).unwrap()));
        });
    }
}

fn bench_inpaint(c: &mut Criterion) {
    let image = make_image(96, 96);
    let hole = |x: usize, y: usize| (40..56).contains(&x) && (40..52).contains(&y);
    let target = Image::mask_from_fn(96, 96, hole).unwrap();

    let mut group = c.benchmark_group("inpaint_96");
    group.sample_size(10);
    for (name, use_filter) in [("filtered", true), ("exhaustive", false)] {
        let config = InpaintConfig {
            patch_size: 9,
            use_candidate_filter: use_filter,
            ..InpaintConfig::default()
        };
        group.bench_function(name, |b| {
            let run = || inpaint_with_config(&image, &target, None, config.clone());
            b.iter(|| black_box(run().unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_candidates, bench_patch_match, bench_inpaint);
criterion_main!(benches);
