//! # Localiser Benchmark
//!
//! The correlation search is the dominant per-frame cost of the repeat
//! pipeline, proportional to the window size times the comparison image
//! pixel count. This benchmark covers a single template match and a full
//! localisation over a 7 candidate window at the default comparison
//! geometry.

use criterion::{criterion_group, criterion_main, Criterion};
use image::{DynamicImage, GrayImage};
use ndarray::s;

use repeat_lib::localiser::{matching, Localiser, MemoryImageSource, Params};
use repeat_lib::path_store::PathStore;

const COMPARISON_SIZE: [u32; 2] = [64, 48];

/// A reference image with a noise pattern unique to the given seed.
fn patterned_image(seed: u32) -> GrayImage {
    GrayImage::from_fn(COMPARISON_SIZE[0], COMPARISON_SIZE[1], |x, y| {
        let v = (x + 1).wrapping_mul(73_856_093)
            ^ (y + 1).wrapping_mul(19_349_663)
            ^ (seed + 1).wrapping_mul(83_492_791);
        image::Luma([(v >> 8) as u8])
    })
}

/// A teach store with one frame per reference image.
fn teach_store(num_frames: usize) -> PathStore {
    let mut data = String::from(
        "Frame_ID, relative_odom_x(m), relative_odom_y(m), relative_odom_yaw(rad), \
         relative_pose_x(m), relative_pose_y(m), relative_pose_yaw(rad)",
    );
    for i in 0..num_frames {
        data.push_str(&format!("\n{}, 1.0, 0.0, 0.0, {}.0, 0.0, 0.0", i, i));
    }

    PathStore::from_reader(data.as_bytes()).unwrap()
}

fn localiser_benchmark(c: &mut Criterion) {
    // ---- Single template match at the default geometry ----

    let reference = matching::image_to_array(&patterned_image(0));
    // A 38x28 px patch, the 0.6 portion of the comparison size
    let patch = reference.slice(s![10..38, 13..51]).to_owned();

    c.bench_function("matching::match_template", |b| {
        b.iter(|| matching::match_template(&reference, &patch).unwrap())
    });

    // ---- Full localisation over a 7 candidate window ----

    let store = teach_store(7);

    let mut source = MemoryImageSource::new();
    for id in 0..7 {
        source.insert(id, patterned_image(id as u32));
    }

    let mut localiser = Localiser::from_params(Params {
        comparison_size_px: COMPARISON_SIZE,
        patch_portion: 0.6,
        frame_search_half_width: 3,
    })
    .unwrap();

    let live = DynamicImage::ImageLuma8(patterned_image(3));

    c.bench_function("Localiser::localise", |b| {
        b.iter(|| localiser.localise(&live, None, &store, &source).unwrap())
    });
}

criterion_group!(benches, localiser_benchmark);
criterion_main!(benches);
