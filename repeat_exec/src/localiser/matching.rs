//! # Normalised cross-correlation matching
//!
//! Template matching between a live patch and a candidate reference image.
//! The score is the zero-mean normalised cross-correlation: both the patch
//! and each reference window are mean-subtracted before correlating, and
//! the product sum is divided by the product of their L2 norms, making the
//! score invariant to linear brightness and contrast differences between
//! the live and reference cameras.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use image::GrayImage;
use ndarray::{s, Array2};
use ndarray_stats::QuantileExt;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with template matching.
#[derive(Debug, thiserror::Error)]
pub enum MatchError {
    #[error(
        "The patch ({patch_w}x{patch_h} px) is larger than the reference \
         image ({ref_w}x{ref_h} px)"
    )]
    PatchTooLarge {
        patch_w: usize,
        patch_h: usize,
        ref_w: usize,
        ref_h: usize,
    },

    #[error("The correlation surface has no maximum")]
    NoMaximum,
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a grayscale image into a row-major array of intensities.
pub fn image_to_array(image: &GrayImage) -> Array2<f64> {
    let (width, height) = image.dimensions();

    Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
        image.get_pixel(x as u32, y as u32).0[0] as f64
    })
}

/// Compute the normalised cross-correlation surface between a reference
/// image and a patch.
///
/// The surface has one entry per placement of the patch's top-left corner
/// within the reference, so its shape is
/// `(ref_h - patch_h + 1, ref_w - patch_w + 1)`. Scores lie in [-1, 1],
/// with a zero-variance patch or window scoring 0 rather than producing a
/// NaN.
pub fn match_template(
    reference: &Array2<f64>,
    patch: &Array2<f64>,
) -> Result<Array2<f64>, MatchError> {
    let (ref_h, ref_w) = reference.dim();
    let (patch_h, patch_w) = patch.dim();

    if patch_h > ref_h || patch_w > ref_w {
        return Err(MatchError::PatchTooLarge {
            patch_w,
            patch_h,
            ref_w,
            ref_h,
        });
    }

    // Zero-mean the patch once, its energy is shared by every placement
    let patch_mean = patch.mean().unwrap_or(0.0);
    let patch_zm = patch.mapv(|v| v - patch_mean);
    let patch_energy: f64 = patch_zm.iter().map(|v| v * v).sum();

    let mut surface = Array2::zeros((ref_h - patch_h + 1, ref_w - patch_w + 1));

    for y in 0..=(ref_h - patch_h) {
        for x in 0..=(ref_w - patch_w) {
            let window = reference.slice(s![y..(y + patch_h), x..(x + patch_w)]);
            let window_mean = window.mean().unwrap_or(0.0);

            let mut numerator = 0.0;
            let mut window_energy = 0.0;

            for ((i, j), p) in patch_zm.indexed_iter() {
                let w = window[[i, j]] - window_mean;
                numerator += p * w;
                window_energy += w * w;
            }

            let denominator = (patch_energy * window_energy).sqrt();

            surface[[y, x]] = if denominator > f64::EPSILON {
                numerator / denominator
            } else {
                0.0
            };
        }
    }

    Ok(surface)
}

/// Find the maximum of a correlation surface.
///
/// Returns `(x, y, score)` where `(x, y)` is the placement of the patch's
/// top-left corner in reference pixel coordinates.
pub fn max_location(surface: &Array2<f64>) -> Result<(usize, usize, f64), MatchError> {
    let (y, x) = surface.argmax().map_err(|_| MatchError::NoMaximum)?;

    Ok((x, y, surface[[y, x]]))
}

#[cfg(test)]
mod test {
    use super::*;

    /// Reference with a distinctive block, zero elsewhere.
    fn structured_reference() -> Array2<f64> {
        let mut reference = Array2::zeros((6, 8));
        for (i, v) in [40.0, 90.0, 10.0, 70.0, 120.0, 30.0, 80.0, 50.0, 20.0, 60.0, 110.0, 100.0]
            .iter()
            .enumerate()
        {
            reference[[2 + i / 4, 3 + i % 4]] = *v;
        }

        reference
    }

    #[test]
    fn test_exact_patch_found_at_origin_of_block() {
        let reference = structured_reference();
        let patch = reference.slice(s![2..5, 3..7]).to_owned();

        let surface = match_template(&reference, &patch).unwrap();
        let (x, y, score) = max_location(&surface).unwrap();

        assert_eq!((x, y), (3, 2));
        assert!(score > 0.999, "score was {}", score);
    }

    #[test]
    fn test_surface_shape() {
        let reference = Array2::zeros((6, 8));
        let patch = Array2::zeros((3, 4));

        let surface = match_template(&reference, &patch).unwrap();

        assert_eq!(surface.dim(), (4, 5));
    }

    #[test]
    fn test_zero_variance_scores_zero() {
        // A flat patch over a flat reference must score 0, not NaN
        let reference = Array2::from_elem((6, 8), 42.0);
        let patch = Array2::from_elem((3, 4), 42.0);

        let surface = match_template(&reference, &patch).unwrap();

        assert!(surface.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_patch_too_large() {
        let reference = Array2::zeros((4, 4));
        let patch = Array2::zeros((5, 4));

        assert!(matches!(
            match_template(&reference, &patch),
            Err(MatchError::PatchTooLarge { .. })
        ));
    }

    #[test]
    fn test_brightness_invariance() {
        let reference = structured_reference();
        let patch = reference.slice(s![2..5, 3..7]).to_owned();

        // A constant intensity shift must not change the winning location
        let brightened = reference.mapv(|v| v + 25.0);
        let surface = match_template(&brightened, &patch).unwrap();
        let (x, y, score) = max_location(&surface).unwrap();

        assert_eq!((x, y), (3, 2));
        assert!(score > 0.999, "score was {}", score);
    }
}
