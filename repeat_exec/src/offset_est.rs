//! # Offset estimator
//!
//! Converts the pixel location of the best patch match into a metric offset
//! of the vehicle from the teach path. The sign convention follows the
//! matched teach frame's coordinate frame: the lateral offset is positive
//! when the vehicle sits to the left of the path, which corresponds to the
//! live patch being found left of the comparison image's horizontal centre.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

// Internal
use util::params;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for the offset estimator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    /// Scale factor from longitudinal pixel offset to meters.
    pub x_offset_scale_factor: f64,

    /// Scale factor from lateral pixel offset to meters.
    pub y_offset_scale_factor: f64,

    /// Scale factor from heading pixel offset to radians.
    pub yaw_offset_scale_factor: f64,
}

/// The offset estimator.
pub struct OffsetEst {
    params: Params,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl OffsetEst {
    /// Initialise the offset estimator.
    ///
    /// Expected init data is a path to the parameter file.
    pub fn init(params_path: &str) -> Result<Self, params::LoadError> {
        Ok(Self {
            params: params::load(params_path)?,
        })
    }

    /// Build an estimator from already-loaded parameters.
    pub fn from_params(params: Params) -> Self {
        Self { params }
    }

    /// Estimate the vehicle's offset from the matched teach frame.
    ///
    /// `match_location_px` is the top-left corner of the best patch
    /// placement in comparison-image coordinates. The returned vector is
    /// `(x, y, yaw)` offsets in the matched frame. The longitudinal and
    /// heading components are structurally present but fixed at zero in the
    /// baseline design; the scale factors are retained as extension points
    /// for depth and heading estimation.
    pub fn estimate(
        &self,
        match_location_px: [u32; 2],
        patch_size_px: [u32; 2],
        comparison_width_px: u32,
    ) -> Vector3<f64> {
        // The match location is the patch's top-left corner, the offset is
        // measured from the patch centre
        let patch_centre_x_px = match_location_px[0] as f64 + patch_size_px[0] as f64 / 2.0;

        // Positive when the patch was found left of the image centre, i.e.
        // the vehicle is to the left of the teach path
        let lateral_px = (comparison_width_px / 2) as f64 - patch_centre_x_px;

        Vector3::new(
            self.params.x_offset_scale_factor * 0.0,
            self.params.y_offset_scale_factor * lateral_px,
            self.params.yaw_offset_scale_factor * 0.0,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn test_estimator() -> OffsetEst {
        OffsetEst::from_params(Params {
            x_offset_scale_factor: 0.0,
            y_offset_scale_factor: 0.02,
            yaw_offset_scale_factor: 0.0,
        })
    }

    #[test]
    fn test_match_left_of_centre_is_positive() {
        // Comparison width 64, patch width 38: patch at x = 0 centres at
        // 19, so the offset is (32 - 19) * 0.02
        let offsets = test_estimator().estimate([0, 10], [38, 28], 64);

        assert!((offsets[1] - 13.0 * 0.02).abs() < 1e-12);
        assert_eq!(offsets[0], 0.0);
        assert_eq!(offsets[2], 0.0);
    }

    #[test]
    fn test_match_right_of_centre_is_negative() {
        // Patch at x = 26 centres at 45, right of the image centre
        let offsets = test_estimator().estimate([26, 10], [38, 28], 64);

        assert!((offsets[1] - (-13.0 * 0.02)).abs() < 1e-12);
    }

    #[test]
    fn test_match_at_centre_is_zero() {
        // Patch at x = 13 centres exactly on the image centre
        let offsets = test_estimator().estimate([13, 10], [38, 28], 64);

        assert_eq!(offsets[1], 0.0);
    }
}
