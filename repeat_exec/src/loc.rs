//! # Localisation types
//!
//! The live vehicle pose as delivered by the odometry source. The control
//! model assumes planar motion, so a pose is a 2D position plus a heading.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::Vector2;

// Internal
use crate::transform::Se2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An absolute 2D pose of the vehicle in the odometry frame.
#[derive(Debug, Copy, Clone, Default)]
pub struct Pose2 {
    /// The position in the odometry frame.
    ///
    /// Units: meters
    pub position_m: Vector2<f64>,

    /// The heading, measured anticlockwise from the odometry frame x axis.
    ///
    /// Units: radians
    pub yaw_rad: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Pose2 {
    /// Build a pose from its components.
    pub fn new(x_m: f64, y_m: f64, yaw_rad: f64) -> Self {
        Self {
            position_m: Vector2::new(x_m, y_m),
            yaw_rad,
        }
    }

    /// The pose expressed as a transform from the odometry frame origin.
    pub fn to_se2(&self) -> Se2 {
        Se2::new(self.position_m[0], self.position_m[1], self.yaw_rad)
    }

    /// The transform of this pose expressed in the frame of `reference`.
    ///
    /// Used to derive the live relative-odometry and relative-pose
    /// transforms from consecutive absolute odometry samples.
    pub fn relative_to(&self, reference: &Pose2) -> Se2 {
        reference.to_se2().inverse().compose(&self.to_se2())
    }
}
