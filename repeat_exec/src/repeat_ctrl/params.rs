//! Parameters structure for RepeatCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for repeat control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- TARGET SELECTION ----

    /// Number of teach frames ahead of the matched frame used as the
    /// steering target. Values below 1 are clamped to 1.
    pub target_frame_lookahead: usize,

    // ---- POSE REGULATION GAINS ----

    /// Gain from the distance error `rho` to the speed demand.
    pub rho_gain: f64,

    /// Gain from the bearing error `alpha` to the angular rate demand.
    pub alpha_gain: f64,

    /// Gain from the terminal heading error `beta` to the angular rate
    /// demand.
    pub beta_gain: f64,

    // ---- PLATFORM ----

    /// Distance between the front and rear axles.
    ///
    /// Units: meters
    pub wheel_base_m: f64,

    /// Maximum forward speed demand.
    ///
    /// Units: meters/second
    pub max_speed_ms: f64,

    /// Minimum steering angle demand (lowest negative value).
    ///
    /// Units: radians
    pub min_steering_angle_rad: f64,

    /// Maximum steering angle demand (highest positive value).
    ///
    /// Units: radians
    pub max_steering_angle_rad: f64,

    /// Acceleration demand carried on every command.
    ///
    /// Units: meters/second^2
    pub acceleration_mss: f64,
}
