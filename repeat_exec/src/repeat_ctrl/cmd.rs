//! Drive commands produced by RepeatCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::Serialize;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An Ackermann drive command.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AckermannCmd {
    /// Demanded forward speed.
    ///
    /// Units: meters/second
    pub speed_ms: f64,

    /// Demanded steering angle, positive to the left.
    ///
    /// Units: radians
    pub steering_angle_rad: f64,

    /// Demanded steering angle rate. Always zero, the steering actuator
    /// moves at its own rate.
    ///
    /// Units: radians/second
    pub steering_angle_velocity_rads: f64,

    /// Demanded acceleration towards the speed demand.
    ///
    /// Units: meters/second^2
    pub acceleration_mss: f64,

    /// Demanded jerk. Always zero.
    ///
    /// Units: meters/second^3
    pub jerk_msss: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl AckermannCmd {
    /// A command bringing the vehicle to a stop with straight steering.
    pub fn stop(acceleration_mss: f64) -> Self {
        Self {
            speed_ms: 0.0,
            steering_angle_rad: 0.0,
            steering_angle_velocity_rads: 0.0,
            acceleration_mss,
            jerk_msss: 0.0,
        }
    }
}
