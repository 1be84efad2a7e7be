//! Implementations for the RepeatCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use nalgebra::Vector3;
use serde::Serialize;

// Internal
use super::{AckermannCmd, Params, RepeatCtrlError};
use crate::path_store::PathStore;
use crate::transform::{self, Se2};
use util::{maths, params};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Repeat control module state.
pub struct RepeatCtrl {
    params: Params,

    /// Executing mode
    mode: RepeatCtrlMode,

    report: StatusReport,
}

/// The status report containing the error coordinates and saturation flags
/// of the last processed cycle.
#[derive(Debug, Default, Copy, Clone, Serialize)]
pub struct StatusReport {
    /// Distance to the look-ahead target.
    ///
    /// Units: meters
    pub rho_m: f64,

    /// Bearing of the look-ahead target from the vehicle's forward axis.
    ///
    /// Units: radians
    pub alpha_rad: f64,

    /// Heading error that would remain on reaching the target.
    ///
    /// Units: radians
    pub beta_rad: f64,

    /// If true the speed demand was limited this cycle.
    pub speed_limited: bool,

    /// If true the steering angle demand was limited this cycle.
    pub steering_limited: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The possible modes of execution of RepeatCtrl.
///
/// The transition from `Tracking` to `PathComplete` is one-way: once the
/// path is exhausted the controller keeps demanding stops until the run is
/// restarted.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum RepeatCtrlMode {
    Tracking,
    PathComplete,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl RepeatCtrl {
    /// Initialise the RepeatCtrl module.
    ///
    /// Expected init data is a path to the parameter file.
    pub fn init(params_path: &str) -> Result<Self, RepeatCtrlError> {
        let params = match params::load(params_path) {
            Ok(p) => p,
            Err(e) => return Err(RepeatCtrlError::ParamLoadError(e)),
        };

        Ok(Self::from_params(params))
    }

    /// Build a RepeatCtrl from already-loaded parameters.
    pub fn from_params(mut params: Params) -> Self {
        // A look-ahead below one would target the matched frame itself,
        // clamp rather than fail
        if params.target_frame_lookahead < 1 {
            warn!("target_frame_lookahead below 1, clamping to 1");
            params.target_frame_lookahead = 1;
        }

        // The pose regulation law is known to converge for rho_gain > 0,
        // beta_gain < 0, alpha_gain > rho_gain. Violations are reported,
        // not corrected: the configured gains are used as given.
        if params.rho_gain <= 0.0
            || params.beta_gain >= 0.0
            || params.alpha_gain <= params.rho_gain
        {
            warn!(
                "Pose regulation gains (rho: {}, alpha: {}, beta: {}) violate the stability \
                 condition rho_gain > 0, beta_gain < 0, alpha_gain > rho_gain",
                params.rho_gain, params.alpha_gain, params.beta_gain
            );
        }

        Self {
            params,
            mode: RepeatCtrlMode::Tracking,
            report: StatusReport::default(),
        }
    }

    /// The current executing mode.
    pub fn mode(&self) -> RepeatCtrlMode {
        self.mode
    }

    /// Process one cycle of repeat control.
    ///
    /// `offsets` is the `(x, y, yaw)` offset of the vehicle from the
    /// matched teach frame as produced by the offset estimator.
    pub fn proc(
        &mut self,
        matched_id: usize,
        offsets: &Vector3<f64>,
        store: &PathStore,
    ) -> (AckermannCmd, StatusReport) {
        // Clear the status report
        self.report = StatusReport::default();

        if self.mode == RepeatCtrlMode::PathComplete {
            return (AckermannCmd::stop(self.params.acceleration_mss), self.report);
        }

        // Transform from the matched frame to the look-ahead target
        let goal = match transform::segment(
            store,
            matched_id,
            matched_id + self.params.target_frame_lookahead,
        ) {
            Some(g) => g,
            None => {
                info!("Believe we are at the end of the teach path, stopping");
                self.mode = RepeatCtrlMode::PathComplete;
                return (AckermannCmd::stop(self.params.acceleration_mss), self.report);
            }
        };

        // Re-express the goal relative to the offset-corrected vehicle pose
        let lateral_correction = Se2::new(offsets[0], offsets[1], offsets[2]);
        let goal = lateral_correction.inverse().compose(&goal);

        // Polar error coordinates of the goal
        let rho_m = maths::norm(&[0.0, 0.0], &[goal.x_m(), goal.y_m()]).unwrap_or(0.0);
        let alpha_rad = goal.y_m().atan2(goal.x_m());
        let beta_rad = goal.yaw_rad();

        self.report.rho_m = rho_m;
        self.report.alpha_rad = alpha_rad;
        self.report.beta_rad = beta_rad;

        debug!(
            "Goal errors: rho {:.4} m, alpha {:.4} rad, beta {:.4} rad",
            rho_m, alpha_rad, beta_rad
        );

        // Speed demand, saturated to the platform's capability
        let speed_dem_ms = self.params.rho_gain * rho_m;
        let speed_ms = maths::clamp(&speed_dem_ms, &0.0, &self.params.max_speed_ms);
        if speed_ms != speed_dem_ms {
            self.report.speed_limited = true;
        }

        // Angular rate demand through the bicycle model. At zero speed the
        // steering angle is undefined, demand straight ahead instead.
        let ang_vel_rads = self.params.alpha_gain * alpha_rad + self.params.beta_gain * beta_rad;

        let steering_dem_rad = if speed_ms != 0.0 {
            (ang_vel_rads * self.params.wheel_base_m / speed_ms).atan()
        } else {
            0.0
        };

        let steering_angle_rad = maths::clamp(
            &steering_dem_rad,
            &self.params.min_steering_angle_rad,
            &self.params.max_steering_angle_rad,
        );
        if steering_angle_rad != steering_dem_rad {
            self.report.steering_limited = true;
        }

        let cmd = AckermannCmd {
            speed_ms,
            steering_angle_rad,
            steering_angle_velocity_rads: 0.0,
            acceleration_mss: self.params.acceleration_mss,
            jerk_msss: 0.0,
        };

        (cmd, self.report)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::path_store::PathStore;

    fn test_params() -> Params {
        Params {
            target_frame_lookahead: 2,
            rho_gain: 0.6,
            alpha_gain: 0.7,
            beta_gain: -0.3,
            wheel_base_m: 0.312,
            max_speed_ms: 0.5,
            min_steering_angle_rad: -std::f64::consts::FRAC_PI_4,
            max_steering_angle_rad: std::f64::consts::FRAC_PI_4,
            acceleration_mss: 0.5,
        }
    }

    /// A store of `n` frames with the given per-step relative odometry.
    fn store_with_steps(n: usize, step: (f64, f64, f64)) -> PathStore {
        let mut data = String::from(
            "Frame_ID, relative_odom_x(m), relative_odom_y(m), relative_odom_yaw(rad), \
             relative_pose_x(m), relative_pose_y(m), relative_pose_yaw(rad)",
        );
        for i in 0..n {
            data.push_str(&format!(
                "\n{}, {}, {}, {}, 0.0, 0.0, 0.0",
                i, step.0, step.1, step.2
            ));
        }

        PathStore::from_reader(data.as_bytes()).unwrap()
    }

    #[test]
    fn test_at_goal_demands_stop_values() {
        let mut ctrl = RepeatCtrl::from_params(test_params());
        // All-zero odometry puts the look-ahead target on top of the
        // vehicle: rho, alpha and beta are all zero
        let store = store_with_steps(5, (0.0, 0.0, 0.0));

        let (cmd, report) = ctrl.proc(0, &Vector3::zeros(), &store);

        assert_eq!(cmd.speed_ms, 0.0);
        assert_eq!(cmd.steering_angle_rad, 0.0);
        assert_eq!(report.rho_m, 0.0);
        assert_eq!(ctrl.mode(), RepeatCtrlMode::Tracking);
    }

    #[test]
    fn test_straight_line_lookahead() {
        let mut params = test_params();
        params.max_speed_ms = 10.0;
        let mut ctrl = RepeatCtrl::from_params(params);
        let store = store_with_steps(5, (1.0, 0.0, 0.0));

        let (cmd, report) = ctrl.proc(0, &Vector3::zeros(), &store);

        // segment(0, 2) is a 2 m translation, so rho is 2 and the heading
        // errors vanish
        assert!((report.rho_m - 2.0).abs() < 1e-9);
        assert!(report.alpha_rad.abs() < 1e-9);
        assert!(report.beta_rad.abs() < 1e-9);
        assert!((cmd.speed_ms - 0.6 * 2.0).abs() < 1e-9);
        assert_eq!(cmd.steering_angle_rad, 0.0);
    }

    #[test]
    fn test_speed_saturation() {
        let mut ctrl = RepeatCtrl::from_params(test_params());
        // 100 m to the look-ahead target
        let store = store_with_steps(5, (50.0, 0.0, 0.0));

        let (cmd, report) = ctrl.proc(0, &Vector3::zeros(), &store);

        assert_eq!(cmd.speed_ms, 0.5);
        assert!(report.speed_limited);
    }

    #[test]
    fn test_steering_saturation() {
        let mut params = test_params();
        params.min_steering_angle_rad = -0.1;
        params.max_steering_angle_rad = 0.1;
        let mut ctrl = RepeatCtrl::from_params(params);
        // Target almost directly to the left: alpha near pi/2
        let store = store_with_steps(5, (0.01, 2.0, 0.0));

        let (cmd, report) = ctrl.proc(0, &Vector3::zeros(), &store);

        assert_eq!(cmd.steering_angle_rad, 0.1);
        assert!(report.steering_limited);
    }

    #[test]
    fn test_end_of_path_latches_stop() {
        let mut ctrl = RepeatCtrl::from_params(test_params());
        let store = store_with_steps(5, (1.0, 0.0, 0.0));

        // Matched the last frame: look-ahead runs off the end of the path
        let (cmd, _) = ctrl.proc(4, &Vector3::zeros(), &store);

        assert_eq!(cmd.speed_ms, 0.0);
        assert_eq!(cmd.steering_angle_rad, 0.0);
        assert_eq!(ctrl.mode(), RepeatCtrlMode::PathComplete);

        // Once complete even a valid matched id keeps demanding stop
        let (cmd, _) = ctrl.proc(0, &Vector3::zeros(), &store);

        assert_eq!(cmd.speed_ms, 0.0);
        assert_eq!(cmd.steering_angle_rad, 0.0);
        assert_eq!(ctrl.mode(), RepeatCtrlMode::PathComplete);
    }

    #[test]
    fn test_lateral_offset_steers_back_towards_path() {
        let mut ctrl = RepeatCtrl::from_params(test_params());
        let store = store_with_steps(5, (1.0, 0.0, 0.0));

        // Vehicle to the left of the path: expect a right (negative)
        // steering demand
        let (cmd, _) = ctrl.proc(0, &Vector3::new(0.0, 0.5, 0.0), &store);
        assert!(cmd.steering_angle_rad < 0.0);

        // And the mirror case
        let (cmd, _) = ctrl.proc(0, &Vector3::new(0.0, -0.5, 0.0), &store);
        assert!(cmd.steering_angle_rad > 0.0);
    }

    #[test]
    fn test_lookahead_clamped_to_one() {
        let mut params = test_params();
        params.target_frame_lookahead = 0;
        let mut ctrl = RepeatCtrl::from_params(params);
        let store = store_with_steps(2, (1.0, 0.0, 0.0));

        let (_, report) = ctrl.proc(0, &Vector3::zeros(), &store);

        // With a clamped look-ahead of 1 the target is one frame out
        assert!((report.rho_m - 1.0).abs() < 1e-9);
    }
}
