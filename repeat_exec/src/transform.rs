//! # Planar transform composition
//!
//! All geometry in the repeat pipeline lives on the plane, so transforms
//! between frames are SE(2): a 2D translation plus a rotation about the
//! vertical axis. This module provides the transform type itself and the
//! composer which chains the relative-odometry transforms held in the
//! [`PathStore`](crate::path_store::PathStore) into a single transform
//! between two teach frames.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Isometry2, Vector2};

// Internal
use crate::path_store::PathStore;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A planar rigid transform relating two coordinate frames.
///
/// Composition is associative and `identity` is the neutral element, but
/// composition is not commutative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Se2 {
    iso: Isometry2<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Se2 {
    /// The neutral transform.
    pub fn identity() -> Self {
        Self {
            iso: Isometry2::identity(),
        }
    }

    /// Build a transform from a translation and a yaw angle.
    pub fn new(x_m: f64, y_m: f64, yaw_rad: f64) -> Self {
        Self {
            iso: Isometry2::new(Vector2::new(x_m, y_m), yaw_rad),
        }
    }

    /// Compose this transform with another, `self` acting first.
    pub fn compose(&self, other: &Se2) -> Se2 {
        Se2 {
            iso: self.iso * other.iso,
        }
    }

    /// The inverse transform.
    pub fn inverse(&self) -> Se2 {
        Se2 {
            iso: self.iso.inverse(),
        }
    }

    /// The x component of the translation.
    ///
    /// Units: meters
    pub fn x_m(&self) -> f64 {
        self.iso.translation.vector[0]
    }

    /// The y component of the translation.
    ///
    /// Units: meters
    pub fn y_m(&self) -> f64 {
        self.iso.translation.vector[1]
    }

    /// The rotation angle, in the range (-pi, pi].
    ///
    /// Units: radians
    pub fn yaw_rad(&self) -> f64 {
        self.iso.rotation.angle()
    }
}

impl Default for Se2 {
    fn default() -> Self {
        Se2::identity()
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Get the transform between two teach frames.
///
/// The result is the pose of frame `to_id` expressed in frame `from_id`'s
/// coordinates, built by chaining the relative-odometry transforms of the
/// entries `from_id + 1 ..= to_id` in ascending order. If `from_id` and
/// `to_id` are equal the identity is returned.
///
/// Returns `None` when `to_id` lies beyond the end of the teach sequence.
/// This is not an error but the end-of-path signal consumed by the
/// controller.
pub fn segment(store: &PathStore, from_id: usize, to_id: usize) -> Option<Se2> {
    if to_id >= store.len() {
        return None;
    }

    let mut transform = Se2::identity();

    for id in (from_id + 1)..=to_id {
        match store.get(id) {
            Ok(frame) => transform = transform.compose(&frame.relative_odom),
            // Outside the sequence, same signal as the to_id bound above
            Err(_) => return None,
        }
    }

    Some(transform)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::path_store::PathStore;

    /// Tolerance used when comparing composed transforms.
    const EPS: f64 = 1e-9;

    fn assert_se2_eq(a: &Se2, b: &Se2) {
        assert!((a.x_m() - b.x_m()).abs() < EPS, "x: {} != {}", a.x_m(), b.x_m());
        assert!((a.y_m() - b.y_m()).abs() < EPS, "y: {} != {}", a.y_m(), b.y_m());
        assert!(
            (a.yaw_rad() - b.yaw_rad()).abs() < EPS,
            "yaw: {} != {}",
            a.yaw_rad(),
            b.yaw_rad()
        );
    }

    /// A 5 frame path turning gently left while advancing.
    fn curved_store() -> PathStore {
        let data = b"\
Frame_ID, relative_odom_x(m), relative_odom_y(m), relative_odom_yaw(rad), relative_pose_x(m), relative_pose_y(m), relative_pose_yaw(rad)
0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0
1, 1.0, 0.1, 0.05, 1.0, 0.1, 0.05
2, 1.0, 0.2, 0.10, 2.0, 0.3, 0.15
3, 1.0, 0.1, 0.05, 3.0, 0.4, 0.20
4, 1.0, 0.0, 0.00, 4.0, 0.4, 0.20
";
        PathStore::from_reader(&data[..]).unwrap()
    }

    /// A 5 frame straight line path with 1 m between frames.
    fn straight_store() -> PathStore {
        let data = b"\
Frame_ID, relative_odom_x(m), relative_odom_y(m), relative_odom_yaw(rad), relative_pose_x(m), relative_pose_y(m), relative_pose_yaw(rad)
0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0
1, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0
2, 1.0, 0.0, 0.0, 2.0, 0.0, 0.0
3, 1.0, 0.0, 0.0, 3.0, 0.0, 0.0
4, 1.0, 0.0, 0.0, 4.0, 0.0, 0.0
";
        PathStore::from_reader(&data[..]).unwrap()
    }

    #[test]
    fn test_identity_composition() {
        let a = Se2::new(1.0, -2.0, 0.3);

        assert_se2_eq(&a.compose(&Se2::identity()), &a);
        assert_se2_eq(&Se2::identity().compose(&a), &a);
    }

    #[test]
    fn test_inverse_roundtrip() {
        let a = Se2::new(0.5, 1.5, -0.7);

        assert_se2_eq(&a.compose(&a.inverse()), &Se2::identity());
        assert_se2_eq(&a.inverse().compose(&a), &Se2::identity());
    }

    #[test]
    fn test_composition_not_commutative() {
        let a = Se2::new(1.0, 0.0, std::f64::consts::FRAC_PI_2);
        let b = Se2::new(0.0, 1.0, 0.0);

        let ab = a.compose(&b);
        let ba = b.compose(&a);

        assert!((ab.x_m() - ba.x_m()).abs() > 1e-6 || (ab.y_m() - ba.y_m()).abs() > 1e-6);
    }

    #[test]
    fn test_segment_same_frame_is_identity() {
        let store = curved_store();

        for id in 0..store.len() {
            assert_se2_eq(&segment(&store, id, id).unwrap(), &Se2::identity());
        }
    }

    #[test]
    fn test_segment_chains_associatively() {
        let store = curved_store();

        let full = segment(&store, 0, 4).unwrap();
        let first = segment(&store, 0, 2).unwrap();
        let second = segment(&store, 2, 4).unwrap();

        assert_se2_eq(&first.compose(&second), &full);
    }

    #[test]
    fn test_segment_beyond_path_end_unavailable() {
        let store = curved_store();

        assert!(segment(&store, 0, store.len()).is_none());
        assert!(segment(&store, 4, 6).is_none());
        assert!(segment(&store, 0, store.len() - 1).is_some());
    }

    #[test]
    fn test_segment_straight_line() {
        let store = straight_store();

        let goal = segment(&store, 0, 2).unwrap();

        assert!((goal.x_m() - 2.0).abs() < EPS);
        assert!(goal.y_m().abs() < EPS);
        assert!(goal.yaw_rad().abs() < EPS);
    }
}
