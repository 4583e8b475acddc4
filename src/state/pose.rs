//! 12-dimensional pose state with externalized rotation
//!
//! The state vector holds position, an incremental orientation, linear
//! velocity, and angular velocity. The absolute orientation itself lives
//! outside the vector as a unit quaternion; corrections land in the
//! incremental block and are folded into the quaternion by `post_correct`.
//! Keeping the increment near zero keeps the filter linearization honest.

use nalgebra::{UnitQuaternion, Vector3};

use crate::so3;
use crate::state::{
    compute_attenuation, HasAngularVelocity, HasCombinedQuaternion, HasIncrementalOrientation,
    HasPosition, PoseKinematics, State,
};
use crate::types::{PoseStateMat, PoseStateVec, POSE_STATE_DIM};

// Row offsets of the blocks inside the state vector.
const POSITION: usize = 0;
const INCREMENTAL_ORIENTATION: usize = 3;
const VELOCITY: usize = 6;
const ANGULAR_VELOCITY: usize = 9;

/// Initial diagonal of the error covariance.
const INITIAL_VARIANCE: f64 = 10.0;

/// Pose, velocity, and angular velocity with an externally held quaternion.
#[derive(Clone, Debug)]
pub struct PoseState {
    state: PoseStateVec,
    error_covariance: PoseStateMat,
    orientation: UnitQuaternion<f64>,
}

impl Default for PoseState {
    fn default() -> Self {
        Self {
            state: PoseStateVec::zeros(),
            error_covariance: PoseStateMat::identity() * INITIAL_VARIANCE,
            orientation: UnitQuaternion::identity(),
        }
    }
}

impl PoseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&mut self, position: &Vector3<f64>) {
        self.state.fixed_rows_mut::<3>(POSITION).copy_from(position);
    }

    pub fn velocity(&self) -> Vector3<f64> {
        self.state.fixed_rows::<3>(VELOCITY).clone_owned()
    }

    pub fn set_velocity(&mut self, velocity: &Vector3<f64>) {
        self.state.fixed_rows_mut::<3>(VELOCITY).copy_from(velocity);
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: &Vector3<f64>) {
        self.state
            .fixed_rows_mut::<3>(ANGULAR_VELOCITY)
            .copy_from(angular_velocity);
    }

    /// Replace the external quaternion, typically to seed a known starting
    /// attitude. The pending incremental orientation is left untouched.
    pub fn set_quaternion(&mut self, orientation: UnitQuaternion<f64>) {
        self.orientation = orientation;
    }

    /// Renormalize the external quaternion in place.
    pub fn normalize_quaternion(&mut self) {
        self.orientation.renormalize();
    }

    /// Fold the incremental orientation into the external quaternion and
    /// zero the increment. The combined orientation is unchanged.
    pub fn externalize_rotation(&mut self) {
        let mut combined = self.combined_quaternion();
        combined.renormalize();
        self.orientation = combined;
        self.state
            .fixed_rows_mut::<3>(INCREMENTAL_ORIENTATION)
            .fill(0.0);
    }
}

impl State<POSE_STATE_DIM> for PoseState {
    fn state_vector(&self) -> PoseStateVec {
        self.state
    }

    fn set_state_vector(&mut self, state: PoseStateVec) {
        self.state = state;
    }

    fn error_covariance(&self) -> PoseStateMat {
        self.error_covariance
    }

    fn set_error_covariance(&mut self, covariance: PoseStateMat) {
        self.error_covariance = covariance;
    }

    fn post_correct(&mut self) {
        self.externalize_rotation();
    }
}

impl PoseKinematics for PoseState {
    fn apply_velocity(&mut self, dt: f64) {
        let step = self.velocity() * dt;
        {
            let mut position = self.state.fixed_rows_mut::<3>(POSITION);
            position += step;
        }
        let rotation = so3::quat_exp(&(self.angular_velocity() * dt / 2.0));
        self.orientation = rotation * self.orientation;
        self.orientation.renormalize();
    }

    fn dampen_velocities(&mut self, damping: f64, dt: f64) {
        let attenuation = compute_attenuation(damping, dt);
        let mut velocities = self.state.fixed_rows_mut::<6>(VELOCITY);
        velocities *= attenuation;
    }

    fn separately_dampen_velocities(
        &mut self,
        position_damping: f64,
        orientation_damping: f64,
        dt: f64,
    ) {
        {
            let mut velocity = self.state.fixed_rows_mut::<3>(VELOCITY);
            velocity *= compute_attenuation(position_damping, dt);
        }
        {
            let mut angular = self.state.fixed_rows_mut::<3>(ANGULAR_VELOCITY);
            angular *= compute_attenuation(orientation_damping, dt);
        }
    }
}

impl HasPosition for PoseState {
    fn position(&self) -> Vector3<f64> {
        self.state.fixed_rows::<3>(POSITION).clone_owned()
    }
}

impl HasAngularVelocity for PoseState {
    fn angular_velocity(&self) -> Vector3<f64> {
        self.state.fixed_rows::<3>(ANGULAR_VELOCITY).clone_owned()
    }
}

impl HasCombinedQuaternion for PoseState {
    fn combined_quaternion(&self) -> UnitQuaternion<f64> {
        so3::quat_exp(&(self.incremental_orientation() / 2.0)) * self.orientation
    }
}

impl HasIncrementalOrientation for PoseState {
    fn incremental_orientation(&self) -> Vector3<f64> {
        self.state
            .fixed_rows::<3>(INCREMENTAL_ORIENTATION)
            .clone_owned()
    }

    fn external_quaternion(&self) -> UnitQuaternion<f64> {
        self.orientation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_default_state_is_zero_with_inflated_covariance() {
        let state = PoseState::default();
        assert_eq!(state.state_vector(), PoseStateVec::zeros());
        assert_eq!(state.error_covariance(), PoseStateMat::identity() * 10.0);
        assert_eq!(state.external_quaternion(), UnitQuaternion::identity());
    }

    #[test]
    fn test_post_correct_preserves_combined_orientation() {
        let mut state = PoseState::default();
        state.set_quaternion(UnitQuaternion::from_euler_angles(0.1, -0.2, 0.3));
        let mut x = state.state_vector();
        x[INCREMENTAL_ORIENTATION] = 0.2;
        x[INCREMENTAL_ORIENTATION + 2] = -0.05;
        state.set_state_vector(x);

        let before = state.combined_quaternion();
        state.post_correct();
        let after = state.combined_quaternion();

        assert_relative_eq!(before.angle_to(&after), 0.0, epsilon = 1e-12);
        assert_eq!(state.incremental_orientation(), Vector3::zeros());
        assert!((state.external_quaternion().as_ref().norm() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_apply_velocity_translates_and_rotates() {
        let mut state = PoseState::default();
        state.set_velocity(&Vector3::new(1.0, 2.0, -0.5));
        state.set_angular_velocity(&Vector3::new(0.0, 0.0, std::f64::consts::PI));
        state.apply_velocity(0.5);

        assert_relative_eq!(
            state.position(),
            Vector3::new(0.5, 1.0, -0.25),
            epsilon = 1e-12
        );
        let expected = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        assert!(state.combined_quaternion().angle_to(&expected) < 1e-12);
    }

    #[test]
    fn test_apply_velocity_composes_rotations_exactly() {
        // Two quarter turns about different axes, applied as finite steps,
        // must match the quaternion product of the individual rotations.
        let mut state = PoseState::default();
        state.set_angular_velocity(&Vector3::new(FRAC_PI_2, 0.0, 0.0));
        state.apply_velocity(1.0);
        state.set_angular_velocity(&Vector3::new(0.0, FRAC_PI_2, 0.0));
        state.apply_velocity(1.0);

        let expected = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2)
            * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2);
        assert!(state.combined_quaternion().angle_to(&expected) < 1e-12);
    }

    #[test]
    fn test_dampen_velocities_scales_both_blocks() {
        let mut state = PoseState::default();
        state.set_velocity(&Vector3::new(1.0, 1.0, 1.0));
        state.set_angular_velocity(&Vector3::new(2.0, 2.0, 2.0));
        state.dampen_velocities(0.5, 2.0);

        assert_relative_eq!(state.velocity(), Vector3::repeat(0.25), epsilon = 1e-12);
        assert_relative_eq!(
            state.angular_velocity(),
            Vector3::repeat(0.5),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_separate_damping_touches_blocks_independently() {
        let mut state = PoseState::default();
        state.set_velocity(&Vector3::repeat(1.0));
        state.set_angular_velocity(&Vector3::repeat(1.0));
        state.separately_dampen_velocities(0.25, 0.81, 0.5);

        assert_relative_eq!(state.velocity(), Vector3::repeat(0.5), epsilon = 1e-12);
        assert_relative_eq!(
            state.angular_velocity(),
            Vector3::repeat(0.9),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_quaternion_stays_unit_over_many_steps() {
        let mut state = PoseState::default();
        state.set_angular_velocity(&Vector3::new(0.3, -0.7, 0.11));
        for _ in 0..1000 {
            state.apply_velocity(0.01);
            state.post_correct();
        }
        assert!((state.external_quaternion().as_ref().norm() - 1.0).abs() < 1e-12);
    }
}
