//! 12-dimensional pose state with exponential-map orientation
//!
//! Block layout matches the externalized-rotation pose state, but the
//! whole orientation lives in the state vector as a rotation vector. There
//! is no external quaternion; `post_correct` instead wraps the rotation
//! vector back into the ball of radius pi after corrections push it out.

use nalgebra::{Matrix3, UnitQuaternion, Vector3};

use crate::so3;
use crate::state::{
    compute_attenuation, HasAngularVelocity, HasCombinedQuaternion, HasIncrementalOrientation,
    HasPosition, PoseKinematics, State,
};
use crate::types::{PoseStateMat, PoseStateVec, POSE_STATE_DIM};

const POSITION: usize = 0;
const ROTATION_VECTOR: usize = 3;
const VELOCITY: usize = 6;
const ANGULAR_VELOCITY: usize = 9;

/// Pose, velocity, and angular velocity with the orientation carried as a
/// rotation vector.
#[derive(Clone, Debug)]
pub struct ExpMapPoseState {
    state: PoseStateVec,
    error_covariance: PoseStateMat,
}

impl Default for ExpMapPoseState {
    fn default() -> Self {
        Self {
            state: PoseStateVec::zeros(),
            error_covariance: PoseStateMat::identity(),
        }
    }
}

impl ExpMapPoseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&mut self, position: &Vector3<f64>) {
        self.state.fixed_rows_mut::<3>(POSITION).copy_from(position);
    }

    pub fn rotation_vector(&self) -> Vector3<f64> {
        self.state.fixed_rows::<3>(ROTATION_VECTOR).clone_owned()
    }

    pub fn set_rotation_vector(&mut self, rotation: &Vector3<f64>) {
        self.state
            .fixed_rows_mut::<3>(ROTATION_VECTOR)
            .copy_from(rotation);
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

    /// The orientation as a rotation matrix.
    pub fn rotation_matrix(&self) -> Matrix3<f64> {
        so3::rodrigues(&self.rotation_vector())
    }
}

impl State<POSE_STATE_DIM> for ExpMapPoseState {
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
        let wrapped = so3::avoid_singularities(self.rotation_vector());
        self.set_rotation_vector(&wrapped);
    }
}

impl PoseKinematics for ExpMapPoseState {
    fn apply_velocity(&mut self, dt: f64) {
        let step = self.velocity() * dt;
        {
            let mut position = self.state.fixed_rows_mut::<3>(POSITION);
            position += step;
        }
        // Compose the angular step with the current orientation on the
        // group, then pull the result back through the log map. The
        // shortest-equivalent log keeps the vector inside the pi ball.
        let composed = so3::quat_exp(&(self.angular_velocity() * dt / 2.0))
            * so3::quat_exp(&(self.rotation_vector() / 2.0));
        self.set_rotation_vector(&(so3::smallest_quat_ln(&composed) * 2.0));
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

impl HasPosition for ExpMapPoseState {
    fn position(&self) -> Vector3<f64> {
        self.state.fixed_rows::<3>(POSITION).clone_owned()
    }
}

impl HasAngularVelocity for ExpMapPoseState {
    fn angular_velocity(&self) -> Vector3<f64> {
        self.state.fixed_rows::<3>(ANGULAR_VELOCITY).clone_owned()
    }
}

impl HasCombinedQuaternion for ExpMapPoseState {
    fn combined_quaternion(&self) -> UnitQuaternion<f64> {
        so3::rotation_vector_to_quat(&self.rotation_vector())
    }
}

impl HasIncrementalOrientation for ExpMapPoseState {
    fn incremental_orientation(&self) -> Vector3<f64> {
        self.rotation_vector()
    }

    fn external_quaternion(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_default_is_zero_with_unit_covariance() {
        let state = ExpMapPoseState::default();
        assert_eq!(state.state_vector(), PoseStateVec::zeros());
        assert_eq!(state.error_covariance(), PoseStateMat::identity());
    }

    #[test]
    fn test_apply_velocity_composes_on_the_group() {
        // Quarter turn about x on top of a quarter turn about z is not the
        // sum of the rotation vectors; composition must happen on SO(3).
        let mut state = ExpMapPoseState::default();
        state.set_rotation_vector(&Vector3::new(0.0, 0.0, FRAC_PI_2));
        state.set_angular_velocity(&Vector3::new(FRAC_PI_2, 0.0, 0.0));
        state.apply_velocity(1.0);

        let expected = UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2)
            * UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_2);
        assert!(state.combined_quaternion().angle_to(&expected) < 1e-12);
    }

    #[test]
    fn test_apply_velocity_stays_inside_pi_ball() {
        let mut state = ExpMapPoseState::default();
        state.set_rotation_vector(&Vector3::new(0.0, 0.0, 3.0));
        state.set_angular_velocity(&Vector3::new(0.0, 0.0, 1.0));
        // Keeps integrating past pi; the stored vector must wrap instead of
        // growing without bound.
        for _ in 0..40 {
            state.apply_velocity(0.1);
        }
        assert!(state.rotation_vector().norm() <= PI + 1e-9);
    }

    #[test]
    fn test_post_correct_wraps_rotation_vector() {
        let mut state = ExpMapPoseState::default();
        let before = Vector3::new(0.0, 4.0, 0.0);
        state.set_rotation_vector(&before);
        state.post_correct();

        let after = state.rotation_vector();
        assert!(after.norm() < PI);
        assert!(
            so3::rotation_vector_to_quat(&before).angle_to(&so3::rotation_vector_to_quat(&after))
                < 1e-12
        );
    }

    #[test]
    fn test_external_quaternion_is_identity() {
        let mut state = ExpMapPoseState::default();
        state.set_rotation_vector(&Vector3::new(0.3, -0.2, 0.1));
        assert_eq!(state.external_quaternion(), UnitQuaternion::identity());
        assert_relative_eq!(
            state.incremental_orientation(),
            Vector3::new(0.3, -0.2, 0.1),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_rotation_matrix_matches_quaternion() {
        let mut state = ExpMapPoseState::default();
        state.set_rotation_vector(&Vector3::new(1.0, -0.5, 0.25));
        let from_quat = state
            .combined_quaternion()
            .to_rotation_matrix()
            .into_inner();
        assert!((state.rotation_matrix() - from_quat).norm() < 1e-12);
    }
}
