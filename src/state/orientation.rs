//! 6-dimensional orientation-only state with externalized rotation
//!
//! Same externalized-rotation scheme as the pose state, without the
//! translational blocks: orientation increment in rows 0..2, angular
//! velocity in rows 3..5, absolute attitude in an external quaternion.

use nalgebra::{UnitQuaternion, Vector3};

use crate::so3;
use crate::state::{
    compute_attenuation, HasAngularVelocity, HasCombinedQuaternion, HasIncrementalOrientation,
    State,
};
use crate::types::{OrientationStateMat, OrientationStateVec, ORIENTATION_STATE_DIM};

const INCREMENTAL_ORIENTATION: usize = 0;
const ANGULAR_VELOCITY: usize = 3;

/// Attitude and angular velocity with an externally held quaternion.
#[derive(Clone, Debug)]
pub struct OrientationState {
    state: OrientationStateVec,
    error_covariance: OrientationStateMat,
    orientation: UnitQuaternion<f64>,
}

impl Default for OrientationState {
    fn default() -> Self {
        Self {
            state: OrientationStateVec::zeros(),
            error_covariance: OrientationStateMat::identity(),
            orientation: UnitQuaternion::identity(),
        }
    }
}

impl OrientationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: &Vector3<f64>) {
        self.state
            .fixed_rows_mut::<3>(ANGULAR_VELOCITY)
            .copy_from(angular_velocity);
    }

    /// Replace the external quaternion, typically to seed a known starting
    /// attitude.
    pub fn set_quaternion(&mut self, orientation: UnitQuaternion<f64>) {
        self.orientation = orientation;
    }

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

    /// Advance the attitude by one step of the current angular velocity,
    /// composing on SO(3) exactly.
    pub fn apply_velocity(&mut self, dt: f64) {
        let rotation = so3::quat_exp(&(self.angular_velocity() * dt / 2.0));
        self.orientation = rotation * self.orientation;
        self.orientation.renormalize();
    }

    /// Attenuate the angular velocity by `damping^dt`.
    pub fn dampen_velocities(&mut self, damping: f64, dt: f64) {
        let attenuation = compute_attenuation(damping, dt);
        let mut angular = self.state.fixed_rows_mut::<3>(ANGULAR_VELOCITY);
        angular *= attenuation;
    }
}

impl State<ORIENTATION_STATE_DIM> for OrientationState {
    fn state_vector(&self) -> OrientationStateVec {
        self.state
    }

    fn set_state_vector(&mut self, state: OrientationStateVec) {
        self.state = state;
    }

    fn error_covariance(&self) -> OrientationStateMat {
        self.error_covariance
    }

    fn set_error_covariance(&mut self, covariance: OrientationStateMat) {
        self.error_covariance = covariance;
    }

    fn post_correct(&mut self) {
        self.externalize_rotation();
    }
}

impl HasAngularVelocity for OrientationState {
    fn angular_velocity(&self) -> Vector3<f64> {
        self.state.fixed_rows::<3>(ANGULAR_VELOCITY).clone_owned()
    }
}

impl HasCombinedQuaternion for OrientationState {
    fn combined_quaternion(&self) -> UnitQuaternion<f64> {
        so3::quat_exp(&(self.incremental_orientation() / 2.0)) * self.orientation
    }
}

impl HasIncrementalOrientation for OrientationState {
    fn incremental_orientation(&self) -> Vector3<f64> {
        self.state
            .fixed_rows::<3>(INCREMENTAL_ORIENTATION)
            .clone_owned()
    }

    fn external_quaternion(&self) -> UnitQuaternion<f64> {
        self.orientation
    }
}
