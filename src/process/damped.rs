//! Damped constant-velocity process models
//!
//! Tracked objects held by a human drift to rest rather than coasting
//! forever. These models attenuate the velocity estimates by `damping^dt`
//! each step, in the transition matrix and in the mean update alike, so
//! covariance propagation and state propagation describe the same dynamics.
//! The mean advances by the pre-attenuation velocities and is damped
//! afterwards, matching the transition matrix, whose velocity-into-position
//! coupling is plain `dt` while only the velocity diagonal carries the
//! damping factor.

use crate::process::constant_velocity::{
    pose_transition_matrix_with_separate_velocity_damping,
    pose_transition_matrix_with_velocity_damping, PoseConstantVelocityModel,
};
use crate::process::ProcessModel;
use crate::state::PoseKinematics;
use crate::types::PoseStateMat;

fn damping_in_range(damping: f64) -> bool {
    damping > 0.0 && damping < 1.0
}

/// Constant velocity with one damping factor for both velocity halves.
#[derive(Clone, Copy, Debug)]
pub struct PoseDampedConstantVelocityModel {
    constant_velocity: PoseConstantVelocityModel,
    damping: f64,
}

impl Default for PoseDampedConstantVelocityModel {
    fn default() -> Self {
        Self {
            constant_velocity: PoseConstantVelocityModel::default(),
            damping: 0.1,
        }
    }
}

impl PoseDampedConstantVelocityModel {
    pub fn new(damping: f64, position_noise: f64, orientation_noise: f64) -> Self {
        let mut model = Self {
            constant_velocity: PoseConstantVelocityModel::new(position_noise, orientation_noise),
            damping: Self::default().damping,
        };
        model.set_damping(damping);
        model
    }

    pub fn damping(&self) -> f64 {
        self.damping
    }

    /// Accepts only factors strictly inside (0, 1); anything else keeps the
    /// previous value.
    pub fn set_damping(&mut self, damping: f64) {
        if damping_in_range(damping) {
            self.damping = damping;
        }
    }

    pub fn set_noise_autocorrelation(&mut self, position_noise: f64, orientation_noise: f64) {
        self.constant_velocity
            .set_noise_autocorrelation(position_noise, orientation_noise);
    }
}

impl<S: PoseKinematics> ProcessModel<S, 12> for PoseDampedConstantVelocityModel {
    fn transition_matrix(&self, _state: &S, dt: f64) -> PoseStateMat {
        pose_transition_matrix_with_velocity_damping(dt, self.damping)
    }

    fn process_noise_covariance(&self, dt: f64) -> PoseStateMat {
        self.constant_velocity.noise_covariance(dt)
    }

    fn predict_state_only(&self, state: &mut S, dt: f64) {
        state.apply_velocity(dt);
        state.dampen_velocities(self.damping, dt);
    }
}

/// Constant velocity with independent damping for the linear and angular
/// velocity halves.
#[derive(Clone, Copy, Debug)]
pub struct PoseSeparatelyDampedConstantVelocityModel {
    constant_velocity: PoseConstantVelocityModel,
    position_damping: f64,
    orientation_damping: f64,
}

impl Default for PoseSeparatelyDampedConstantVelocityModel {
    fn default() -> Self {
        Self {
            constant_velocity: PoseConstantVelocityModel::default(),
            position_damping: 0.3,
            orientation_damping: 0.01,
        }
    }
}

impl PoseSeparatelyDampedConstantVelocityModel {
    pub fn new(
        position_damping: f64,
        orientation_damping: f64,
        position_noise: f64,
        orientation_noise: f64,
    ) -> Self {
        let defaults = Self::default();
        let mut model = Self {
            constant_velocity: PoseConstantVelocityModel::new(position_noise, orientation_noise),
            position_damping: defaults.position_damping,
            orientation_damping: defaults.orientation_damping,
        };
        model.set_damping(position_damping, orientation_damping);
        model
    }

    pub fn position_damping(&self) -> f64 {
        self.position_damping
    }

    pub fn orientation_damping(&self) -> f64 {
        self.orientation_damping
    }

    /// Each factor is validated independently against (0, 1); an
    /// out-of-range value keeps the previous setting for that half only.
    pub fn set_damping(&mut self, position_damping: f64, orientation_damping: f64) {
        if damping_in_range(position_damping) {
            self.position_damping = position_damping;
        }
        if damping_in_range(orientation_damping) {
            self.orientation_damping = orientation_damping;
        }
    }

    pub fn set_noise_autocorrelation(&mut self, position_noise: f64, orientation_noise: f64) {
        self.constant_velocity
            .set_noise_autocorrelation(position_noise, orientation_noise);
    }
}

impl<S: PoseKinematics> ProcessModel<S, 12> for PoseSeparatelyDampedConstantVelocityModel {
    fn transition_matrix(&self, _state: &S, dt: f64) -> PoseStateMat {
        pose_transition_matrix_with_separate_velocity_damping(
            dt,
            self.position_damping,
            self.orientation_damping,
        )
    }

    fn process_noise_covariance(&self, dt: f64) -> PoseStateMat {
        self.constant_velocity.noise_covariance(dt)
    }

    fn predict_state_only(&self, state: &mut S, dt: f64) {
        state.apply_velocity(dt);
        state.separately_dampen_velocities(self.position_damping, self.orientation_damping, dt);
    }
}
