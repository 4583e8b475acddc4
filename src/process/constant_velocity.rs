//! Constant-velocity process models
//!
//! Velocities persist across the step and integrate into their paired
//! blocks. Process noise enters as white acceleration with autocorrelation
//! `mu` per block, which after sampling over `dt` gives the classic
//! `[mu dt^3/3, mu dt^2/2; mu dt^2/2, mu dt]` pattern per axis pair.

use crate::process::ProcessModel;
use crate::state::{OrientationState, PoseKinematics};
use crate::types::{OrientationStateMat, PoseStateMat};

// ===== Transition and noise builders (12-dimensional pose layout) =====

/// `A` for a constant-velocity pose step: identity plus `dt` coupling each
/// velocity row into its integrated counterpart.
pub fn pose_transition_matrix(dt: f64) -> PoseStateMat {
    let mut a = PoseStateMat::identity();
    for i in 0..6 {
        a[(i, i + 6)] = dt;
    }
    a
}

/// Constant-velocity transition with one attenuation factor applied to the
/// whole velocity half.
pub fn pose_transition_matrix_with_velocity_damping(dt: f64, damping: f64) -> PoseStateMat {
    let mut a = pose_transition_matrix(dt);
    let attenuation = crate::state::compute_attenuation(damping, dt);
    for i in 6..12 {
        a[(i, i)] *= attenuation;
    }
    a
}

/// Constant-velocity transition with linear and angular velocity halves
/// attenuated independently.
pub fn pose_transition_matrix_with_separate_velocity_damping(
    dt: f64,
    position_damping: f64,
    orientation_damping: f64,
) -> PoseStateMat {
    let mut a = pose_transition_matrix(dt);
    let linear = crate::state::compute_attenuation(position_damping, dt);
    let angular = crate::state::compute_attenuation(orientation_damping, dt);
    for i in 6..9 {
        a[(i, i)] *= linear;
    }
    for i in 9..12 {
        a[(i, i)] *= angular;
    }
    a
}

/// Sampled process noise for the pose layout. `position_noise` drives the
/// three translational axis pairs, `orientation_noise` the rotational ones.
pub fn pose_process_noise_covariance(
    dt: f64,
    position_noise: f64,
    orientation_noise: f64,
) -> PoseStateMat {
    let mut q = PoseStateMat::zeros();
    let dt_squared = dt * dt;
    let dt_cubed = dt_squared * dt;
    for i in 0..6 {
        let j = i + 6;
        let mu = if i < 3 { position_noise } else { orientation_noise };
        q[(i, i)] = mu * dt_cubed / 3.0;
        q[(i, j)] = mu * dt_squared / 2.0;
        q[(j, i)] = mu * dt_squared / 2.0;
        q[(j, j)] = mu * dt;
    }
    q
}

// ===== Transition and noise builders (6-dimensional orientation layout) =====

pub fn orientation_transition_matrix(dt: f64) -> OrientationStateMat {
    let mut a = OrientationStateMat::identity();
    for i in 0..3 {
        a[(i, i + 3)] = dt;
    }
    a
}

pub fn orientation_process_noise_covariance(dt: f64, orientation_noise: f64) -> OrientationStateMat {
    let mut q = OrientationStateMat::zeros();
    let dt_squared = dt * dt;
    let dt_cubed = dt_squared * dt;
    for i in 0..3 {
        let j = i + 3;
        q[(i, i)] = orientation_noise * dt_cubed / 3.0;
        q[(i, j)] = orientation_noise * dt_squared / 2.0;
        q[(j, i)] = orientation_noise * dt_squared / 2.0;
        q[(j, j)] = orientation_noise * dt;
    }
    q
}

// ===== Models =====

/// Undamped constant-velocity model for either 12-dimensional pose state.
#[derive(Clone, Copy, Debug)]
pub struct PoseConstantVelocityModel {
    position_noise: f64,
    orientation_noise: f64,
}

impl Default for PoseConstantVelocityModel {
    fn default() -> Self {
        Self {
            position_noise: 0.01,
            orientation_noise: 0.1,
        }
    }
}

impl PoseConstantVelocityModel {
    pub fn new(position_noise: f64, orientation_noise: f64) -> Self {
        Self {
            position_noise,
            orientation_noise,
        }
    }

    /// Tune the white-acceleration autocorrelation per block.
    pub fn set_noise_autocorrelation(&mut self, position_noise: f64, orientation_noise: f64) {
        self.position_noise = position_noise;
        self.orientation_noise = orientation_noise;
    }

    /// `Q` for a step of `dt`, independent of the state representation.
    pub fn noise_covariance(&self, dt: f64) -> PoseStateMat {
        pose_process_noise_covariance(dt, self.position_noise, self.orientation_noise)
    }
}

impl<S: PoseKinematics> ProcessModel<S, 12> for PoseConstantVelocityModel {
    fn transition_matrix(&self, _state: &S, dt: f64) -> PoseStateMat {
        pose_transition_matrix(dt)
    }

    fn process_noise_covariance(&self, dt: f64) -> PoseStateMat {
        self.noise_covariance(dt)
    }

    fn predict_state_only(&self, state: &mut S, dt: f64) {
        state.apply_velocity(dt);
    }
}

/// Undamped constant-velocity model for the orientation-only state.
#[derive(Clone, Copy, Debug)]
pub struct OrientationConstantVelocityModel {
    orientation_noise: f64,
}

impl Default for OrientationConstantVelocityModel {
    fn default() -> Self {
        Self {
            orientation_noise: 0.1,
        }
    }
}

impl OrientationConstantVelocityModel {
    pub fn new(orientation_noise: f64) -> Self {
        Self { orientation_noise }
    }
}

impl ProcessModel<OrientationState, 6> for OrientationConstantVelocityModel {
    fn transition_matrix(&self, _state: &OrientationState, dt: f64) -> OrientationStateMat {
        orientation_transition_matrix(dt)
    }

    fn process_noise_covariance(&self, dt: f64) -> OrientationStateMat {
        orientation_process_noise_covariance(dt, self.orientation_noise)
    }

    fn predict_state_only(&self, state: &mut OrientationState, dt: f64) {
        state.apply_velocity(dt);
    }
}
