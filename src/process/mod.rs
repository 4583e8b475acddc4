//! Process models: how states evolve between measurements
//!
//! A model advances the mean (`predict_state_only`) and, through the
//! default `predict_state`, also propagates the error covariance with
//! `A P A^T + Q`. Damping folds into both the transition matrix and the
//! mean update so the two stay consistent.

pub mod augmented;
pub mod constant;
pub mod constant_velocity;
pub mod damped;

pub use augmented::AugmentedProcessModel;
pub use constant::ConstantProcessModel;
pub use constant_velocity::{OrientationConstantVelocityModel, PoseConstantVelocityModel};
pub use damped::{PoseDampedConstantVelocityModel, PoseSeparatelyDampedConstantVelocityModel};

use crate::state::State;
use crate::types::StateMat;

/// A process model for states of dimension `N`.
pub trait ProcessModel<S: State<N>, const N: usize> {
    /// State transition matrix `A` for a step of length `dt` [s].
    fn transition_matrix(&self, state: &S, dt: f64) -> StateMat<N>;

    /// Sampled process noise covariance `Q` accumulated over `dt` [s].
    fn process_noise_covariance(&self, dt: f64) -> StateMat<N>;

    /// Advance the mean only, leaving the covariance untouched.
    fn predict_state_only(&self, state: &mut S, dt: f64);

    /// Advance mean and covariance together.
    fn predict_state(&self, state: &mut S, dt: f64) {
        let transition = self.transition_matrix(state, dt);
        let noise = self.process_noise_covariance(dt);
        self.predict_state_only(state, dt);
        let predicted =
            transition * state.error_covariance() * transition.transpose() + noise;
        state.set_error_covariance(predicted);
    }
}
