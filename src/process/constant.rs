//! Constant process model
//!
//! The mean does not move; uncertainty grows linearly with time from a
//! per-component noise rate. The usual companion of [`VectorState`] halves
//! inside an augmented state: bias and beacon estimates random-walk slowly
//! instead of evolving.
//!
//! [`VectorState`]: crate::state::VectorState

use crate::process::ProcessModel;
use crate::state::State;
use crate::types::{StateMat, StateVec};

#[derive(Clone, Copy, Debug)]
pub struct ConstantProcessModel<const N: usize> {
    noise_variances: StateVec<N>,
}

impl<const N: usize> Default for ConstantProcessModel<N> {
    fn default() -> Self {
        Self {
            noise_variances: StateVec::<N>::zeros(),
        }
    }
}

impl<const N: usize> ConstantProcessModel<N> {
    /// `noise_variances` are variance growth rates per second, one per
    /// state component.
    pub fn new(noise_variances: StateVec<N>) -> Self {
        Self { noise_variances }
    }

    pub fn set_noise_autocorrelation(&mut self, noise_variances: StateVec<N>) {
        self.noise_variances = noise_variances;
    }
}

impl<S: State<N>, const N: usize> ProcessModel<S, N> for ConstantProcessModel<N> {
    fn transition_matrix(&self, _state: &S, _dt: f64) -> StateMat<N> {
        StateMat::<N>::identity()
    }

    fn process_noise_covariance(&self, dt: f64) -> StateMat<N> {
        StateMat::<N>::from_diagonal(&(self.noise_variances * dt))
    }

    fn predict_state_only(&self, _state: &mut S, _dt: f64) {}
}
