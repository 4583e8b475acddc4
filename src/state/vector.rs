//! Plain N-dimensional vector state
//!
//! No manifold structure and nothing to restore after a correction. Used
//! standalone for simple estimation problems and as the second half of an
//! augmented state (sensor bias, beacon position, and similar nuisance
//! parameters).

use crate::state::State;
use crate::types::{StateMat, StateVec};

#[derive(Clone, Debug)]
pub struct VectorState<const N: usize> {
    state: StateVec<N>,
    error_covariance: StateMat<N>,
}

impl<const N: usize> Default for VectorState<N> {
    fn default() -> Self {
        Self {
            state: StateVec::<N>::zeros(),
            error_covariance: StateMat::<N>::identity(),
        }
    }
}

impl<const N: usize> VectorState<N> {
    pub fn new(state: StateVec<N>, error_covariance: StateMat<N>) -> Self {
        Self {
            state,
            error_covariance,
        }
    }
}

impl<const N: usize> State<N> for VectorState<N> {
    fn state_vector(&self) -> StateVec<N> {
        self.state
    }

    fn set_state_vector(&mut self, state: StateVec<N>) {
        self.state = state;
    }

    fn error_covariance(&self) -> StateMat<N> {
        self.error_covariance
    }

    fn set_error_covariance(&mut self, covariance: StateMat<N>) {
        self.error_covariance = covariance;
    }

    fn post_correct(&mut self) {}
}
