//! Prediction and correction drivers
//!
//! The filter itself is stateless: callers hold a state and a process
//! model and hand both to these free functions. Correction comes in two
//! flavors, a linearized (extended) path for measurements with a Jacobian
//! and a sigma-point path for everything else. Either way a failed
//! correction reports an error and leaves the state exactly as it was.

pub mod extended;
pub mod unscented;

pub use extended::{begin_extended_correction, correct_extended, CorrectionInProgress};
pub use unscented::{correct_unscented, SigmaPointParameters};

use crate::process::ProcessModel;
use crate::state::State;

/// Advance mean and covariance by `dt` [s].
pub fn predict<S, PM, const N: usize>(state: &mut S, process_model: &PM, dt: f64)
where
    S: State<N>,
    PM: ProcessModel<S, N>,
{
    process_model.predict_state(state, dt);
}

/// Advance only the mean, then restore state invariants. Useful for
/// cheap dead-reckoning steps where the covariance is not consumed.
pub fn predict_and_post_correct_state_only<S, PM, const N: usize>(
    state: &mut S,
    process_model: &PM,
    dt: f64,
) where
    S: State<N>,
    PM: ProcessModel<S, N>,
{
    process_model.predict_state_only(state, dt);
    state.post_correct();
}

/// Predicted copy of `state` at `dt` seconds ahead, leaving the filter
/// itself untouched. Covariance propagation is optional because render
/// lookahead only reads the mean.
pub fn get_prediction<S, PM, const N: usize>(
    state: &S,
    process_model: &PM,
    dt: f64,
    predict_covariance: bool,
) -> S
where
    S: State<N> + Clone,
    PM: ProcessModel<S, N>,
{
    let mut predicted = state.clone();
    if predict_covariance {
        process_model.predict_state(&mut predicted, dt);
    } else {
        process_model.predict_state_only(&mut predicted, dt);
    }
    predicted.post_correct();
    predicted
}
