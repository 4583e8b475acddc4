//! Measurement models: what sensors say about a state
//!
//! A measurement compares what the sensor reported with what the current
//! state implies it should have reported. The base trait is enough for the
//! sigma-point corrector, which only ever evaluates the model; the
//! extended corrector additionally needs the measurement Jacobian, tied to
//! one concrete state layout.

pub mod angular_velocity;
pub mod gyro_bias;
pub mod orientation;
pub mod position;
pub mod world_direction;

pub use angular_velocity::AngularVelocityMeasurement;
pub use gyro_bias::BiasedGyroMeasurement;
pub use orientation::AbsoluteOrientationMeasurement;
pub use position::{AbsolutePositionLeverArmMeasurement, AbsolutePositionMeasurement};
pub use world_direction::WorldDirectionMeasurement;

use crate::types::{JacobianMat, MeasureMat, MeasureVec};

/// An `M`-dimensional measurement of a state `S`.
pub trait Measurement<S, const M: usize> {
    /// Measurement noise covariance `R`, possibly state dependent.
    fn covariance(&self, state: &S) -> MeasureMat<M>;

    /// What the sensor would report if `state` were exact.
    fn predict_measurement(&self, state: &S) -> MeasureVec<M>;

    /// Innovation given an externally supplied prediction, e.g. one
    /// reconstructed from transformed sigma points.
    fn residual_from_prediction(&self, prediction: &MeasureVec<M>, state: &S) -> MeasureVec<M>;

    /// Innovation against the state's own prediction.
    fn residual(&self, state: &S) -> MeasureVec<M> {
        self.residual_from_prediction(&self.predict_measurement(state), state)
    }
}

/// A measurement that can also linearize itself about a state, for the
/// extended (Jacobian-based) corrector. `N` is the state dimension.
pub trait ExtendedMeasurement<S, const N: usize, const M: usize>: Measurement<S, M> {
    /// `H = d(prediction)/d(state)` evaluated at `state`.
    fn jacobian(&self, state: &S) -> JacobianMat<M, N>;
}
