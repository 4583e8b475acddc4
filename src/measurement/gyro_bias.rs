//! Gyroscope measurement with an estimated additive bias
//!
//! Works on an augmented state whose first half tracks motion and whose
//! second half is a three-component bias. The model predicts the
//! calibrated rate `bias + raw`; the innovation is the motion half's
//! angular velocity estimate minus that prediction, so corrections walk
//! the bias toward whatever offset reconciles the gyro with the estimate.
//! Only the bias half moves: the prediction depends on no motion-state
//! component, which leaves the cross-covariance rows for the first half
//! at zero.

use nalgebra::{Matrix3, Vector3};

use crate::measurement::Measurement;
use crate::state::{AugmentedState, HasAngularVelocity, State};
use crate::types::{MeasureMat, MeasureVec};

#[derive(Clone, Debug)]
pub struct BiasedGyroMeasurement {
    angular_velocity: Vector3<f64>,
    covariance: Matrix3<f64>,
}

impl BiasedGyroMeasurement {
    /// `angular_velocity` is the raw gyro reading [rad/s], `variance` the
    /// sensor noise per axis [(rad/s)^2].
    pub fn new(angular_velocity: Vector3<f64>, variance: Vector3<f64>) -> Self {
        Self {
            angular_velocity,
            covariance: Matrix3::from_diagonal(&variance),
        }
    }

    pub fn set_measurement(&mut self, angular_velocity: Vector3<f64>) {
        self.angular_velocity = angular_velocity;
    }
}

impl<'a, A, B> Measurement<AugmentedState<'a, A, B>, 3> for BiasedGyroMeasurement
where
    A: HasAngularVelocity,
    B: State<3>,
{
    fn covariance(&self, _state: &AugmentedState<'a, A, B>) -> MeasureMat<3> {
        self.covariance
    }

    fn predict_measurement(&self, state: &AugmentedState<'a, A, B>) -> MeasureVec<3> {
        state.b().state_vector() + self.angular_velocity
    }

    fn residual_from_prediction(
        &self,
        prediction: &MeasureVec<3>,
        state: &AugmentedState<'a, A, B>,
    ) -> MeasureVec<3> {
        state.a().angular_velocity() - prediction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{OrientationState, VectorState};
    use approx::assert_relative_eq;

    #[test]
    fn test_prediction_is_bias_plus_raw_rate() {
        let measurement =
            BiasedGyroMeasurement::new(Vector3::new(0.1, 0.0, 0.0), Vector3::repeat(1e-4));
        let mut motion = OrientationState::default();
        let mut bias = VectorState::<3>::new(
            Vector3::new(-0.02, 0.01, 0.0),
            nalgebra::Matrix3::identity(),
        );

        let augmented = AugmentedState::new(&mut motion, &mut bias);
        assert_relative_eq!(
            measurement.predict_measurement(&augmented),
            Vector3::new(0.08, 0.01, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_residual_compares_calibrated_rate_to_estimate() {
        let measurement =
            BiasedGyroMeasurement::new(Vector3::new(0.5, 0.0, 0.0), Vector3::repeat(1e-4));
        let mut motion = OrientationState::default();
        motion.set_angular_velocity(&Vector3::new(0.45, 0.0, 0.0));
        let mut bias = VectorState::<3>::default();

        let augmented = AugmentedState::new(&mut motion, &mut bias);
        // Zero bias: calibrated rate is the raw 0.5, estimate says 0.45,
        // so the bias should be pulled negative.
        assert_relative_eq!(
            measurement.residual(&augmented),
            Vector3::new(-0.05, 0.0, 0.0),
            epsilon = 1e-12
        );
    }
}
