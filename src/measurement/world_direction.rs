//! Body-frame observation of a known world-frame direction
//!
//! Covers accelerometer gravity "up" and magnetometer north: the sensor
//! reports a unit direction in body coordinates, and the state's attitude
//! says where that world reference should currently point in the body
//! frame. Both vectors are normalized on construction; only their
//! directions carry information.

use nalgebra::{Matrix3, Vector3};

use crate::measurement::Measurement;
use crate::state::HasCombinedQuaternion;
use crate::types::{MeasureMat, MeasureVec};

#[derive(Clone, Debug)]
pub struct WorldDirectionMeasurement {
    direction: Vector3<f64>,
    reference: Vector3<f64>,
    covariance: Matrix3<f64>,
}

impl WorldDirectionMeasurement {
    /// `direction` is the sensed unit vector in body space, `reference`
    /// the world-frame direction it observes.
    pub fn new(direction: Vector3<f64>, reference: Vector3<f64>, variance: f64) -> Self {
        Self {
            direction: direction.normalize(),
            reference: reference.normalize(),
            covariance: Matrix3::from_diagonal_element(variance),
        }
    }

    pub fn set_measurement(&mut self, direction: Vector3<f64>) {
        self.direction = direction.normalize();
    }
}

impl<S: HasCombinedQuaternion> Measurement<S, 3> for WorldDirectionMeasurement {
    fn covariance(&self, _state: &S) -> MeasureMat<3> {
        self.covariance
    }

    fn predict_measurement(&self, state: &S) -> MeasureVec<3> {
        // Where the world reference points in body coordinates under the
        // state's attitude.
        state.combined_quaternion().inverse() * self.reference
    }

    fn residual_from_prediction(
        &self,
        prediction: &MeasureVec<3>,
        _state: &S,
    ) -> MeasureVec<3> {
        self.direction - prediction
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{OrientationState, PoseState, State};
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_residual_vanishes_for_consistent_attitude() {
        let up = Vector3::new(0.0, 1.0, 0.0);
        let measurement = WorldDirectionMeasurement::new(up, up, 1e-4);
        let state = OrientationState::default();

        assert!(measurement.residual(&state).norm() < 1e-12);
    }

    #[test]
    fn test_prediction_rotates_reference_into_body_frame() {
        let up = Vector3::new(0.0, 1.0, 0.0);
        let measurement = WorldDirectionMeasurement::new(up, up, 1e-4);

        // Device pitched 90 degrees about x: world up appears along -z in
        // body coordinates.
        let mut state = OrientationState::default();
        state.set_quaternion(UnitQuaternion::from_axis_angle(&Vector3::x_axis(), FRAC_PI_2));

        let predicted = measurement.predict_measurement(&state);
        assert_relative_eq!(predicted, Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-12);
    }

    #[test]
    fn test_inputs_are_normalized() {
        let measurement = WorldDirectionMeasurement::new(
            Vector3::new(0.0, 3.0, 0.0),
            Vector3::new(0.0, 0.5, 0.0),
            1e-4,
        );
        let state = OrientationState::default();
        assert!(measurement.residual(&state).norm() < 1e-12);
    }

    #[test]
    fn test_residual_senses_incremental_orientation() {
        // Sigma-point spread lands in the incremental block; the predicted
        // body direction must move with it.
        let up = Vector3::new(0.0, 1.0, 0.0);
        let measurement = WorldDirectionMeasurement::new(up, up, 1e-4);

        let mut state = PoseState::default();
        let baseline = measurement.predict_measurement(&state);
        let mut x = state.state_vector();
        x[3] = 0.3;
        state.set_state_vector(x);

        assert!((measurement.predict_measurement(&state) - baseline).norm() > 1e-2);
    }
}
