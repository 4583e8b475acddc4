//! Body-frame angular velocity measurement, e.g. a calibrated gyroscope.

use nalgebra::{Matrix3, Vector3};

use crate::measurement::{ExtendedMeasurement, Measurement};
use crate::state::{ExpMapPoseState, HasAngularVelocity, OrientationState, PoseState};
use crate::types::{JacobianMat, MeasureMat, MeasureVec};

#[derive(Clone, Debug)]
pub struct AngularVelocityMeasurement {
    measurement: Vector3<f64>,
    covariance: Matrix3<f64>,
}

impl AngularVelocityMeasurement {
    /// `variance` is per axis [(rad/s)^2].
    pub fn new(measurement: Vector3<f64>, variance: Vector3<f64>) -> Self {
        Self {
            measurement,
            covariance: Matrix3::from_diagonal(&variance),
        }
    }

    pub fn set_measurement(&mut self, measurement: Vector3<f64>) {
        self.measurement = measurement;
    }
}

impl<S: HasAngularVelocity> Measurement<S, 3> for AngularVelocityMeasurement {
    fn covariance(&self, _state: &S) -> MeasureMat<3> {
        self.covariance
    }

    fn predict_measurement(&self, state: &S) -> MeasureVec<3> {
        state.angular_velocity()
    }

    fn residual_from_prediction(
        &self,
        prediction: &MeasureVec<3>,
        _state: &S,
    ) -> MeasureVec<3> {
        self.measurement - prediction
    }
}

impl ExtendedMeasurement<PoseState, 12, 3> for AngularVelocityMeasurement {
    fn jacobian(&self, _state: &PoseState) -> JacobianMat<3, 12> {
        let mut jacobian = JacobianMat::<3, 12>::zeros();
        jacobian.fixed_view_mut::<3, 3>(0, 9).fill_with_identity();
        jacobian
    }
}

impl ExtendedMeasurement<ExpMapPoseState, 12, 3> for AngularVelocityMeasurement {
    fn jacobian(&self, _state: &ExpMapPoseState) -> JacobianMat<3, 12> {
        let mut jacobian = JacobianMat::<3, 12>::zeros();
        jacobian.fixed_view_mut::<3, 3>(0, 9).fill_with_identity();
        jacobian
    }
}

impl ExtendedMeasurement<OrientationState, 6, 3> for AngularVelocityMeasurement {
    fn jacobian(&self, _state: &OrientationState) -> JacobianMat<3, 6> {
        let mut jacobian = JacobianMat::<3, 6>::zeros();
        jacobian.fixed_view_mut::<3, 3>(0, 3).fill_with_identity();
        jacobian
    }
}
