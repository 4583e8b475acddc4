//! Absolute orientation measurements
//!
//! The innovation lives in the tangent space: twice the log of the
//! quaternion taking the predicted attitude to the measured one, using the
//! shorter of the two equivalent rotations. States with externalized
//! rotation predict only their incremental block, so the comparison
//! reassembles the full attitude first.

use nalgebra::{Matrix3, UnitQuaternion, Vector3};

use crate::measurement::{ExtendedMeasurement, Measurement};
use crate::so3;
use crate::state::{HasIncrementalOrientation, OrientationState, PoseState};
use crate::types::{JacobianMat, MeasureMat, MeasureVec};

/// Attitude fix as a unit quaternion, with tangent-space variances.
#[derive(Clone, Debug)]
pub struct AbsoluteOrientationMeasurement {
    measurement: UnitQuaternion<f64>,
    covariance: Matrix3<f64>,
}

impl AbsoluteOrientationMeasurement {
    /// `variance` is per tangent-space axis [rad^2].
    pub fn new(measurement: UnitQuaternion<f64>, variance: Vector3<f64>) -> Self {
        Self {
            measurement,
            covariance: Matrix3::from_diagonal(&variance),
        }
    }

    pub fn set_measurement(&mut self, measurement: UnitQuaternion<f64>) {
        self.measurement = measurement;
    }
}

impl<S: HasIncrementalOrientation> Measurement<S, 3> for AbsoluteOrientationMeasurement {
    fn covariance(&self, _state: &S) -> MeasureMat<3> {
        self.covariance
    }

    fn predict_measurement(&self, state: &S) -> MeasureVec<3> {
        state.incremental_orientation()
    }

    fn residual_from_prediction(&self, prediction: &MeasureVec<3>, state: &S) -> MeasureVec<3> {
        // Rebuild the full attitude this prediction stands for before
        // comparing on the group.
        let predicted = so3::quat_exp(&(prediction / 2.0)) * state.external_quaternion();
        so3::smallest_quat_ln(&(self.measurement * predicted.inverse())) * 2.0
    }

    fn residual(&self, state: &S) -> MeasureVec<3> {
        so3::smallest_quat_ln(&(self.measurement * state.combined_quaternion().inverse())) * 2.0
    }
}

impl ExtendedMeasurement<PoseState, 12, 3> for AbsoluteOrientationMeasurement {
    fn jacobian(&self, _state: &PoseState) -> JacobianMat<3, 12> {
        let mut jacobian = JacobianMat::<3, 12>::zeros();
        jacobian.fixed_view_mut::<3, 3>(0, 3).fill_with_identity();
        jacobian
    }
}

impl ExtendedMeasurement<OrientationState, 6, 3> for AbsoluteOrientationMeasurement {
    fn jacobian(&self, _state: &OrientationState) -> JacobianMat<3, 6> {
        let mut jacobian = JacobianMat::<3, 6>::zeros();
        jacobian.fixed_view_mut::<3, 3>(0, 0).fill_with_identity();
        jacobian
    }
}
