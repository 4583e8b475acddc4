//! Absolute position measurements
//!
//! Two flavors: a direct world-frame position fix, and a lever-arm variant
//! for markers mounted away from the tracked body origin, where the
//! sensed point depends on orientation as well as position.

use nalgebra::{Matrix3, Point3, Vector3};

use crate::measurement::{ExtendedMeasurement, Measurement};
use crate::state::{ExpMapPoseState, HasPose, HasPosition, PoseState};
use crate::types::{JacobianMat, MeasureMat, MeasureVec};

/// World-frame position fix of the body origin [m].
#[derive(Clone, Debug)]
pub struct AbsolutePositionMeasurement {
    measurement: Vector3<f64>,
    covariance: Matrix3<f64>,
}

impl AbsolutePositionMeasurement {
    pub fn new(measurement: Vector3<f64>, variance: Vector3<f64>) -> Self {
        Self {
            measurement,
            covariance: Matrix3::from_diagonal(&variance),
        }
    }

    /// Reuse the allocation-free measurement object across frames.
    pub fn set_measurement(&mut self, measurement: Vector3<f64>) {
        self.measurement = measurement;
    }
}

impl<S: HasPosition> Measurement<S, 3> for AbsolutePositionMeasurement {
    fn covariance(&self, _state: &S) -> MeasureMat<3> {
        self.covariance
    }

    fn predict_measurement(&self, state: &S) -> MeasureVec<3> {
        state.position()
    }

    fn residual_from_prediction(
        &self,
        prediction: &MeasureVec<3>,
        _state: &S,
    ) -> MeasureVec<3> {
        self.measurement - prediction
    }
}

impl ExtendedMeasurement<PoseState, 12, 3> for AbsolutePositionMeasurement {
    fn jacobian(&self, _state: &PoseState) -> JacobianMat<3, 12> {
        let mut jacobian = JacobianMat::<3, 12>::zeros();
        jacobian.fixed_view_mut::<3, 3>(0, 0).fill_with_identity();
        jacobian
    }
}

impl ExtendedMeasurement<ExpMapPoseState, 12, 3> for AbsolutePositionMeasurement {
    fn jacobian(&self, _state: &ExpMapPoseState) -> JacobianMat<3, 12> {
        let mut jacobian = JacobianMat::<3, 12>::zeros();
        jacobian.fixed_view_mut::<3, 3>(0, 0).fill_with_identity();
        jacobian
    }
}

/// World-frame position fix of a point rigidly offset from the body
/// origin.
///
/// The prediction runs the known body-space offset through the state's
/// full isometry, so orientation uncertainty flows into the innovation.
/// There is no closed-form Jacobian here; this measurement is meant for
/// the sigma-point corrector.
#[derive(Clone, Debug)]
pub struct AbsolutePositionLeverArmMeasurement {
    measurement: Vector3<f64>,
    known_location_in_body_space: Vector3<f64>,
    covariance: Matrix3<f64>,
}

impl AbsolutePositionLeverArmMeasurement {
    pub fn new(
        measurement: Vector3<f64>,
        known_location_in_body_space: Vector3<f64>,
        variance: Vector3<f64>,
    ) -> Self {
        Self {
            measurement,
            known_location_in_body_space,
            covariance: Matrix3::from_diagonal(&variance),
        }
    }

    pub fn set_measurement(&mut self, measurement: Vector3<f64>) {
        self.measurement = measurement;
    }
}

impl<S: HasPose> Measurement<S, 3> for AbsolutePositionLeverArmMeasurement {
    fn covariance(&self, _state: &S) -> MeasureMat<3> {
        self.covariance
    }

    fn predict_measurement(&self, state: &S) -> MeasureVec<3> {
        (state.isometry() * Point3::from(self.known_location_in_body_space)).coords
    }

    fn residual_from_prediction(
        &self,
        prediction: &MeasureVec<3>,
        _state: &S,
    ) -> MeasureVec<3> {
        self.measurement - prediction
    }
}
