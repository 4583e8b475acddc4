//! Extended (linearized) correction
//!
//! Classic EKF measurement update with one structural difference: the
//! Kalman gain is never materialized. Both the state delta and the
//! covariance update are computed through `P H^T` and the inverted
//! innovation covariance, which keeps the covariance update symmetric in
//! form and skips an `N x M` intermediate.
//!
//! The update is split in two stages so callers can inspect the pending
//! delta, e.g. to gate on outlier innovations, before committing. Dropping
//! the in-progress value abandons the correction with the state untouched.

use crate::error::{CorrectionError, CorrectionResult};
use crate::measurement::ExtendedMeasurement;
use crate::state::State;
use crate::types::{StateMat, StateVec};

/// A computed but not yet applied extended correction.
pub struct CorrectionInProgress<'a, S, const N: usize> {
    state: &'a mut S,
    state_correction: StateVec<N>,
    updated_covariance: StateMat<N>,
}

impl<'a, S: State<N>, const N: usize> CorrectionInProgress<'a, S, N> {
    /// The pending state delta.
    pub fn state_correction(&self) -> &StateVec<N> {
        &self.state_correction
    }

    pub fn state_correction_finite(&self) -> bool {
        self.state_correction.iter().all(|value| value.is_finite())
    }

    /// Commit the correction: apply the delta, install the updated
    /// covariance, and let the state restore its invariants.
    ///
    /// With `cancel_if_not_finite` set, a non-finite updated covariance
    /// abandons the correction instead of corrupting the filter.
    pub fn finish_correction(self, cancel_if_not_finite: bool) -> CorrectionResult<()> {
        if cancel_if_not_finite
            && !self.updated_covariance.iter().all(|value| value.is_finite())
        {
            return Err(CorrectionError::NonFiniteCovariance);
        }
        let corrected = self.state.state_vector() + self.state_correction;
        self.state.set_state_vector(corrected);
        self.state.set_error_covariance(self.updated_covariance);
        self.state.post_correct();
        Ok(())
    }
}

/// Compute an extended correction without applying it.
pub fn begin_extended_correction<'a, S, Meas, const N: usize, const M: usize>(
    state: &'a mut S,
    measurement: &Meas,
) -> CorrectionResult<CorrectionInProgress<'a, S, N>>
where
    S: State<N>,
    Meas: ExtendedMeasurement<S, N, M>,
{
    // 1. Linearize the measurement about the current mean.
    let jacobian = measurement.jacobian(state);
    let measurement_noise = measurement.covariance(state);

    // 2. P H^T feeds the state delta and the covariance update alike.
    let covariance = state.error_covariance();
    let covariance_jacobian_t = covariance * jacobian.transpose();

    // 3. Innovation covariance S = H P H^T + R.
    let innovation_covariance = jacobian * covariance_jacobian_t + measurement_noise;
    let innovation_inverse = innovation_covariance
        .try_inverse()
        .ok_or(CorrectionError::SingularInnovation)?;

    // 4. State delta with the gain folded in: P H^T S^-1 dz.
    let innovation = measurement.residual(state);
    let state_correction = covariance_jacobian_t * (innovation_inverse * innovation);

    // 5. Updated covariance P - P H^T S^-1 (P H^T)^T.
    let updated_covariance =
        covariance - covariance_jacobian_t * innovation_inverse * covariance_jacobian_t.transpose();

    Ok(CorrectionInProgress {
        state,
        state_correction,
        updated_covariance,
    })
}

/// One-shot extended correction.
///
/// A non-finite state delta always cancels; a non-finite updated
/// covariance cancels only when `cancel_if_not_finite` is set. On any
/// error the state is left exactly as it was.
pub fn correct_extended<S, Meas, const N: usize, const M: usize>(
    state: &mut S,
    measurement: &Meas,
    cancel_if_not_finite: bool,
) -> CorrectionResult<()>
where
    S: State<N>,
    Meas: ExtendedMeasurement<S, N, M>,
{
    let in_progress = begin_extended_correction(state, measurement)?;
    if !in_progress.state_correction_finite() {
        return Err(CorrectionError::NonFiniteCorrection);
    }
    in_progress.finish_correction(cancel_if_not_finite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measurement::{AbsoluteOrientationMeasurement, AbsolutePositionMeasurement};
    use crate::state::{
        HasCombinedQuaternion, HasIncrementalOrientation, HasPosition, OrientationState,
        PoseState,
    };
    use crate::types::{PoseStateMat, PoseStateVec};
    use approx::assert_relative_eq;
    use nalgebra::{UnitQuaternion, Vector3};
    use std::f64::consts::FRAC_PI_4;

    #[test]
    fn test_position_correction_blends_by_variance_ratio() {
        let mut state = PoseState::default();
        state.set_error_covariance(PoseStateMat::identity());
        let measurement =
            AbsolutePositionMeasurement::new(Vector3::new(1.0, 1.0, 1.0), Vector3::repeat(0.01));

        correct_extended(&mut state, &measurement, true).unwrap();

        // Unit prior variance against 0.01 measurement variance: the
        // posterior sits at 1/1.01 of the way to the measurement and the
        // position variance drops to 0.01/1.01.
        let expected_position = 1.0 / 1.01;
        assert_relative_eq!(
            state.position(),
            Vector3::repeat(expected_position),
            epsilon = 1e-12
        );
        let p = state.error_covariance();
        assert_relative_eq!(p[(0, 0)], 0.01 / 1.01, epsilon = 1e-12);
        assert_relative_eq!(p[(1, 1)], 0.01 / 1.01, epsilon = 1e-12);
        // Unobserved blocks keep their prior variance.
        assert_relative_eq!(p[(6, 6)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_orientation_correction_lands_in_external_quaternion() {
        let mut state = OrientationState::default();
        let measured = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), FRAC_PI_4);
        let measurement =
            AbsoluteOrientationMeasurement::new(measured, Vector3::repeat(0.01));

        correct_extended(&mut state, &measurement, true).unwrap();

        // Unit prior variance pulls 1/1.01 of the quarter-pi residual into
        // the estimate, and post_correct folds it into the quaternion.
        let expected_angle = FRAC_PI_4 / 1.01;
        assert_eq!(state.incremental_orientation(), Vector3::zeros());
        let attitude = state.external_quaternion();
        assert_relative_eq!(attitude.angle(), expected_angle, epsilon = 1e-12);
        assert!(attitude.axis().unwrap().z > 0.99);
        assert!(state.combined_quaternion().angle_to(&attitude) < 1e-12);
    }

    #[test]
    fn test_repeated_corrections_converge_to_measurement() {
        let mut state = PoseState::default();
        let target = Vector3::new(0.2, -0.4, 1.1);
        let measurement = AbsolutePositionMeasurement::new(target, Vector3::repeat(1e-4));

        for _ in 0..20 {
            correct_extended(&mut state, &measurement, true).unwrap();
        }

        assert_relative_eq!(state.position(), target, epsilon = 1e-6);
        assert!(state.error_covariance()[(0, 0)] < 1e-4);
    }

    #[test]
    fn test_singular_innovation_cancels_without_touching_state() {
        let mut state = PoseState::default();
        state.set_error_covariance(PoseStateMat::identity());
        state.set_velocity(&Vector3::new(0.3, 0.0, 0.0));
        let before_x = state.state_vector();
        let before_p = state.error_covariance();
        let before_q = state.external_quaternion();

        // A negative variance matching the prior makes S exactly zero.
        let measurement =
            AbsolutePositionMeasurement::new(Vector3::new(1.0, 1.0, 1.0), Vector3::repeat(-1.0));
        let result = correct_extended(&mut state, &measurement, true);

        assert_eq!(result, Err(CorrectionError::SingularInnovation));
        assert_eq!(state.state_vector(), before_x);
        assert_eq!(state.error_covariance(), before_p);
        assert_eq!(state.external_quaternion(), before_q);
    }

    #[test]
    fn test_non_finite_residual_always_cancels() {
        let mut state = PoseState::default();
        let before_x = state.state_vector();
        let before_p = state.error_covariance();

        let measurement = AbsolutePositionMeasurement::new(
            Vector3::new(f64::NAN, 0.0, 0.0),
            Vector3::repeat(0.01),
        );
        let result = correct_extended(&mut state, &measurement, false);

        assert_eq!(result, Err(CorrectionError::NonFiniteCorrection));
        assert_eq!(state.state_vector(), before_x);
        assert_eq!(state.error_covariance(), before_p);
    }

    #[test]
    fn test_covariance_check_is_flag_gated() {
        // Drive finish_correction directly with a poisoned covariance to
        // pin down the flag semantics.
        let mut state = PoseState::default();
        let mut bad_covariance = PoseStateMat::identity();
        bad_covariance[(4, 4)] = f64::NAN;

        let in_progress = CorrectionInProgress {
            state: &mut state,
            state_correction: PoseStateVec::zeros(),
            updated_covariance: bad_covariance,
        };
        assert_eq!(
            in_progress.finish_correction(true),
            Err(CorrectionError::NonFiniteCovariance)
        );

        let in_progress = CorrectionInProgress {
            state: &mut state,
            state_correction: PoseStateVec::zeros(),
            updated_covariance: bad_covariance,
        };
        assert_eq!(in_progress.finish_correction(false), Ok(()));
        assert!(state.error_covariance()[(4, 4)].is_nan());
    }

    #[test]
    fn test_abandoning_in_progress_changes_nothing() {
        let mut state = PoseState::default();
        let before_x = state.state_vector();
        let measurement =
            AbsolutePositionMeasurement::new(Vector3::new(5.0, 5.0, 5.0), Vector3::repeat(0.01));

        {
            let in_progress = begin_extended_correction(&mut state, &measurement).unwrap();
            assert!(in_progress.state_correction().norm() > 1.0);
            // Dropped here without finish_correction.
        }

        assert_eq!(state.state_vector(), before_x);
    }
}
