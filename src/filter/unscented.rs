//! Sigma-point (unscented) correction
//!
//! Correction path for measurements without a usable Jacobian. The state
//! is augmented with the measurement noise dimensions, so noise enters
//! through the sigma points themselves: each point carries a noise offset
//! that is added to its transformed measurement. The noise covariance is
//! therefore counted exactly once and never added separately.
//!
//! Sigma points are generated by perturbing the live state in place and
//! evaluating the measurement model; the mean is restored before anything
//! fallible runs, so every error path leaves the state bitwise as it was.

use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

use crate::error::{CorrectionError, CorrectionResult};
use crate::measurement::Measurement;
use crate::state::State;
use crate::types::{GainShapedMat, MeasureMat, MeasureVec, StateVec};

/// Tuning for the scaled sigma-point spread.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SigmaPointParameters {
    /// Spread of the sigma points around the mean; small and positive.
    pub alpha: f64,
    /// Prior-distribution weight on the center covariance point; 2 is
    /// optimal for Gaussian priors.
    pub beta: f64,
    /// Secondary scaling, conventionally zero.
    pub kappa: f64,
}

impl Default for SigmaPointParameters {
    fn default() -> Self {
        Self {
            alpha: 1e-3,
            beta: 2.0,
            kappa: 0.0,
        }
    }
}

/// Sigma-point correction of `state` by one measurement.
///
/// A non-finite state delta always cancels; a non-finite updated
/// covariance cancels only when `cancel_if_not_finite` is set. On any
/// error the state is left exactly as it was.
pub fn correct_unscented<S, Meas, const N: usize, const M: usize>(
    state: &mut S,
    measurement: &Meas,
    params: SigmaPointParameters,
    cancel_if_not_finite: bool,
) -> CorrectionResult<()>
where
    S: State<N>,
    Meas: Measurement<S, M>,
{
    let aug_dim = N + M;
    let lambda =
        params.alpha * params.alpha * (aug_dim as f64 + params.kappa) - aug_dim as f64;
    let scaled_dim = aug_dim as f64 + lambda;

    // 1. Augment the covariance with the measurement noise block.
    let covariance = state.error_covariance();
    let measurement_noise = measurement.covariance(state);
    let mut augmented = DMatrix::<f64>::zeros(aug_dim, aug_dim);
    augmented.view_mut((0, 0), (N, N)).copy_from(&covariance);
    augmented
        .view_mut((N, N), (M, M))
        .copy_from(&measurement_noise);

    // 2. Matrix square root of (L + lambda) P_aug. Cholesky doubles as the
    //    health check: an indefinite augmented covariance fails here,
    //    before the state is touched.
    let chol = (augmented * scaled_dim)
        .cholesky()
        .ok_or(CorrectionError::CovarianceFactorization)?;
    let sqrt = chol.l();

    // 3. Push the 2L+1 sigma points through the measurement model,
    //    perturbing the state in place. Noise-block rows offset the
    //    transformed measurement directly.
    let mean = state.state_vector();
    let center = measurement.predict_measurement(state);
    let mut transformed: Vec<MeasureVec<M>> = Vec::with_capacity(2 * aug_dim + 1);
    transformed.push(center);
    for sign in [1.0, -1.0] {
        for col in 0..aug_dim {
            let mut perturbed = mean;
            for row in 0..N {
                perturbed[row] += sign * sqrt[(row, col)];
            }
            state.set_state_vector(perturbed);
            let mut predicted = measurement.predict_measurement(state);
            for row in 0..M {
                predicted[row] += sign * sqrt[(N + row, col)];
            }
            transformed.push(predicted);
        }
    }
    state.set_state_vector(mean);

    // 4. Weights of the scaled transform.
    let center_weight = lambda / scaled_dim;
    let center_cov_weight = center_weight + (1.0 - params.alpha * params.alpha + params.beta);
    let spread_weight = 1.0 / (2.0 * scaled_dim);

    // 5. Reconstruct the predicted measurement mean.
    let mut predicted_mean = transformed[0] * center_weight;
    for point in &transformed[1..] {
        predicted_mean += point * spread_weight;
    }

    // 6. Innovation covariance and state-measurement cross covariance.
    //    The state-block deviation of the plus point in each column is the
    //    column head, and its negation for the minus point, so both fold
    //    into one rank-1 term per column.
    let center_deviation = transformed[0] - predicted_mean;
    let mut innovation_covariance: MeasureMat<M> =
        (center_deviation * center_deviation.transpose()) * center_cov_weight;
    let mut cross_covariance = GainShapedMat::<N, M>::zeros();
    for col in 0..aug_dim {
        let plus = transformed[1 + col] - predicted_mean;
        let minus = transformed[1 + aug_dim + col] - predicted_mean;
        innovation_covariance += (plus * plus.transpose()) * spread_weight;
        innovation_covariance += (minus * minus.transpose()) * spread_weight;

        let mut state_deviation = StateVec::<N>::zeros();
        for row in 0..N {
            state_deviation[row] = sqrt[(row, col)];
        }
        cross_covariance += state_deviation * (plus - minus).transpose() * spread_weight;
    }

    // 7. Solve for the correction. The mean is already restored, so any
    //    bail-out below is clean.
    let innovation_inverse = innovation_covariance
        .try_inverse()
        .ok_or(CorrectionError::SingularInnovation)?;
    let innovation = measurement.residual_from_prediction(&predicted_mean, state);
    let state_correction = cross_covariance * (innovation_inverse * innovation);
    if !state_correction.iter().all(|value| value.is_finite()) {
        return Err(CorrectionError::NonFiniteCorrection);
    }

    // 8. Covariance downdate, same shape as the extended path with the
    //    cross covariance standing in for P H^T.
    let updated_covariance =
        covariance - cross_covariance * innovation_inverse * cross_covariance.transpose();
    if cancel_if_not_finite && !updated_covariance.iter().all(|value| value.is_finite()) {
        return Err(CorrectionError::NonFiniteCovariance);
    }

    // 9. Commit.
    state.set_state_vector(mean + state_correction);
    state.set_error_covariance(updated_covariance);
    state.post_correct();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::extended::correct_extended;
    use crate::measurement::{
        AbsoluteOrientationMeasurement, AbsolutePositionLeverArmMeasurement,
        AbsolutePositionMeasurement, AngularVelocityMeasurement, BiasedGyroMeasurement,
    };
    use crate::state::{
        AugmentedState, ExpMapPoseState, HasAngularVelocity, HasCombinedQuaternion, HasPosition,
        OrientationState, PoseState, VectorState,
    };
    use crate::types::{PoseStateMat, StateMat};
    use approx::assert_relative_eq;
    use nalgebra::{UnitQuaternion, Vector3};

    #[test]
    fn test_linear_measurement_agrees_with_extended_path() {
        // For a linear measurement model both correctors implement the
        // same exact Kalman update and must agree to rounding error.
        let measurement =
            AbsolutePositionMeasurement::new(Vector3::new(1.0, 1.0, 1.0), Vector3::repeat(0.01));

        let mut extended_state = PoseState::default();
        extended_state.set_error_covariance(PoseStateMat::identity());
        correct_extended(&mut extended_state, &measurement, true).unwrap();

        let mut sigma_state = PoseState::default();
        sigma_state.set_error_covariance(PoseStateMat::identity());
        correct_unscented(
            &mut sigma_state,
            &measurement,
            SigmaPointParameters::default(),
            true,
        )
        .unwrap();

        assert_relative_eq!(
            sigma_state.position(),
            extended_state.position(),
            epsilon = 1e-6
        );
        assert_relative_eq!(
            sigma_state.error_covariance(),
            extended_state.error_covariance(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn test_angular_velocity_estimate_converges() {
        let params = SigmaPointParameters::default();
        let measurement =
            AngularVelocityMeasurement::new(Vector3::new(0.5, 0.0, 0.0), Vector3::repeat(0.01));
        let mut state = OrientationState::default();

        for _ in 0..50 {
            correct_unscented(&mut state, &measurement, params, true).unwrap();
        }

        let estimate = state.angular_velocity();
        assert!((estimate.x - 0.5).abs() < 1e-3);
        assert!(estimate.y.abs() < 1e-6);
        assert!(estimate.z.abs() < 1e-6);
        assert!(state.error_covariance()[(3, 3)] < 0.01);
    }

    #[test]
    fn test_indefinite_noise_cancels_bitwise() {
        let params = SigmaPointParameters::default();
        let mut state = PoseState::default();
        state.set_velocity(&Vector3::new(0.1, 0.2, 0.3));
        let before_x = state.state_vector();
        let before_p = state.error_covariance();

        let measurement =
            AbsolutePositionMeasurement::new(Vector3::new(1.0, 1.0, 1.0), Vector3::repeat(-1.0));
        let result = correct_unscented(&mut state, &measurement, params, true);

        assert_eq!(result, Err(CorrectionError::CovarianceFactorization));
        assert_eq!(state.state_vector(), before_x);
        assert_eq!(state.error_covariance(), before_p);
    }

    #[test]
    fn test_position_fix_leaves_augmented_beacon_half_alone() {
        // The position model never reads the beacon half and the joint
        // covariance is block diagonal, so a position fix must not move
        // the beacon estimate or its covariance at all.
        let params = SigmaPointParameters::default();
        let mut pose = PoseState::default();
        let mut beacon = VectorState::<3>::new(
            Vector3::new(1.5, 0.25, 0.0),
            StateMat::<3>::identity() * 4.0,
        );
        let beacon_x = beacon.state_vector();
        let beacon_p = beacon.error_covariance();

        let measurement =
            AbsolutePositionMeasurement::new(Vector3::new(0.4, 0.0, 0.0), Vector3::repeat(1e-4));
        {
            let mut augmented = AugmentedState::new(&mut pose, &mut beacon);
            correct_unscented(&mut augmented, &measurement, params, true).unwrap();
        }

        assert!(pose.position().x > 0.3);
        assert_eq!(beacon.state_vector(), beacon_x);
        assert_eq!(beacon.error_covariance(), beacon_p);
    }

    #[test]
    fn test_gyro_bias_walks_to_reconciling_offset() {
        // Motion estimate says the device is still while the gyro reads a
        // constant 0.2 rad/s: the bias must absorb the difference.
        let params = SigmaPointParameters::default();
        let measurement =
            BiasedGyroMeasurement::new(Vector3::new(0.2, 0.0, 0.0), Vector3::repeat(1e-4));
        let mut motion = OrientationState::default();
        let mut bias = VectorState::<3>::default();

        for _ in 0..10 {
            let mut augmented = AugmentedState::new(&mut motion, &mut bias);
            correct_unscented(&mut augmented, &measurement, params, true).unwrap();
        }

        assert!((bias.state_vector().x - (-0.2)).abs() < 1e-3);
        assert!(bias.state_vector().y.abs() < 1e-6);
        // The motion half supplied the reference, not the correction.
        assert!(motion.angular_velocity().norm() < 1e-9);
    }

    #[test]
    fn test_lever_arm_fix_keeps_covariance_symmetric_positive() {
        let params = SigmaPointParameters::default();
        let mut state = PoseState::default();
        state.set_quaternion(UnitQuaternion::from_euler_angles(0.2, 0.1, -0.3));
        let measurement = AbsolutePositionLeverArmMeasurement::new(
            Vector3::new(0.3, 1.1, -0.2),
            Vector3::new(0.0, 0.09, 0.0),
            Vector3::new(1e-4, 1e-4, 4e-4),
        );

        correct_unscented(&mut state, &measurement, params, true).unwrap();

        let p = state.error_covariance();
        assert!((p - p.transpose()).norm() < 1e-9);
        for eigenvalue in p.symmetric_eigenvalues().iter() {
            assert!(*eigenvalue > -1e-9);
        }
    }

    #[test]
    fn test_orientation_fix_on_exponential_map_state() {
        let params = SigmaPointParameters::default();
        let target = UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 2.5);
        let measurement = AbsoluteOrientationMeasurement::new(target, Vector3::repeat(1e-4));
        let mut state = ExpMapPoseState::default();

        for _ in 0..20 {
            correct_unscented(&mut state, &measurement, params, true).unwrap();
        }

        assert!(state.combined_quaternion().angle_to(&target) < 1e-2);
        assert!(state.rotation_vector().norm() <= std::f64::consts::PI);
    }
}
