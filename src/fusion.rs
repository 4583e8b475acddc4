//! End-to-end pose fusion for one tracked device
//!
//! Wires the pose state, the separately damped process model, and the
//! sigma-point corrector into the flow a tracker actually runs: IMU
//! samples and optical position fixes arrive with timestamps, corrections
//! that fail or disagree wildly reset the track, and consumers ask for a
//! slightly extrapolated pose to hide pipeline latency.

use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::filter::{correct_unscented, get_prediction, predict, SigmaPointParameters};
use crate::measurement::{
    AbsoluteOrientationMeasurement, AbsolutePositionLeverArmMeasurement,
    AngularVelocityMeasurement, Measurement,
};
use crate::process::PoseSeparatelyDampedConstantVelocityModel;
use crate::state::{HasAngularVelocity, HasCombinedQuaternion, HasPosition, PoseState};

/// Tuning for [`PoseFusion`]. Defaults suit a handheld controller with an
/// optical marker mounted above the grip.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Linear velocity damping factor per second.
    pub position_damping: f64,
    /// Angular velocity damping factor per second.
    pub orientation_damping: f64,
    /// White-acceleration autocorrelation for position.
    pub position_process_noise: f64,
    /// White-acceleration autocorrelation for orientation.
    pub orientation_process_noise: f64,
    /// Tangent-space variance of absolute orientation samples [rad^2].
    pub orientation_variance: f64,
    /// Per-axis variance of angular velocity samples [(rad/s)^2].
    pub angular_velocity_variance: f64,
    /// Per-axis variance of optical position fixes [m^2]; depth is
    /// usually worse than the image-plane axes.
    pub position_variance: (f64, f64, f64),
    /// Optical marker location in body space [m].
    pub lever_arm: (f64, f64, f64),
    /// An established track resets when a position residual exceeds this
    /// norm [m].
    pub position_residual_limit: f64,
    /// Default lookahead for predicted poses [s].
    pub prediction_horizon: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            position_damping: 0.3,
            orientation_damping: 0.01,
            position_process_noise: 0.01,
            orientation_process_noise: 0.1,
            orientation_variance: 0.01,
            angular_velocity_variance: 0.01,
            position_variance: (1e-4, 1e-4, 4e-4),
            lever_arm: (0.0, 0.09, 0.0),
            position_residual_limit: 1.0,
            prediction_horizon: 0.024,
        }
    }
}

/// Validity flags for one estimate channel.
#[derive(Clone, Copy, Debug, Default)]
struct TrackingStatus {
    valid: bool,
    tracked: bool,
}

/// Snapshot of the fused pose for consumers.
///
/// `valid` means the channel has usable data; `tracked` means it is
/// currently locked to an absolute reference rather than dead-reckoned.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoseEstimate {
    /// World-frame position (x, y, z) [m].
    pub position: (f64, f64, f64),
    /// World-frame orientation quaternion (w, x, y, z).
    pub orientation: (f64, f64, f64, f64),
    /// World-frame linear velocity (x, y, z) [m/s].
    pub linear_velocity: (f64, f64, f64),
    /// Body-frame angular velocity (x, y, z) [rad/s].
    pub angular_velocity: (f64, f64, f64),
    pub position_valid: bool,
    pub position_tracked: bool,
    pub orientation_valid: bool,
    pub orientation_tracked: bool,
}

impl Default for PoseEstimate {
    fn default() -> Self {
        Self {
            position: (0.0, 0.0, 0.0),
            orientation: (1.0, 0.0, 0.0, 0.0),
            linear_velocity: (0.0, 0.0, 0.0),
            angular_velocity: (0.0, 0.0, 0.0),
            position_valid: false,
            position_tracked: false,
            orientation_valid: false,
            orientation_tracked: false,
        }
    }
}

/// Timestamped sensor fusion around one pose filter.
pub struct PoseFusion {
    config: FusionConfig,
    state: PoseState,
    process_model: PoseSeparatelyDampedConstantVelocityModel,
    sigma_params: SigmaPointParameters,
    time_ns: Option<u64>,
    tracked: bool,
    position_status: TrackingStatus,
    orientation_status: TrackingStatus,
}

impl Default for PoseFusion {
    fn default() -> Self {
        Self::new(FusionConfig::default())
    }
}

impl PoseFusion {
    pub fn new(config: FusionConfig) -> Self {
        let process_model = PoseSeparatelyDampedConstantVelocityModel::new(
            config.position_damping,
            config.orientation_damping,
            config.position_process_noise,
            config.orientation_process_noise,
        );
        Self {
            config,
            state: PoseState::default(),
            process_model,
            sigma_params: SigmaPointParameters::default(),
            time_ns: None,
            tracked: false,
            position_status: TrackingStatus::default(),
            orientation_status: TrackingStatus::default(),
        }
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    /// The filter state, for callers layering their own measurements on
    /// top of the built-in flow.
    pub fn state(&self) -> &PoseState {
        &self.state
    }

    /// Whether an absolute position lock is currently established.
    pub fn is_tracked(&self) -> bool {
        self.tracked
    }

    pub fn last_update_time_ns(&self) -> Option<u64> {
        self.time_ns
    }

    /// Forget everything: state, track flags, and the filter clock.
    pub fn reset(&mut self) {
        self.state = PoseState::default();
        self.time_ns = None;
        self.tracked = false;
        self.position_status = TrackingStatus::default();
        self.orientation_status = TrackingStatus::default();
    }

    /// Step the filter clock and return the elapsed seconds. The first
    /// sample and any timestamp at or before the newest one seen so far
    /// contribute a zero-length step.
    fn advance_clock(&mut self, timestamp_ns: u64) -> f64 {
        let dt = match self.time_ns {
            None => 0.0,
            Some(previous) if timestamp_ns <= previous => 0.0,
            Some(previous) => (timestamp_ns - previous) as f64 * 1e-9,
        };
        self.time_ns = Some(match self.time_ns {
            None => timestamp_ns,
            Some(previous) => previous.max(timestamp_ns),
        });
        dt
    }

    /// Absolute orientation sample, e.g. from an AHRS or gravity+yaw
    /// estimate.
    pub fn process_orientation(
        &mut self,
        timestamp_ns: u64,
        orientation: UnitQuaternion<f64>,
        variance: Option<Vector3<f64>>,
    ) {
        let dt = self.advance_clock(timestamp_ns);
        predict(&mut self.state, &self.process_model, dt);

        let variance =
            variance.unwrap_or_else(|| Vector3::repeat(self.config.orientation_variance));
        let measurement = AbsoluteOrientationMeasurement::new(orientation, variance);
        match correct_unscented(&mut self.state, &measurement, self.sigma_params, true) {
            Ok(()) => {
                self.orientation_status.valid = true;
                self.orientation_status.tracked = true;
            }
            Err(error) => {
                log::warn!("orientation correction failed: {}; resetting filter", error);
                self.reset_filter_and_orientation();
            }
        }
    }

    /// Calibrated gyro sample.
    pub fn process_angular_velocity(
        &mut self,
        timestamp_ns: u64,
        angular_velocity: Vector3<f64>,
        variance: Option<Vector3<f64>>,
    ) {
        let dt = self.advance_clock(timestamp_ns);
        predict(&mut self.state, &self.process_model, dt);

        let variance =
            variance.unwrap_or_else(|| Vector3::repeat(self.config.angular_velocity_variance));
        let measurement = AngularVelocityMeasurement::new(angular_velocity, variance);
        match correct_unscented(&mut self.state, &measurement, self.sigma_params, true) {
            Ok(()) => {
                self.orientation_status.valid = true;
            }
            Err(error) => {
                log::warn!(
                    "angular velocity correction failed: {}; resetting filter",
                    error
                );
                self.reset_filter_and_orientation();
            }
        }
    }

    /// Optical fix of the marker position in world space.
    pub fn process_position(
        &mut self,
        timestamp_ns: u64,
        position: Vector3<f64>,
        variance: Option<Vector3<f64>>,
    ) {
        let dt = self.advance_clock(timestamp_ns);
        predict(&mut self.state, &self.process_model, dt);

        let variance = variance.unwrap_or_else(|| {
            let (x, y, z) = self.config.position_variance;
            Vector3::new(x, y, z)
        });
        let (lever_x, lever_y, lever_z) = self.config.lever_arm;
        let measurement = AbsolutePositionLeverArmMeasurement::new(
            position,
            Vector3::new(lever_x, lever_y, lever_z),
            variance,
        );

        // An established track that suddenly disagrees this much is more
        // likely a misidentified marker than real motion. Start over and
        // let the correction below reacquire from scratch.
        if self.tracked {
            let residual = measurement.residual(&self.state).norm();
            if residual > self.config.position_residual_limit {
                log::warn!(
                    "position residual {:.3} m exceeds limit; restarting track",
                    residual
                );
                self.reset_filter();
            }
        }

        match correct_unscented(&mut self.state, &measurement, self.sigma_params, true) {
            Ok(()) => {
                self.tracked = true;
                self.position_status.valid = true;
                self.position_status.tracked = true;
            }
            Err(error) => {
                log::warn!("position correction failed: {}; restarting track", error);
                self.reset_filter();
            }
        }
    }

    /// Pose extrapolated by the configured lookahead.
    pub fn predicted_pose(&self) -> PoseEstimate {
        self.predicted_pose_at(self.config.prediction_horizon)
    }

    /// Pose extrapolated `lookahead_s` seconds past the newest sample.
    pub fn predicted_pose_at(&self, lookahead_s: f64) -> PoseEstimate {
        if !self.tracked && !self.orientation_status.valid {
            return PoseEstimate::default();
        }

        let predicted = get_prediction(&self.state, &self.process_model, lookahead_s, false);
        let position = predicted.position();
        let orientation = predicted.combined_quaternion();
        let linear_velocity = predicted.velocity();
        let angular_velocity = predicted.angular_velocity();
        PoseEstimate {
            position: (position.x, position.y, position.z),
            orientation: (orientation.w, orientation.i, orientation.j, orientation.k),
            linear_velocity: (linear_velocity.x, linear_velocity.y, linear_velocity.z),
            angular_velocity: (angular_velocity.x, angular_velocity.y, angular_velocity.z),
            position_valid: self.position_status.valid,
            position_tracked: self.position_status.tracked,
            orientation_valid: self.orientation_status.valid,
            orientation_tracked: self.orientation_status.tracked,
        }
    }

    /// Position reset that keeps the attitude channel: the fresh state is
    /// seeded with the current orientation and angular velocity, with the
    /// covariance widened back to its initial spread.
    fn reset_filter(&mut self) {
        let attitude = self.state.combined_quaternion();
        let angular_velocity = self.state.angular_velocity();
        self.state = PoseState::default();
        self.state.set_quaternion(attitude);
        self.state.set_angular_velocity(&angular_velocity);
        self.tracked = false;
        self.position_status = TrackingStatus::default();
    }

    fn reset_filter_and_orientation(&mut self) {
        self.state = PoseState::default();
        self.tracked = false;
        self.position_status = TrackingStatus::default();
        self.orientation_status = TrackingStatus::default();
    }
}
