//! State representations for pose and orientation filtering
//!
//! Every variant stores a mean vector and an error covariance and knows how
//! to restore its own invariants after a correction (`post_correct`). The
//! capability traits describe what a state can report (position, angular
//! velocity, full orientation), so process models, measurements, and the
//! correction engines can be written once against the capabilities they
//! actually consume.

pub mod augmented;
pub mod expmap;
pub mod orientation;
pub mod pose;
pub mod vector;

pub use augmented::AugmentedState;
pub use expmap::ExpMapPoseState;
pub use orientation::OrientationState;
pub use pose::PoseState;
pub use vector::VectorState;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};

use crate::types::{StateMat, StateVec, POSE_STATE_DIM};

/// Contract shared by every filterable state.
///
/// `N` is the state dimension. Correction engines read and write the mean
/// and covariance through this trait and call [`post_correct`] after
/// applying a state delta.
///
/// [`post_correct`]: State::post_correct
pub trait State<const N: usize> {
    /// The mean estimate `x`.
    fn state_vector(&self) -> StateVec<N>;

    /// Overwrite the mean estimate.
    fn set_state_vector(&mut self, state: StateVec<N>);

    /// The error covariance `P`.
    fn error_covariance(&self) -> StateMat<N>;

    /// Overwrite the error covariance.
    fn set_error_covariance(&mut self, covariance: StateMat<N>);

    /// Restore representation invariants after a correction: externalized
    /// rotations fold their increment into the external quaternion,
    /// exponential-map rotations wrap back into the principal ball, and
    /// plain vector states do nothing.
    fn post_correct(&mut self);
}

// ===== Capability traits =====

/// States carrying a world-frame position estimate [m].
pub trait HasPosition {
    fn position(&self) -> Vector3<f64>;
}

/// States carrying a body angular velocity estimate [rad/s].
pub trait HasAngularVelocity {
    fn angular_velocity(&self) -> Vector3<f64>;
}

/// States able to produce their full orientation as one unit quaternion.
pub trait HasCombinedQuaternion {
    fn combined_quaternion(&self) -> UnitQuaternion<f64>;
}

/// States whose orientation splits into an in-vector increment plus an
/// externally held quaternion.
///
/// For a state that keeps its whole rotation in the state vector the
/// external quaternion is the identity, so
/// `exp(increment / 2) * external == combined` holds for every implementor.
pub trait HasIncrementalOrientation: HasCombinedQuaternion {
    fn incremental_orientation(&self) -> Vector3<f64>;
    fn external_quaternion(&self) -> UnitQuaternion<f64>;
}

/// Position and orientation together, assembled into an isometry.
pub trait HasPose: HasPosition + HasCombinedQuaternion {
    fn isometry(&self) -> Isometry3<f64> {
        Isometry3::from_parts(Translation3::from(self.position()), self.combined_quaternion())
    }
}

impl<S: HasPosition + HasCombinedQuaternion> HasPose for S {}

/// 12-dimensional pose states that a constant-velocity process model can
/// drive: position 0..2, orientation increment 3..5, linear velocity 6..8,
/// angular velocity 9..11.
pub trait PoseKinematics: State<POSE_STATE_DIM> {
    /// Advance position and orientation by one step of the current
    /// velocities, composing rotations exactly on SO(3).
    fn apply_velocity(&mut self, dt: f64);

    /// Attenuate both velocity blocks by `damping^dt`.
    fn dampen_velocities(&mut self, damping: f64, dt: f64);

    /// Attenuate the linear and angular velocity blocks independently.
    fn separately_dampen_velocities(
        &mut self,
        position_damping: f64,
        orientation_damping: f64,
        dt: f64,
    );
}

/// Velocity attenuation factor accumulated over a time step.
pub(crate) fn compute_attenuation(damping: f64, dt: f64) -> f64 {
    damping.powf(dt)
}
