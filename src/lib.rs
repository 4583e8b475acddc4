//! Kalman-filter framework for 6-DoF pose and 3-DoF orientation tracking
//!
//! The building blocks compose through three traits: [`state::State`]
//! carries a mean and error covariance plus a `post_correct` hook for
//! quaternion bookkeeping, [`process::ProcessModel`] advances a state
//! through time, and [`measurement::Measurement`] scores a state against
//! a sensor sample. Corrections come in two flavors: a classic
//! linearized update for measurements with an analytic Jacobian
//! ([`filter::correct_extended`]) and a sigma-point update for anything
//! nonlinear ([`filter::correct_unscented`]). Either way, a correction
//! that fails leaves the state exactly as it was.
//!
//! [`fusion::PoseFusion`] packages the common rigid-body tracking flow,
//! fusing timestamped gyro, orientation, and optical position samples:
//!
//! ```
//! use nalgebra::{UnitQuaternion, Vector3};
//! use pose_fusion::{FusionConfig, PoseFusion};
//!
//! let mut fusion = PoseFusion::new(FusionConfig::default());
//! fusion.process_orientation(0, UnitQuaternion::identity(), None);
//! fusion.process_position(10_000_000, Vector3::new(0.0, 1.09, 0.0), None);
//!
//! let pose = fusion.predicted_pose();
//! assert!(pose.position_tracked && pose.orientation_tracked);
//! ```

pub mod error;
pub mod filter;
pub mod fusion;
pub mod measurement;
pub mod process;
pub mod so3;
pub mod state;
pub mod types;

pub use error::{CorrectionError, CorrectionResult};
pub use filter::{
    begin_extended_correction, correct_extended, correct_unscented, get_prediction, predict,
    CorrectionInProgress, SigmaPointParameters,
};
pub use fusion::{FusionConfig, PoseEstimate, PoseFusion};
pub use measurement::{ExtendedMeasurement, Measurement};
pub use process::ProcessModel;
pub use state::{PoseState, State};
