//! Linear algebra type system for the filter framework
//!
//! Provides compile-time dimension checking and clean type aliases
//! shared by the state, process-model, measurement, and correction modules.

use nalgebra::{SMatrix, SVector};

// ===== State Dimensions =====
pub const POSE_STATE_DIM: usize = 12;
pub const ORIENTATION_STATE_DIM: usize = 6;

// ===== Measurement Dimensions =====
pub const MEASURE_DIM_VEC3: usize = 3; // position, orientation increment, angular velocity

// ===== Generic State Types =====
pub type StateVec<const N: usize> = SVector<f64, N>;
pub type StateMat<const N: usize> = SMatrix<f64, N, N>;

// ===== Pose / Orientation Filter Types =====
pub type PoseStateVec = StateVec<POSE_STATE_DIM>;
pub type PoseStateMat = StateMat<POSE_STATE_DIM>;
pub type OrientationStateVec = StateVec<ORIENTATION_STATE_DIM>;
pub type OrientationStateMat = StateMat<ORIENTATION_STATE_DIM>;

// ===== Measurement Types =====
pub type MeasureVec<const M: usize> = SVector<f64, M>;
pub type MeasureMat<const M: usize> = SMatrix<f64, M, M>;

// Jacobian and gain-shaped types (M rows into N state columns and back)
pub type JacobianMat<const M: usize, const N: usize> = SMatrix<f64, M, N>;
pub type GainShapedMat<const N: usize, const M: usize> = SMatrix<f64, N, M>;
