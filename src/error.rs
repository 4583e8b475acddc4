use thiserror::Error;

/// Failure kinds of a single correction step.
///
/// Every variant is recoverable at the correction boundary: when a
/// correction returns an error, the state vector and error covariance are
/// guaranteed untouched, so the caller may drop the measurement, retry with
/// a different one, or escalate to a track reset.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrectionError {
    /// The innovation covariance could not be inverted.
    #[error("innovation covariance is singular")]
    SingularInnovation,

    /// The state correction contained NaN or infinite components.
    #[error("state correction is not finite")]
    NonFiniteCorrection,

    /// The posterior covariance contained NaN or infinite entries and the
    /// caller requested cancellation on that condition.
    #[error("updated error covariance is not finite")]
    NonFiniteCovariance,

    /// The augmented covariance was not positive definite, so no sigma
    /// points could be drawn from it (for example, a negative variance).
    #[error("covariance factorization failed")]
    CovarianceFactorization,
}

/// Result type for correction operations
pub type CorrectionResult<T> = Result<T, CorrectionError>;
