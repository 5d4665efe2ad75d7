use thiserror::Error;

/// Failures raised by the covariance estimators.
///
/// All of these are deterministic contract violations; none is retried or
/// defaulted away.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CovarianceError {
    #[error("invalid dimension {0}: an estimator needs at least one dimension")]
    InvalidDimension(usize),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid decay rate {0}: must lie in (0, 1]")]
    InvalidDecayRate(f64),

    #[error("invalid weight {0}: must be finite and positive")]
    InvalidWeight(f64),

    #[error("insufficient data: need at least {required} observations, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    #[error("degenerate variance {variance} at index {index}: cannot normalise")]
    DegenerateVariance { index: usize, variance: f64 },

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

#[inline]
pub(crate) fn check_dimension(expected: usize, actual: usize) -> Result<(), CovarianceError> {
    if expected == actual {
        Ok(())
    } else {
        Err(CovarianceError::DimensionMismatch { expected, actual })
    }
}

#[inline]
pub(crate) fn check_decay_rate(decay_rate: f64) -> Result<(), CovarianceError> {
    if decay_rate > 0.0 && decay_rate <= 1.0 {
        Ok(())
    } else {
        Err(CovarianceError::InvalidDecayRate(decay_rate))
    }
}

#[inline]
pub(crate) fn check_weight(weight: f64) -> Result<(), CovarianceError> {
    if weight.is_finite() && weight > 0.0 {
        Ok(())
    } else {
        Err(CovarianceError::InvalidWeight(weight))
    }
}
