use crate::covariance::error::{CovarianceError, check_dimension};
use nalgebra::DMatrix;

/// Normalises a covariance matrix into a correlation matrix:
/// `ρᵢⱼ = Σᵢⱼ / sqrt(Σᵢᵢ Σⱼⱼ)`, with an exact unit diagonal.
///
/// Fails with [`CovarianceError::DegenerateVariance`] when any variance is
/// not strictly positive.
pub fn covariance_to_correlation(cov: &DMatrix<f64>) -> Result<DMatrix<f64>, CovarianceError> {
    check_dimension(cov.nrows(), cov.ncols())?;

    let mut scale = Vec::with_capacity(cov.nrows());
    for (index, &variance) in cov.diagonal().iter().enumerate() {
        if !(variance > 0.0) {
            return Err(CovarianceError::DegenerateVariance { index, variance });
        }
        scale.push(variance.sqrt());
    }

    Ok(DMatrix::from_fn(cov.nrows(), cov.ncols(), |i, j| {
        if i == j {
            1.0
        } else {
            cov[(i, j)] / (scale[i] * scale[j])
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn known_two_by_two() {
        let cov = DMatrix::from_row_slice(2, 2, &[4.0, 3.0, 3.0, 9.0]);
        let corr = covariance_to_correlation(&cov).unwrap();
        assert_eq!(corr[(0, 0)], 1.0);
        assert_eq!(corr[(1, 1)], 1.0);
        assert_relative_eq!(corr[(0, 1)], 0.5, epsilon = 1e-12);
        assert_relative_eq!(corr[(1, 0)], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn zero_variance_is_degenerate() {
        let cov = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(
            covariance_to_correlation(&cov),
            Err(CovarianceError::DegenerateVariance {
                index: 1,
                variance: 0.0
            })
        );
    }

    #[test]
    fn nan_variance_is_degenerate() {
        let cov = DMatrix::from_row_slice(1, 1, &[f64::NAN]);
        assert!(matches!(
            covariance_to_correlation(&cov),
            Err(CovarianceError::DegenerateVariance { index: 0, .. })
        ));
    }

    #[test]
    fn non_square_is_rejected() {
        let m = DMatrix::<f64>::zeros(2, 3);
        assert!(matches!(
            covariance_to_correlation(&m),
            Err(CovarianceError::DimensionMismatch { .. })
        ));
    }
}
