use crate::covariance::error::{CovarianceError, check_dimension};
use crate::covariance::scatter::ScatterCore;
use crate::covariance::tracker::{CovarianceTracker, EstimatorSnapshot, TrackerKind};
use nalgebra::{DMatrix, DVector};
use tracing::trace;

/// Equal-weight population mean and covariance over every observation seen.
///
/// Two estimators fed from disjoint parts of a stream merge into exactly the
/// estimator that would have seen the whole stream.
#[derive(Debug, Clone, PartialEq)]
pub struct EmpiricalEstimator {
    core: ScatterCore,
    sample_count: usize,
}

impl EmpiricalEstimator {
    pub const MIN_SAMPLES: usize = 1;

    pub fn new(dimension: usize) -> Result<Self, CovarianceError> {
        Ok(Self {
            core: ScatterCore::new(dimension)?,
            sample_count: 0,
        })
    }

    /// Estimator fed with every row of `rows`, in order.
    pub fn from_rows<'a, I>(dimension: usize, rows: I) -> Result<Self, CovarianceError>
    where
        I: IntoIterator<Item = &'a [f64]>,
    {
        let mut est = Self::new(dimension)?;
        for row in rows {
            est.update(row)?;
        }
        Ok(est)
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.core.dimension()
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    #[inline]
    pub fn mean(&self) -> &DVector<f64> {
        self.core.mean()
    }

    /// Un-normalised scatter matrix `Σ (x - m)(x - m)ᵀ`.
    #[inline]
    pub fn scatter(&self) -> &DMatrix<f64> {
        self.core.scatter()
    }

    pub fn update(&mut self, x: &[f64]) -> Result<(), CovarianceError> {
        check_dimension(self.dimension(), x.len())?;
        self.update_vector(&DVector::from_column_slice(x));
        Ok(())
    }

    pub(crate) fn update_vector(&mut self, x: &DVector<f64>) {
        self.core.update_vector(x, 1.0);
        self.sample_count += 1;
    }

    /// Population covariance `scatter / n`.
    pub fn covariance(&self) -> Result<DMatrix<f64>, CovarianceError> {
        if self.sample_count < Self::MIN_SAMPLES {
            return Err(CovarianceError::InsufficientData {
                required: Self::MIN_SAMPLES,
                actual: self.sample_count,
            });
        }
        Ok(self.core.scatter() / self.sample_count as f64)
    }

    pub fn merge(&self, other: &EmpiricalEstimator) -> Result<EmpiricalEstimator, CovarianceError> {
        trace!(
            left = self.sample_count,
            right = other.sample_count,
            "merging empirical estimators"
        );
        Ok(EmpiricalEstimator {
            core: self.core.merge(&other.core)?,
            sample_count: self.sample_count + other.sample_count,
        })
    }
}

impl CovarianceTracker for EmpiricalEstimator {
    fn kind(&self) -> TrackerKind {
        TrackerKind::Empirical
    }

    fn dimension(&self) -> usize {
        EmpiricalEstimator::dimension(self)
    }

    fn sample_count(&self) -> usize {
        self.sample_count
    }

    fn observe(&mut self, x: &[f64]) -> Result<(), CovarianceError> {
        self.update(x)
    }

    fn mean(&self) -> &DVector<f64> {
        self.core.mean()
    }

    fn covariance(&self) -> Result<DMatrix<f64>, CovarianceError> {
        EmpiricalEstimator::covariance(self)
    }

    fn snapshot(&self) -> EstimatorSnapshot {
        EstimatorSnapshot::base(
            TrackerKind::Empirical,
            self.sample_count,
            self.core.mean(),
            EmpiricalEstimator::covariance(self).ok(),
        )
    }
}
