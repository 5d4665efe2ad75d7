use crate::covariance::error::{CovarianceError, check_decay_rate, check_dimension};
use crate::covariance::scatter::ScatterCore;
use crate::covariance::switching_mean::SwitchingMean;
use crate::covariance::tracker::{CovarianceTracker, EstimatorSnapshot, TrackerKind};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, trace};

/// Recency-weighted mean and covariance.
///
/// The first `bootstrap_count` observations are combined with equal weights,
/// exactly like [`EmpiricalEstimator`](crate::covariance::EmpiricalEstimator).
/// After that every update blends
///
/// ```text
/// cov  = (1 - r) · cov  + r · (x - m)(x - m)ᵀ
/// mean = (1 - r) · mean + r · x
/// ```
///
/// where `m` is the running mean before the update, or a caller supplied
/// target.
#[derive(Debug, Clone, PartialEq)]
pub struct EmaEstimator {
    decay_rate: f64,
    bootstrap_count: usize,
    running_mean: SwitchingMean,
    covariance: DMatrix<f64>,
    targeted: bool,
}

impl EmaEstimator {
    pub const DEFAULT_DECAY_RATE: f64 = 0.025;
    pub const MIN_SAMPLES: usize = 1;

    /// `bootstrap_count` defaults to `round(1 / decay_rate)`. The first
    /// observation always seeds the mean and covariance, so an explicit
    /// `Some(0)` starts decaying from the second observation on.
    pub fn new(
        dimension: usize,
        decay_rate: f64,
        bootstrap_count: Option<usize>,
    ) -> Result<Self, CovarianceError> {
        if dimension < 1 {
            return Err(CovarianceError::InvalidDimension(dimension));
        }
        check_decay_rate(decay_rate)?;
        let bootstrap_count = bootstrap_count.unwrap_or_else(|| default_bootstrap_count(decay_rate));
        Ok(Self {
            decay_rate,
            bootstrap_count,
            running_mean: SwitchingMean::new(dimension, decay_rate, bootstrap_count)?,
            covariance: DMatrix::zeros(dimension, dimension),
            targeted: false,
        })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.running_mean.dimension()
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.running_mean.sample_count()
    }

    #[inline]
    pub fn decay_rate(&self) -> f64 {
        self.decay_rate
    }

    #[inline]
    pub fn bootstrap_count(&self) -> usize {
        self.bootstrap_count
    }

    #[inline]
    pub fn mean(&self) -> &DVector<f64> {
        self.running_mean.mean()
    }

    /// `true` while the next observation is still weighted empirically.
    #[inline]
    pub fn is_bootstrapping(&self) -> bool {
        self.sample_count() < self.bootstrap_count
    }

    /// Folds `x` in. With a `target`, deviations are taken from it instead
    /// of the running mean.
    pub fn update(&mut self, x: &[f64], target: Option<&[f64]>) -> Result<(), CovarianceError> {
        check_dimension(self.dimension(), x.len())?;
        if let Some(t) = target {
            check_dimension(self.dimension(), t.len())?;
        }
        let x = DVector::from_column_slice(x);
        let target = target.map(DVector::from_column_slice);
        self.fold(&x, None, target.as_ref());
        Ok(())
    }

    /// Folds the cross contribution `(x - t)(y - t)ᵀ` against `target`.
    /// Inputs are assumed validated.
    pub(crate) fn update_cross(&mut self, x: &DVector<f64>, y: &DVector<f64>, target: &DVector<f64>) {
        self.fold(x, Some(y), Some(target));
    }

    fn fold(&mut self, x: &DVector<f64>, y: Option<&DVector<f64>>, target: Option<&DVector<f64>>) {
        let bootstrapping = self.is_bootstrapping() || self.sample_count() == 0;
        let n = (self.sample_count() + 1) as f64;

        let contribution = match target {
            Some(t) => {
                let dx = x - t;
                let dy = y.map_or_else(|| dx.clone(), |y| y - t);
                &dx * dy.transpose()
            }
            None => {
                let dx = x - self.running_mean.mean();
                if bootstrapping {
                    // (x - m_old)(x - m_new)ᵀ with m_new = m_old + dx / n
                    &dx * dx.transpose() * ((n - 1.0) / n)
                } else {
                    &dx * dx.transpose()
                }
            }
        };

        let weight = if bootstrapping { 1.0 / n } else { self.decay_rate };
        self.covariance = &self.covariance * (1.0 - weight) + contribution * weight;
        self.running_mean.update_vector(x);
        self.targeted |= target.is_some();

        if bootstrapping && !self.is_bootstrapping() {
            debug!(
                samples = self.sample_count(),
                decay_rate = self.decay_rate,
                "bootstrap complete, switching to exponential weighting"
            );
        }
    }

    pub fn covariance(&self) -> Result<DMatrix<f64>, CovarianceError> {
        if self.sample_count() < Self::MIN_SAMPLES {
            return Err(CovarianceError::InsufficientData {
                required: Self::MIN_SAMPLES,
                actual: self.sample_count(),
            });
        }
        Ok(self.covariance.clone())
    }

    /// Merges two estimators that are both still in bootstrap and would stay
    /// there combined. Any other pairing has no defined blending rule and
    /// fails with [`CovarianceError::UnsupportedOperation`].
    pub fn merge(&self, other: &EmaEstimator) -> Result<EmaEstimator, CovarianceError> {
        if self.dimension() != other.dimension()
            || self.decay_rate != other.decay_rate
            || self.bootstrap_count != other.bootstrap_count
        {
            return Err(CovarianceError::UnsupportedOperation(
                "EMA estimators differ in dimension, decay rate or bootstrap count".into(),
            ));
        }
        if self.targeted || other.targeted {
            return Err(CovarianceError::UnsupportedOperation(
                "EMA estimators centred on an explicit target cannot be merged".into(),
            ));
        }
        let total = self.sample_count() + other.sample_count();
        if total > self.bootstrap_count {
            return Err(CovarianceError::UnsupportedOperation(format!(
                "merging {} and {} samples leaves the bootstrap phase of {}",
                self.sample_count(),
                other.sample_count(),
                self.bootstrap_count
            )));
        }

        trace!(
            left = self.sample_count(),
            right = other.sample_count(),
            "merging bootstrap EMA estimators"
        );

        let running_mean = self.running_mean.merge(&other.running_mean)?;
        let core = self.as_scatter().merge(&other.as_scatter())?;
        let covariance = if total > 0 {
            core.scatter() / total as f64
        } else {
            DMatrix::zeros(self.dimension(), self.dimension())
        };

        Ok(EmaEstimator {
            decay_rate: self.decay_rate,
            bootstrap_count: self.bootstrap_count,
            running_mean,
            covariance,
            targeted: false,
        })
    }

    fn as_scatter(&self) -> ScatterCore {
        let n = self.sample_count() as f64;
        ScatterCore::from_parts(n, self.running_mean.mean().clone(), &self.covariance * n)
    }
}

pub(crate) fn default_bootstrap_count(decay_rate: f64) -> usize {
    (1.0 / decay_rate).round() as usize
}

impl CovarianceTracker for EmaEstimator {
    fn kind(&self) -> TrackerKind {
        TrackerKind::Ema
    }

    fn dimension(&self) -> usize {
        EmaEstimator::dimension(self)
    }

    fn sample_count(&self) -> usize {
        EmaEstimator::sample_count(self)
    }

    fn observe(&mut self, x: &[f64]) -> Result<(), CovarianceError> {
        self.update(x, None)
    }

    fn mean(&self) -> &DVector<f64> {
        self.running_mean.mean()
    }

    fn covariance(&self) -> Result<DMatrix<f64>, CovarianceError> {
        EmaEstimator::covariance(self)
    }

    fn snapshot(&self) -> EstimatorSnapshot {
        let mut snap = EstimatorSnapshot::base(
            TrackerKind::Ema,
            EmaEstimator::sample_count(self),
            self.running_mean.mean(),
            EmaEstimator::covariance(self).ok(),
        );
        snap.decay_rate = Some(self.decay_rate);
        snap.bootstrap_count = Some(self.bootstrap_count);
        snap
    }
}
