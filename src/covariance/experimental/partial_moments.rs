use crate::covariance::EmaEstimator;
use crate::covariance::ema::default_bootstrap_count;
use crate::covariance::error::{CovarianceError, check_decay_rate, check_dimension};
use crate::covariance::experimental::quadrant::{Quadrant, clip};
use crate::covariance::switching_mean::SwitchingMean;
use crate::covariance::tracker::{CovarianceTracker, EstimatorSnapshot, TrackerKind};
use nalgebra::{DMatrix, DVector};
use strum::IntoEnumIterator;
use tracing::warn;

/// **Experimental.** Recency-weighted scatter split by the sign quadrant of
/// each pair of deviations from a target.
///
/// Every observation's deviation `d = x - target` is clipped per quadrant
/// and the clipped pair `(d₁, d₂)` is folded into that quadrant's own EMA
/// accumulator as `d₁ d₂ᵀ`. The reported matrix is the sum of the four
/// quadrant matrices.
///
/// The discordant quadrant matrices are not symmetric and none of the four
/// is a covariance on its own. The sum is only guaranteed to agree with an
/// EMA covariance when the target is fixed; with the implicit running-mean
/// target it is an approximation. Do not rely on it where standard
/// covariance semantics are required.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialMomentEstimator {
    decay_rate: f64,
    target: Option<DVector<f64>>,
    running_mean: SwitchingMean,
    quadrants: [EmaEstimator; Quadrant::COUNT],
}

impl PartialMomentEstimator {
    pub const MIN_SAMPLES: usize = 2;

    /// Without a `target`, deviations are taken from a running mean that is
    /// empirical for the first `round(1 / decay_rate)` observations and
    /// exponential afterwards.
    pub fn new(
        dimension: usize,
        decay_rate: f64,
        target: Option<Vec<f64>>,
    ) -> Result<Self, CovarianceError> {
        if dimension < 1 {
            return Err(CovarianceError::InvalidDimension(dimension));
        }
        check_decay_rate(decay_rate)?;
        if let Some(t) = &target {
            check_dimension(dimension, t.len())?;
        }

        let accumulator = EmaEstimator::new(dimension, decay_rate, None)?;
        warn!(
            dimension,
            decay_rate, "partial-moment estimator is experimental; output is not a standard covariance"
        );

        Ok(Self {
            decay_rate,
            target: target.map(DVector::from_vec),
            running_mean: SwitchingMean::new(dimension, decay_rate, default_bootstrap_count(decay_rate))?,
            quadrants: std::array::from_fn(|_| accumulator.clone()),
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
    pub fn target(&self) -> Option<&DVector<f64>> {
        self.target.as_ref()
    }

    #[inline]
    pub fn mean(&self) -> &DVector<f64> {
        self.running_mean.mean()
    }

    pub fn update(&mut self, x: &[f64]) -> Result<(), CovarianceError> {
        check_dimension(self.dimension(), x.len())?;
        let x = DVector::from_column_slice(x);

        let deviation = match &self.target {
            Some(t) => &x - t,
            // no reference point before the first observation
            None if self.running_mean.sample_count() == 0 => DVector::zeros(x.len()),
            None => &x - self.running_mean.mean(),
        };
        let origin = DVector::zeros(x.len());

        for q in Quadrant::iter() {
            let (row_sign, col_sign) = q.signs();
            let d1 = deviation.map(|d| clip(d, row_sign));
            let d2 = deviation.map(|d| clip(d, col_sign));
            self.quadrants[q.index()].update_cross(&d1, &d2, &origin);
        }

        self.running_mean.update_vector(&x);
        Ok(())
    }

    /// Accumulated matrix of a single quadrant.
    pub fn quadrant_covariance(&self, quadrant: Quadrant) -> Result<DMatrix<f64>, CovarianceError> {
        self.quadrants[quadrant.index()].covariance()
    }

    /// Sum of the four quadrant matrices, available from the second
    /// observation on.
    pub fn covariance(&self) -> Result<DMatrix<f64>, CovarianceError> {
        if self.sample_count() < Self::MIN_SAMPLES {
            return Err(CovarianceError::InsufficientData {
                required: Self::MIN_SAMPLES,
                actual: self.sample_count(),
            });
        }
        let mut total = DMatrix::zeros(self.dimension(), self.dimension());
        for q in Quadrant::iter() {
            total += self.quadrant_covariance(q)?;
        }
        Ok(total)
    }
}

impl CovarianceTracker for PartialMomentEstimator {
    fn kind(&self) -> TrackerKind {
        TrackerKind::PartialMoment
    }

    fn dimension(&self) -> usize {
        PartialMomentEstimator::dimension(self)
    }

    fn sample_count(&self) -> usize {
        PartialMomentEstimator::sample_count(self)
    }

    fn observe(&mut self, x: &[f64]) -> Result<(), CovarianceError> {
        self.update(x)
    }

    fn mean(&self) -> &DVector<f64> {
        self.running_mean.mean()
    }

    fn covariance(&self) -> Result<DMatrix<f64>, CovarianceError> {
        PartialMomentEstimator::covariance(self)
    }

    fn snapshot(&self) -> EstimatorSnapshot {
        let mut snap = EstimatorSnapshot::base(
            TrackerKind::PartialMoment,
            PartialMomentEstimator::sample_count(self),
            self.running_mean.mean(),
            PartialMomentEstimator::covariance(self).ok(),
        );
        snap.decay_rate = Some(self.decay_rate);
        snap.target = self.target.as_ref().map(|t| t.iter().copied().collect());
        snap
    }
}
