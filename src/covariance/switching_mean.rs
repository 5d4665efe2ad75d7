use crate::covariance::error::{CovarianceError, check_decay_rate, check_dimension};
use nalgebra::DVector;

/// Running mean that averages the first `warmup` observations with equal
/// weight and then switches to an exponential moving average with rate `r`.
///
/// The first observation always seeds the mean, even with `warmup = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchingMean {
    decay_rate: f64,
    warmup: usize,
    sample_count: usize,
    mean: DVector<f64>,
}

impl SwitchingMean {
    pub fn new(dimension: usize, decay_rate: f64, warmup: usize) -> Result<Self, CovarianceError> {
        if dimension < 1 {
            return Err(CovarianceError::InvalidDimension(dimension));
        }
        check_decay_rate(decay_rate)?;
        Ok(Self {
            decay_rate,
            warmup,
            sample_count: 0,
            mean: DVector::zeros(dimension),
        })
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    #[inline]
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    #[inline]
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    #[inline]
    pub fn decay_rate(&self) -> f64 {
        self.decay_rate
    }

    #[inline]
    pub fn warmup(&self) -> usize {
        self.warmup
    }

    /// `true` while the next observation still gets equal weighting.
    #[inline]
    pub fn is_warming_up(&self) -> bool {
        self.sample_count < self.warmup
    }

    pub fn update(&mut self, x: &[f64]) -> Result<(), CovarianceError> {
        check_dimension(self.dimension(), x.len())?;
        self.update_vector(&DVector::from_column_slice(x));
        Ok(())
    }

    pub(crate) fn update_vector(&mut self, x: &DVector<f64>) {
        let weight = if self.is_warming_up() || self.sample_count == 0 {
            1.0 / (self.sample_count + 1) as f64
        } else {
            self.decay_rate
        };
        let delta = x - &self.mean;
        self.mean.axpy(weight, &delta, 1.0);
        self.sample_count += 1;
    }

    /// Count-weighted combination; only defined while the combined count is
    /// still inside warm-up, where the mean is an ordinary average.
    pub fn merge(&self, other: &SwitchingMean) -> Result<SwitchingMean, CovarianceError> {
        if self.dimension() != other.dimension()
            || self.warmup != other.warmup
            || self.decay_rate != other.decay_rate
        {
            return Err(CovarianceError::UnsupportedOperation(
                "running means with different shapes or rates cannot be merged".into(),
            ));
        }
        let total = self.sample_count + other.sample_count;
        if total > self.warmup {
            return Err(CovarianceError::UnsupportedOperation(format!(
                "merged count {total} would pass the warm-up of {}",
                self.warmup
            )));
        }
        let mut merged = self.clone();
        if total > 0 {
            let share = other.sample_count as f64 / total as f64;
            let delta = &other.mean - &self.mean;
            merged.mean.axpy(share, &delta, 1.0);
        }
        merged.sample_count = total;
        Ok(merged)
    }
}
