use crate::covariance::error::{CovarianceError, check_dimension, check_weight};
use nalgebra::{DMatrix, DVector};

/// Weighted one-pass accumulator of a mean vector and a scatter matrix
/// (sum of weighted outer products of deviations from the mean).
///
/// Updates use the Welford form `S += w · (x - m_old)(x - m_new)ᵀ`, which
/// avoids the cancellation of `E[xxᵀ] - E[x]E[x]ᵀ`. Two accumulators combine
/// with the parallel (Chan) formula, so `update` is the special case of
/// merging with a single-observation accumulator.
///
/// Weights must be finite and strictly positive.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterCore {
    total_weight: f64,
    mean: DVector<f64>,
    scatter: DMatrix<f64>,
}

impl ScatterCore {
    pub fn new(dimension: usize) -> Result<Self, CovarianceError> {
        if dimension < 1 {
            return Err(CovarianceError::InvalidDimension(dimension));
        }
        Ok(Self {
            total_weight: 0.0,
            mean: DVector::zeros(dimension),
            scatter: DMatrix::zeros(dimension, dimension),
        })
    }

    /// Accumulator holding exactly one observation.
    pub fn with_observation(x: &[f64], weight: f64) -> Result<Self, CovarianceError> {
        let mut core = Self::new(x.len())?;
        core.update(x, weight)?;
        Ok(core)
    }

    /// Rebuilds an accumulator from its summary statistics.
    pub(crate) fn from_parts(total_weight: f64, mean: DVector<f64>, scatter: DMatrix<f64>) -> Self {
        Self {
            total_weight,
            mean,
            scatter,
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.mean.len()
    }

    #[inline]
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    #[inline]
    pub fn mean(&self) -> &DVector<f64> {
        &self.mean
    }

    #[inline]
    pub fn scatter(&self) -> &DMatrix<f64> {
        &self.scatter
    }

    pub fn update(&mut self, x: &[f64], weight: f64) -> Result<(), CovarianceError> {
        check_dimension(self.dimension(), x.len())?;
        check_weight(weight)?;
        self.update_vector(&DVector::from_column_slice(x), weight);
        Ok(())
    }

    /// Same as [`update`](Self::update) for an already validated vector and weight.
    pub(crate) fn update_vector(&mut self, x: &DVector<f64>, weight: f64) {
        let new_weight = self.total_weight + weight;
        let delta = x - &self.mean;
        self.mean.axpy(weight / new_weight, &delta, 1.0);
        let delta_post = x - &self.mean;
        self.scatter.ger(weight, &delta, &delta_post, 1.0);
        self.total_weight = new_weight;
    }

    /// Combines two accumulators as if one had seen both inputs.
    pub fn merge(&self, other: &ScatterCore) -> Result<ScatterCore, CovarianceError> {
        if self.dimension() != other.dimension() {
            return Err(CovarianceError::UnsupportedOperation(format!(
                "cannot merge scatter of dimension {} with dimension {}",
                self.dimension(),
                other.dimension()
            )));
        }
        if other.total_weight == 0.0 {
            return Ok(self.clone());
        }
        if self.total_weight == 0.0 {
            return Ok(other.clone());
        }

        let total = self.total_weight + other.total_weight;
        let delta = &other.mean - &self.mean;
        let mean = &self.mean + &delta * (other.total_weight / total);
        let mut scatter = &self.scatter + &other.scatter;
        scatter.ger(
            self.total_weight * other.total_weight / total,
            &delta,
            &delta,
            1.0,
        );

        Ok(ScatterCore {
            total_weight: total,
            mean,
            scatter,
        })
    }
}
