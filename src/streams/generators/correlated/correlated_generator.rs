use crate::covariance::CovarianceError;
use crate::covariance::check_dimension;
use crate::streams::ObservationStream;
use nalgebra::{DMatrix, DVector};
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use rand::rngs::StdRng;
use std::io::Error;

/// Synthetic stream of correlated Gaussian observations.
///
/// Each row is `mean + (z · dependency) ∘ scale` for a vector `z` of
/// independent standard normals, so the population covariance is
/// `diag(scale) · dependencyᵀ · dependency · diag(scale)`.
#[derive(Debug)]
pub struct CorrelatedGenerator {
    seed: u64,
    rng: StdRng,
    mean: DVector<f64>,
    dependency: DMatrix<f64>,
    scale: DVector<f64>,
    max_observations: Option<usize>,
    produced: usize,
}

impl CorrelatedGenerator {
    pub fn new<R: AsRef<[f64]>>(
        mean: Vec<f64>,
        dependency: &[R],
        scale: Vec<f64>,
        max_observations: Option<usize>,
        seed: u64,
    ) -> Result<Self, CovarianceError> {
        let dimension = mean.len();
        if dimension < 1 {
            return Err(CovarianceError::InvalidDimension(dimension));
        }
        check_dimension(dimension, dependency.len())?;
        check_dimension(dimension, scale.len())?;
        for row in dependency {
            check_dimension(dimension, row.as_ref().len())?;
        }

        Ok(Self {
            seed,
            rng: StdRng::seed_from_u64(seed),
            mean: DVector::from_vec(mean),
            dependency: DMatrix::from_fn(dimension, dimension, |i, j| dependency[i].as_ref()[j]),
            scale: DVector::from_vec(scale),
            max_observations,
            produced: 0,
        })
    }

    /// Covariance of the distribution the rows are drawn from.
    pub fn implied_covariance(&self) -> DMatrix<f64> {
        let s = DMatrix::from_diagonal(&self.scale);
        &s * self.dependency.transpose() * &self.dependency * &s
    }

    #[inline]
    pub fn implied_mean(&self) -> &DVector<f64> {
        &self.mean
    }

    fn draw(&mut self) -> Vec<f64> {
        let n = self.mean.len();
        let z = DVector::from_fn(n, |_, _| self.rng.sample::<f64, _>(StandardNormal));
        let mixed = self.dependency.tr_mul(&z);
        mixed
            .iter()
            .zip(self.scale.iter())
            .zip(self.mean.iter())
            .map(|((m, s), mu)| mu + m * s)
            .collect()
    }
}

impl ObservationStream for CorrelatedGenerator {
    fn dimension(&self) -> usize {
        self.mean.len()
    }

    fn has_more_observations(&self) -> bool {
        self.max_observations.map_or(true, |max| self.produced < max)
    }

    fn next_observation(&mut self) -> Option<Vec<f64>> {
        if !self.has_more_observations() {
            return None;
        }
        let row = self.draw();
        self.produced += 1;
        Some(row)
    }

    fn restart(&mut self) -> Result<(), Error> {
        self.rng = StdRng::seed_from_u64(self.seed);
        self.produced = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::covariance::EmpiricalEstimator;
    use approx::assert_relative_eq;

    fn generator(max: Option<usize>, seed: u64) -> CorrelatedGenerator {
        CorrelatedGenerator::new(
            vec![2.2, 4.4, 1.5],
            &[[0.2, 0.5, 0.7], [0.3, 0.2, 0.2], [0.5, 0.3, 0.1]],
            vec![1.0, 5.0, 3.0],
            max,
            seed,
        )
        .unwrap()
    }

    #[test]
    fn rejects_inconsistent_shapes() {
        assert!(matches!(
            CorrelatedGenerator::new(vec![0.0, 0.0], &[[1.0, 0.0]], vec![1.0, 1.0], None, 1),
            Err(CovarianceError::DimensionMismatch { expected: 2, actual: 1 })
        ));
        assert!(matches!(
            CorrelatedGenerator::new(vec![0.0, 0.0], &[[1.0, 0.0], [0.0, 1.0]], vec![1.0], None, 1),
            Err(CovarianceError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            CorrelatedGenerator::new(Vec::new(), &[[0.0; 0]; 0], Vec::new(), None, 1),
            Err(CovarianceError::InvalidDimension(0))
        ));
    }

    #[test]
    fn respects_max_observations() {
        let mut g = generator(Some(3), 1);
        assert_eq!(g.dimension(), 3);
        for _ in 0..3 {
            assert_eq!(g.next_observation().map(|r| r.len()), Some(3));
        }
        assert!(!g.has_more_observations());
        assert!(g.next_observation().is_none());
    }

    #[test]
    fn restart_replays_same_rows() {
        let mut g = generator(Some(5), 99);
        let first: Vec<Vec<f64>> = std::iter::from_fn(|| g.next_observation()).collect();
        g.restart().unwrap();
        let second: Vec<Vec<f64>> = std::iter::from_fn(|| g.next_observation()).collect();
        assert_eq!(first.len(), 5);
        assert_eq!(first, second);
    }

    #[test]
    fn sample_moments_approach_implied_moments() {
        let mut g = generator(None, 2024);
        let mut est = EmpiricalEstimator::new(3).unwrap();
        for _ in 0..50_000 {
            let row = g.next_observation().unwrap();
            est.update(&row).unwrap();
        }
        let implied = g.implied_covariance();
        let cov = est.covariance().unwrap();
        for (got, want) in cov.iter().zip(implied.iter()) {
            assert!((got - want).abs() < 0.05 * implied.max() + 1e-3, "got={got}, want={want}");
        }
        assert_relative_eq!(*est.mean(), *g.implied_mean(), epsilon = 0.1);
    }
}
