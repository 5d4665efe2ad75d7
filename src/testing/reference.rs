use crate::streams::ObservationStream;
use nalgebra::{DMatrix, DVector};

/// Pulls up to `n` observations from `stream`.
pub fn draw_rows<S: ObservationStream + ?Sized>(stream: &mut S, n: usize) -> Vec<Vec<f64>> {
    std::iter::from_fn(|| stream.next_observation())
        .take(n)
        .collect()
}

/// Two-pass column means.
pub fn population_mean(rows: &[Vec<f64>]) -> DVector<f64> {
    let d = rows.first().map_or(0, Vec::len);
    let n = rows.len() as f64;
    DVector::from_fn(d, |j, _| rows.iter().map(|r| r[j]).sum::<f64>() / n)
}

/// Two-pass population covariance (divides by `n`).
pub fn population_covariance(rows: &[Vec<f64>]) -> DMatrix<f64> {
    let mean = population_mean(rows);
    let d = mean.len();
    let n = rows.len() as f64;
    DMatrix::from_fn(d, d, |i, j| {
        rows.iter()
            .map(|r| (r[i] - mean[i]) * (r[j] - mean[j]))
            .sum::<f64>()
            / n
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closed_form_on_small_set() {
        let rows = vec![vec![1.0, 1.0], vec![3.0, 3.0], vec![5.0, 5.0]];
        assert_eq!(population_mean(&rows).as_slice(), &[3.0, 3.0]);
        let cov = population_covariance(&rows);
        assert!((cov[(0, 1)] - 8.0 / 3.0).abs() < 1e-12);
    }
}
