use crate::covariance::correlation::covariance_to_correlation;
use crate::covariance::error::CovarianceError;
use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use strum_macros::{Display as StrumDisplay, IntoStaticStr};

/// Which estimator produced a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, StrumDisplay, IntoStaticStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum TrackerKind {
    Empirical,
    Ema,
    PartialMoment,
}

/// Uniform read/update surface over every estimator kind.
///
/// Consumers (portfolio construction, reporting) only ever read through
/// [`mean`], [`covariance`] and [`sample_count`]; none of them mutate a
/// tracker except through [`observe`].
pub trait CovarianceTracker {
    fn kind(&self) -> TrackerKind;

    fn dimension(&self) -> usize;

    /// Observations folded in so far.
    fn sample_count(&self) -> usize;

    /// Folds one observation in. On error the tracker is left unchanged.
    fn observe(&mut self, x: &[f64]) -> Result<(), CovarianceError>;

    fn mean(&self) -> &DVector<f64>;

    /// Current covariance estimate, or [`CovarianceError::InsufficientData`]
    /// while too few observations have been seen.
    fn covariance(&self) -> Result<DMatrix<f64>, CovarianceError>;

    fn correlation(&self) -> Result<DMatrix<f64>, CovarianceError> {
        covariance_to_correlation(&self.covariance()?)
    }

    fn snapshot(&self) -> EstimatorSnapshot;
}

/// Plain-data view of an estimator's state.
///
/// `covariance` is absent, not zero, while the estimator cannot yet report
/// one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorSnapshot {
    pub kind: TrackerKind,
    pub dimension: usize,
    pub sample_count: usize,
    pub mean: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub covariance: Option<Vec<Vec<f64>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decay_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bootstrap_count: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<Vec<f64>>,
}

impl EstimatorSnapshot {
    /// Snapshot with the fields every estimator shares.
    pub(crate) fn base(
        kind: TrackerKind,
        sample_count: usize,
        mean: &DVector<f64>,
        covariance: Option<DMatrix<f64>>,
    ) -> Self {
        Self {
            kind,
            dimension: mean.len(),
            sample_count,
            mean: mean.iter().copied().collect(),
            covariance: covariance.map(|m| rows_of(&m)),
            decay_rate: None,
            bootstrap_count: None,
            target: None,
        }
    }

    /// Covariance back as a matrix, if present.
    pub fn covariance_matrix(&self) -> Option<DMatrix<f64>> {
        let rows = self.covariance.as_ref()?;
        let n = rows.len();
        if rows.iter().any(|r| r.len() != n) {
            return None;
        }
        Some(DMatrix::from_fn(n, n, |i, j| rows[i][j]))
    }
}

fn rows_of(m: &DMatrix<f64>) -> Vec<Vec<f64>> {
    m.row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}

impl Display for EstimatorSnapshot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "kind={}, dim={}, n={}, covariance={}",
            self.kind,
            self.dimension,
            self.sample_count,
            if self.covariance.is_some() { "ready" } else { "pending" }
        )?;
        if let Some(r) = self.decay_rate {
            write!(f, ", r={r:.6}")?;
        }
        if let Some(b) = self.bootstrap_count {
            write!(f, ", bootstrap={b}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snap() -> EstimatorSnapshot {
        let mean = DVector::from_vec(vec![1.0, 2.0]);
        let cov = DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.5, 2.0]);
        EstimatorSnapshot::base(TrackerKind::Empirical, 4, &mean, Some(cov))
    }

    #[test]
    fn serializes_to_documented_shape() {
        let v = serde_json::to_value(snap()).unwrap();
        assert_eq!(
            v,
            json!({
                "kind": "empirical",
                "dimension": 2,
                "sample_count": 4,
                "mean": [1.0, 2.0],
                "covariance": [[1.0, 0.5], [0.5, 2.0]]
            })
        );
    }

    #[test]
    fn optional_fields_round_trip() {
        let mut s = snap();
        s.kind = TrackerKind::Ema;
        s.covariance = None;
        s.decay_rate = Some(0.25);
        s.bootstrap_count = Some(4);
        let text = serde_json::to_string(&s).unwrap();
        assert!(!text.contains("covariance"));
        assert!(text.contains("\"kind\":\"ema\""));
        let back: EstimatorSnapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn covariance_matrix_rebuilds_rows() {
        let m = snap().covariance_matrix().unwrap();
        assert_eq!(m[(0, 1)], 0.5);
        assert_eq!(m[(1, 1)], 2.0);
    }

    #[test]
    fn display_is_one_line() {
        let s = snap().to_string();
        assert_eq!(s, "kind=empirical, dim=2, n=4, covariance=ready");
    }
}
