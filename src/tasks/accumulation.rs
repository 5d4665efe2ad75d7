use crate::covariance::{CovarianceError, CovarianceTracker, EmpiricalEstimator};
use crate::streams::ObservationStream;
use std::thread;
use tracing::debug;

/// Drains `stream` into `tracker`, stopping after `max_observations` when
/// given. Returns the number of observations folded in.
///
/// The first rejected observation aborts the run; everything folded before
/// it stays in the tracker.
pub fn accumulate(
    stream: &mut dyn ObservationStream,
    tracker: &mut dyn CovarianceTracker,
    max_observations: Option<usize>,
) -> Result<usize, CovarianceError> {
    if stream.dimension() != tracker.dimension() {
        return Err(CovarianceError::DimensionMismatch {
            expected: tracker.dimension(),
            actual: stream.dimension(),
        });
    }

    let mut processed = 0usize;
    while stream.has_more_observations() {
        if max_observations.is_some_and(|n| processed >= n) {
            break;
        }
        let Some(x) = stream.next_observation() else {
            break;
        };
        tracker.observe(&x)?;
        processed += 1;
    }

    debug!(
        processed,
        kind = %tracker.kind(),
        sample_count = tracker.sample_count(),
        "stream accumulated"
    );
    Ok(processed)
}

/// Splits `rows` into up to `shards` contiguous pieces, accumulates each on
/// its own thread and merges the partial estimators in order.
pub fn accumulate_sharded(
    dimension: usize,
    rows: &[Vec<f64>],
    shards: usize,
) -> Result<EmpiricalEstimator, CovarianceError> {
    let empty = EmpiricalEstimator::new(dimension)?;
    if rows.is_empty() {
        return Ok(empty);
    }
    let shards = shards.clamp(1, rows.len());
    let chunk = rows.len().div_ceil(shards);

    let partials: Vec<Result<EmpiricalEstimator, CovarianceError>> = thread::scope(|scope| {
        let handles: Vec<_> = rows
            .chunks(chunk)
            .map(|part| {
                scope.spawn(move || {
                    EmpiricalEstimator::from_rows(dimension, part.iter().map(Vec::as_slice))
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    });

    debug!(shards = partials.len(), rows = rows.len(), "merging shard estimators");

    partials
        .into_iter()
        .try_fold(empty, |acc, part| acc.merge(&part?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::covariance::{EmaEstimator, ScatterCore};
    use crate::streams::generators::CorrelatedGenerator;
    use crate::testing::draw_rows;
    use crate::testing::stubs::VecStream;
    use approx::assert_relative_eq;

    fn rows(n: usize) -> Vec<Vec<f64>> {
        let mut generator =
            CorrelatedGenerator::new(vec![1.0, 2.0, 3.0], &[[1.0, 0.2, 0.1], [0.0, 1.0, 0.4], [0.0, 0.0, 1.0]], vec![1.0, 0.5, 2.0], None, 8)
                .unwrap();
        draw_rows(&mut generator, n)
    }

    #[test]
    fn accumulate_drains_finite_stream() {
        let data = rows(25);
        let mut stream = VecStream::new(data.clone());
        let mut est = EmpiricalEstimator::new(3).unwrap();
        assert_eq!(accumulate(&mut stream, &mut est, None).unwrap(), 25);
        assert_eq!(est.sample_count(), 25);
        assert!(!stream.has_more_observations());
    }

    #[test]
    fn accumulate_honours_limit() {
        let mut generator =
            CorrelatedGenerator::new(vec![0.0, 0.0], &[[1.0, 0.0], [0.0, 1.0]], vec![1.0, 1.0], None, 1).unwrap();
        let mut ema = EmaEstimator::new(2, 0.1, None).unwrap();
        assert_eq!(accumulate(&mut generator, &mut ema, Some(40)).unwrap(), 40);
        assert_eq!(ema.sample_count(), 40);
    }

    #[test]
    fn accumulate_rejects_mismatched_stream() {
        let mut stream = VecStream::new(vec![vec![1.0, 2.0]]);
        let mut est = EmpiricalEstimator::new(3).unwrap();
        assert_eq!(
            accumulate(&mut stream, &mut est, None),
            Err(CovarianceError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        );
        assert_eq!(est.sample_count(), 0);
    }

    #[test]
    fn accumulate_stops_at_ragged_row() {
        let mut stream = VecStream::new(vec![vec![1.0, 2.0], vec![2.0, 2.0], vec![3.0]]);
        let mut est = EmpiricalEstimator::new(2).unwrap();
        assert!(accumulate(&mut stream, &mut est, None).is_err());
        assert_eq!(est.sample_count(), 2);
    }

    #[test]
    fn sharded_matches_sequential() {
        let data = rows(1001);
        let sequential = EmpiricalEstimator::from_rows(3, data.iter().map(Vec::as_slice)).unwrap();
        for shards in [1, 2, 7, 64] {
            let sharded = accumulate_sharded(3, &data, shards).unwrap();
            assert_eq!(sharded.sample_count(), 1001);
            assert_relative_eq!(*sharded.mean(), *sequential.mean(), max_relative = 1e-10);
            assert_relative_eq!(
                sharded.covariance().unwrap(),
                sequential.covariance().unwrap(),
                max_relative = 1e-9,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn sharded_empty_input_is_empty_estimator() {
        let est = accumulate_sharded(2, &[], 4).unwrap();
        assert_eq!(est.sample_count(), 0);
        assert!(est.covariance().is_err());
    }

    #[test]
    fn sharded_propagates_row_errors() {
        let data = vec![vec![1.0, 2.0], vec![1.0], vec![0.0, 0.0]];
        assert!(matches!(
            accumulate_sharded(2, &data, 3),
            Err(CovarianceError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn scatter_of_sharded_result_is_consistent() {
        let data = rows(40);
        let est = accumulate_sharded(3, &data, 4).unwrap();
        let mut core = ScatterCore::new(3).unwrap();
        for r in &data {
            core.update(r, 1.0).unwrap();
        }
        assert_relative_eq!(*est.scatter(), *core.scatter(), max_relative = 1e-10, epsilon = 1e-12);
    }
}
