use crate::config::build::BuildError;
use crate::config::choices::{EmaParameters, EmpiricalParameters, EstimatorChoice, PartialMomentParameters};
use crate::covariance::experimental::PartialMomentEstimator;
use crate::covariance::{CovarianceTracker, EmaEstimator, EmpiricalEstimator};
use serde_json::Value;
use std::convert::TryFrom;

impl TryFrom<EmpiricalParameters> for EmpiricalEstimator {
    type Error = BuildError;

    fn try_from(parameters: EmpiricalParameters) -> Result<Self, Self::Error> {
        EmpiricalEstimator::new(parameters.dimension).map_err(BuildError::from)
    }
}

impl TryFrom<EmaParameters> for EmaEstimator {
    type Error = BuildError;

    fn try_from(parameters: EmaParameters) -> Result<Self, Self::Error> {
        EmaEstimator::new(
            parameters.dimension,
            parameters.decay_rate,
            parameters.bootstrap_count,
        )
        .map_err(BuildError::from)
    }
}

impl TryFrom<PartialMomentParameters> for PartialMomentEstimator {
    type Error = BuildError;

    fn try_from(parameters: PartialMomentParameters) -> Result<Self, Self::Error> {
        if let Some(t) = &parameters.target {
            if t.iter().any(|v| !v.is_finite()) {
                return Err(BuildError::InvalidParameter(
                    "target must contain only finite values".into(),
                ));
            }
        }
        PartialMomentEstimator::new(parameters.dimension, parameters.decay_rate, parameters.target)
            .map_err(BuildError::from)
    }
}

pub fn build_tracker(choice: EstimatorChoice) -> Result<Box<dyn CovarianceTracker>, BuildError> {
    match choice {
        EstimatorChoice::Empirical(p) => Ok(Box::new(EmpiricalEstimator::try_from(p)?)),
        EstimatorChoice::Ema(p) => Ok(Box::new(EmaEstimator::try_from(p)?)),
        EstimatorChoice::PartialMoment(p) => Ok(Box::new(PartialMomentEstimator::try_from(p)?)),
    }
}

/// Parses a `{"type": .., "params": {..}}` document and builds the tracker.
pub fn build_tracker_from_json(config: Value) -> Result<Box<dyn CovarianceTracker>, BuildError> {
    build_tracker(serde_json::from_value(config)?)
}
