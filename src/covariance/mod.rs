//! One-pass mean/covariance estimators.

mod correlation;
mod ema;
mod empirical;
mod error;
pub mod experimental;
mod scatter;
mod switching_mean;
mod tracker;

pub use correlation::covariance_to_correlation;
pub use ema::EmaEstimator;
pub use empirical::EmpiricalEstimator;
pub use error::CovarianceError;
pub(crate) use error::check_dimension;
pub use scatter::ScatterCore;
pub use switching_mean::SwitchingMean;
pub use tracker::{CovarianceTracker, EstimatorSnapshot, TrackerKind};
