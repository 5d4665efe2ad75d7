//! Estimators whose output does not carry standard covariance semantics.
//!
//! Nothing here should feed a consumer that needs a proper covariance
//! matrix. Use [`EmpiricalEstimator`](crate::covariance::EmpiricalEstimator)
//! or [`EmaEstimator`](crate::covariance::EmaEstimator) for that.

mod partial_moments;
mod quadrant;

pub use partial_moments::PartialMomentEstimator;
pub use quadrant::Quadrant;
