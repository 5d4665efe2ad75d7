//! Declarative estimator configuration: tagged JSON choices, their schema,
//! and the builders that turn them into trackers.

pub mod build;
pub mod choices;

pub use build::{BuildError, build_tracker};
pub use choices::{Choice, EstimatorChoice, EstimatorKind};
