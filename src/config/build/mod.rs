mod error;
mod estimators;

pub use error::BuildError;
pub use estimators::{build_tracker, build_tracker_from_json};
