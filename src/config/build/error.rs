use crate::covariance::CovarianceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Covariance(#[from] CovarianceError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
