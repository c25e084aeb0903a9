//! Error taxonomy of the prediction pipeline.
//!
//! [`PredictError`]'s `Display` is exactly what a client is shown; the
//! internal cause of a processing failure is only reachable through
//! [`std::error::Error::source`] so it can be logged without being exposed.

use std::time::Duration;

use thiserror::Error;

use flow_core::{LOOK_BACK, N_FEATURES};
use flowcast_model::ModelError;

pub type PredictResult<T> = Result<T, PredictError>;

#[derive(Debug, Error)]
pub enum PredictError {
    /// Model or scaler failed to load at startup.
    #[error("Model or scaler is not available.")]
    Unavailable,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Failed to process prediction request.")]
    Processing(#[source] ProcessingError),
}

impl From<ProcessingError> for PredictError {
    fn from(e: ProcessingError) -> Self {
        PredictError::Processing(e)
    }
}

/// Caller mistakes with a field-specific message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Missing \"sequence\" in request body")]
    MissingSequence,

    #[error("Input sequence must have exactly {expected} timesteps", expected = LOOK_BACK)]
    Length { found: usize },

    #[error("Each timestep must have {expected} features", expected = N_FEATURES)]
    Width { row: usize, found: usize },
}

/// Internal failures, collapsed into one generic client message.
#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error("could not coerce sequence: {0}")]
    Coercion(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("denormalized prediction {0} is not a representable count")]
    Unrepresentable(f64),

    #[error("inference exceeded {0:?}")]
    Timeout(Duration),

    #[error("inference task failed: {0}")]
    Task(String),
}
