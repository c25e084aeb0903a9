//! The prediction pipeline and its availability state.

use std::sync::Arc;

use ndarray::{Array2, Array3};
use serde_json::Value;
use tracing::{debug, error, info};

use flow_core::config::ArtifactsConfig;
use flow_core::{InputSequence, LOOK_BACK, N_FEATURES, TARGET_SLOT};
use flowcast_model::{ModelError, Predictor, Transform, load_model, load_scaler};

use crate::error::{PredictError, PredictResult, ProcessingError};
use crate::payload::parse_sequence;

/// Whether the numeric components were constructed at startup.
#[derive(Clone)]
pub enum Availability {
    Ready {
        scaler: Arc<dyn Transform>,
        model: Arc<dyn Predictor>,
    },
    /// Loading failed; permanent for the life of the process.
    Unavailable { reason: String },
}

impl std::fmt::Debug for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::Ready { .. } => f.write_str("Ready"),
            Availability::Unavailable { reason } => {
                f.debug_struct("Unavailable").field("reason", reason).finish()
            }
        }
    }
}

/// Validate → scale → reshape → infer → inverse-scale → round.
///
/// Immutable after construction and safe to share across request handlers
/// behind an `Arc`; evaluation only borrows the scaler and model.
#[derive(Debug, Clone)]
pub struct PredictionPipeline {
    availability: Availability,
}

impl PredictionPipeline {
    pub fn new(scaler: Arc<dyn Transform>, model: Arc<dyn Predictor>) -> Self {
        Self {
            availability: Availability::Ready { scaler, model },
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            availability: Availability::Unavailable {
                reason: reason.into(),
            },
        }
    }

    /// Load both artifacts. A failure is logged once here and leaves the
    /// pipeline permanently unavailable instead of aborting startup.
    pub fn load(artifacts: &ArtifactsConfig) -> Self {
        let model_path = artifacts.model_path();
        let scaler_path = artifacts.scaler_path();

        let loaded = load_model(&model_path, artifacts.model_sha256.as_deref()).and_then(|model| {
            load_scaler(&scaler_path, artifacts.scaler_sha256.as_deref())
                .map(|scaler| (model, scaler))
        });

        match loaded {
            Ok((model, scaler)) => {
                info!(
                    model = %model_path.display(),
                    scaler = %scaler_path.display(),
                    "model and scaler loaded"
                );
                Self::new(Arc::new(scaler.value), Arc::new(model.value))
            }
            Err(e) => {
                error!(error = %e, "failed to load model or scaler, predictions disabled");
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn availability(&self) -> &Availability {
        &self.availability
    }

    pub fn is_available(&self) -> bool {
        matches!(self.availability, Availability::Ready { .. })
    }

    /// Run the full pipeline over a raw request body.
    pub fn predict(&self, body: &Value) -> PredictResult<i64> {
        let Availability::Ready { scaler, model } = &self.availability else {
            return Err(PredictError::Unavailable);
        };

        let window = parse_sequence(body)?;
        let count = run(scaler.as_ref(), model.as_ref(), &window)?;
        debug!(count, "prediction complete");
        Ok(count)
    }
}

fn run(
    scaler: &dyn Transform,
    model: &dyn Predictor,
    window: &InputSequence,
) -> Result<i64, ProcessingError> {
    let flat = window.to_flat();
    let flat_len = flat.len();
    let input = Array2::from_shape_vec((LOOK_BACK, N_FEATURES), flat)
        .map_err(|_| reshape_error(&[LOOK_BACK, N_FEATURES], &[flat_len]))?;
    let normalized = scaler.forward(&input)?;

    let normalized_shape = normalized.shape().to_vec();
    let tensor: Array3<f64> = normalized
        .into_shape_with_order((1, LOOK_BACK, N_FEATURES))
        .map_err(|_| reshape_error(&[1, LOOK_BACK, N_FEATURES], &normalized_shape))?;
    let scaled = model.infer(&tensor)?;

    let mut placeholder = Array2::<f64>::zeros((1, N_FEATURES));
    placeholder[[0, TARGET_SLOT]] = scaled;
    let denormalized = scaler.inverse(&placeholder)?[[0, TARGET_SLOT]];

    to_count(denormalized)
}

fn reshape_error(expected: &[usize], found: &[usize]) -> ProcessingError {
    ModelError::Shape {
        expected: expected.to_vec(),
        found: found.to_vec(),
    }
    .into()
}

/// Round half to even into an integer count.
fn to_count(value: f64) -> Result<i64, ProcessingError> {
    let rounded = value.round_ties_even();
    if !rounded.is_finite() || rounded < i64::MIN as f64 || rounded >= i64::MAX as f64 {
        return Err(ProcessingError::Unrepresentable(value));
    }
    Ok(rounded as i64)
}
