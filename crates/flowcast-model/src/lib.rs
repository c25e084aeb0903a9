//! flowcast-model — the two numeric collaborators of the forecast pipeline.
//!
//! - [`Transform`]: a fitted per-feature affine scaler (min-max or standard).
//! - [`Predictor`]: a stacked-LSTM sequence-to-scalar network evaluated
//!   with `ndarray`.
//!
//! Both are loaded from JSON artifacts exported next to the trained model
//! (see [`artifact`]) and are immutable after construction, so a single
//! instance can be shared across request handlers.

pub mod artifact;
pub mod error;
pub mod lstm;
pub mod scaler;

pub use artifact::{load_model, load_scaler, LoadedArtifact};
pub use error::{ModelError, ModelResult};
pub use lstm::{LstmModel, Predictor};
pub use scaler::{AffineScaler, ScalerSpec, Transform};
