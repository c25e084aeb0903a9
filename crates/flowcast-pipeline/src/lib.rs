//! flowcast-pipeline — turns a raw request body into a vehicle-count forecast.
//!
//! ```text
//! body ─▶ availability ─▶ presence ─▶ length ─▶ coerce ─▶ shape
//!      ─▶ scaler.forward ─▶ reshape [1, 12, 3] ─▶ model.infer
//!      ─▶ scaler.inverse (slot 2 placeholder) ─▶ round
//! ```
//!
//! The pipeline is built once at startup and shared read-only. If the
//! artifacts fail to load it is built in the unavailable state and stays
//! there for the life of the process.

pub mod error;
pub mod payload;
pub mod pipeline;

pub use error::{PredictError, PredictResult, ProcessingError, ValidationError};
pub use pipeline::{Availability, PredictionPipeline};
