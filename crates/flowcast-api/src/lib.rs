//! flowcast-api — REST API for vehicle-count forecasts.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | POST | `/api/predict` | Forecast from a 12x3 window |
//! | GET | `/healthz` | Model/scaler availability |
//! | GET | `/metrics` | Prometheus exposition |

pub mod handlers;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::routing::{get, post};
use flowcast_metrics::PredictionMetrics;
use flowcast_pipeline::PredictionPipeline;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub pipeline: Arc<PredictionPipeline>,
    pub metrics: Arc<PredictionMetrics>,
    /// Upper bound on one pipeline evaluation.
    pub timeout: Duration,
}

impl ApiState {
    pub fn new(pipeline: PredictionPipeline, timeout: Duration) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            metrics: Arc::new(PredictionMetrics::new()),
            timeout,
        }
    }
}

/// Build the complete API router.
pub fn build_router(state: ApiState) -> Router {
    Router::new()
        .route("/api/predict", post(handlers::predict))
        .route("/api/predict/", post(handlers::predict))
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(handlers::prometheus_metrics))
        .with_state(state)
}
