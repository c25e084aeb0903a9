//! REST API handlers.

use std::error::Error as _;
use std::time::Instant;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{debug, error};

use flowcast_metrics::{Outcome, render_prometheus};
use flowcast_pipeline::{
    Availability, PredictError, PredictResult, ProcessingError, ValidationError,
};

use crate::ApiState;

#[derive(Debug, Serialize)]
pub struct PredictionResponse {
    pub predicted_vehicle_count: i64,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(err: &PredictError) -> Response {
    let status = match err {
        PredictError::Validation(_) => StatusCode::BAD_REQUEST,
        PredictError::Unavailable | PredictError::Processing(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (
        status,
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
        .into_response()
}

fn outcome(result: &PredictResult<i64>) -> Outcome {
    match result {
        Ok(_) => Outcome::Ok,
        Err(PredictError::Validation(_)) => Outcome::Validation,
        Err(PredictError::Processing(_)) => Outcome::Processing,
        Err(PredictError::Unavailable) => Outcome::Unavailable,
    }
}

// ── Prediction ─────────────────────────────────────────────────

/// POST /api/predict
pub async fn predict(State(state): State<ApiState>, body: Bytes) -> Response {
    let started = Instant::now();
    let result = evaluate(&state, &body).await;
    state.metrics.record(outcome(&result), started.elapsed());

    match result {
        Ok(count) => (
            StatusCode::OK,
            Json(PredictionResponse {
                predicted_vehicle_count: count,
            }),
        )
            .into_response(),
        Err(e) => {
            match &e {
                PredictError::Processing(cause) => {
                    error!(error = %cause, source = ?cause.source(), "prediction failed");
                }
                other => debug!(error = %other, "prediction rejected"),
            }
            error_response(&e)
        }
    }
}

async fn evaluate(state: &ApiState, body: &[u8]) -> PredictResult<i64> {
    if !state.pipeline.is_available() {
        return Err(PredictError::Unavailable);
    }

    let payload: serde_json::Value =
        serde_json::from_slice(body).map_err(|_| ValidationError::NotAnObject)?;

    let pipeline = state.pipeline.clone();
    let task = tokio::task::spawn_blocking(move || pipeline.predict(&payload));

    match tokio::time::timeout(state.timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join)) => Err(ProcessingError::Task(join.to_string()).into()),
        Err(_) => Err(ProcessingError::Timeout(state.timeout).into()),
    }
}

// ── Health ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct HealthBody<'a> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

/// GET /healthz
pub async fn healthz(State(state): State<ApiState>) -> Response {
    match state.pipeline.availability() {
        Availability::Ready { .. } => (
            StatusCode::OK,
            Json(HealthBody {
                status: "ok",
                reason: None,
            }),
        )
            .into_response(),
        Availability::Unavailable { reason } => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthBody {
                status: "unavailable",
                reason: Some(reason.as_str()),
            }),
        )
            .into_response(),
    }
}

// ── Prometheus ─────────────────────────────────────────────────

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let body = render_prometheus(&state.metrics.snapshot(), state.pipeline.is_available());
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
