//! Metrics collector — lock-free counters per request outcome.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tracing::trace;

/// How a prediction request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ok,
    Validation,
    Processing,
    Unavailable,
}

impl Outcome {
    pub const ALL: [Outcome; 4] = [
        Outcome::Ok,
        Outcome::Validation,
        Outcome::Processing,
        Outcome::Unavailable,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Ok => "ok",
            Outcome::Validation => "validation",
            Outcome::Processing => "processing",
            Outcome::Unavailable => "unavailable",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Requests per outcome, indexed like [`Outcome::ALL`].
    pub requests: [u64; 4],
    /// Sum of request latencies in microseconds.
    pub latency_us_total: u64,
}

impl MetricsSnapshot {
    pub fn count(&self, outcome: Outcome) -> u64 {
        self.requests[outcome.index()]
    }

    pub fn total(&self) -> u64 {
        self.requests.iter().sum()
    }
}

#[derive(Debug, Default)]
pub struct PredictionMetrics {
    requests: [AtomicU64; 4],
    latency_us_total: AtomicU64,
}

impl PredictionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, outcome: Outcome, latency: Duration) {
        self.requests[outcome.index()].fetch_add(1, Ordering::Relaxed);
        let us = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        self.latency_us_total.fetch_add(us, Ordering::Relaxed);
        trace!(outcome = outcome.label(), latency_us = us, "prediction recorded");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: std::array::from_fn(|i| self.requests[i].load(Ordering::Relaxed)),
            latency_us_total: self.latency_us_total.load(Ordering::Relaxed),
        }
    }
}
