//! flowcast-metrics — observability for the prediction endpoint.
//!
//! ```text
//! PredictionMetrics
//!   ├── record() ← called once per prediction request
//!   └── snapshot() → MetricsSnapshot
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics endpoint
//! ```

pub mod collector;
pub mod prometheus;

pub use collector::{MetricsSnapshot, Outcome, PredictionMetrics};
pub use prometheus::render_prometheus;
