//! Prometheus text exposition format.

use crate::collector::{MetricsSnapshot, Outcome};

/// Render a metrics snapshot into Prometheus text format.
///
/// `available` is exported as a 0/1 gauge so scrapers can alert on a
/// service that started without its model.
pub fn render_prometheus(snapshot: &MetricsSnapshot, available: bool) -> String {
    let mut out = String::new();

    out.push_str("# HELP flowcast_predictions_total Prediction requests by outcome.\n");
    out.push_str("# TYPE flowcast_predictions_total counter\n");
    for outcome in Outcome::ALL {
        out.push_str(&format!(
            "flowcast_predictions_total{{outcome=\"{}\"}} {}\n",
            outcome.label(),
            snapshot.count(outcome)
        ));
    }

    out.push_str("# HELP flowcast_prediction_latency_seconds_sum Cumulative request latency.\n");
    out.push_str("# TYPE flowcast_prediction_latency_seconds_sum counter\n");
    out.push_str(&format!(
        "flowcast_prediction_latency_seconds_sum {:.6}\n",
        snapshot.latency_us_total as f64 / 1_000_000.0
    ));

    out.push_str("# HELP flowcast_model_available Whether the model and scaler loaded.\n");
    out.push_str("# TYPE flowcast_model_available gauge\n");
    out.push_str(&format!("flowcast_model_available {}\n", u8::from(available)));

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_empty() {
        let output = render_prometheus(&MetricsSnapshot::default(), false);
        assert!(output.contains("# TYPE flowcast_predictions_total counter"));
        assert!(output.contains("flowcast_predictions_total{outcome=\"ok\"} 0"));
        assert!(output.contains("flowcast_model_available 0"));
    }

    #[test]
    fn render_counts_and_latency() {
        let snapshot = MetricsSnapshot {
            requests: [7, 2, 1, 0],
            latency_us_total: 1_500_000,
        };
        let output = render_prometheus(&snapshot, true);

        assert!(output.contains("flowcast_predictions_total{outcome=\"ok\"} 7"));
        assert!(output.contains("flowcast_predictions_total{outcome=\"validation\"} 2"));
        assert!(output.contains("flowcast_predictions_total{outcome=\"processing\"} 1"));
        assert!(output.contains("flowcast_predictions_total{outcome=\"unavailable\"} 0"));
        assert!(output.contains("flowcast_prediction_latency_seconds_sum 1.500000"));
        assert!(output.contains("flowcast_model_available 1"));
    }
}
