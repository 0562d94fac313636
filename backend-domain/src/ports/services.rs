use async_trait::async_trait;

use crate::entities::{AnomalyAlert, LogRecord, PredictionResponse};

/// Client for the external anomaly scoring service. Every failure mode is
/// absorbed into `None` so the ingestion pipeline never depends on it.
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, log_id: &str, record: &LogRecord) -> Option<PredictionResponse>;
    /// Lightweight availability probe for operational checks.
    async fn is_available(&self) -> bool;
}

/// Outbound channel for high-confidence anomaly notifications.
pub trait AlertSink: Send + Sync {
    /// Fire-and-forget, delivery failures are logged, never surfaced.
    fn notify_high_confidence(&self, alert: AnomalyAlert);
}
