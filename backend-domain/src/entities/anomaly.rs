// Anomaly entities
// Scoring results persisted to ClickHouse and alert payloads derived from them

use clickhouse::Row;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One scoring outcome for an indexed log record. Field order matches the
/// ClickHouse table definition, do not reorder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Row)]
pub struct AnomalyRecord {
    pub id: String,
    pub model_id: Option<i64>,
    pub log_id: String,
    pub anomaly_score: f64,
    pub is_anomaly: bool,
    pub confidence: f64,
    /// Feature snapshot serialized as JSON, kept for offline analysis.
    pub features: String,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    pub detected_at: OffsetDateTime,
    pub model_version: String,
}

/// Payload handed to the alert sink when a high-confidence anomaly fires.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyAlert {
    pub log_id: String,
    pub service: Option<String>,
    pub anomaly_score: f64,
    pub confidence: f64,
    pub model_version: String,
}
