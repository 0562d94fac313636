// Prediction wire types
// Request/response DTOs exchanged with the external scoring service

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub log_id: String,
    pub features: LogFeatures,
}

/// Flattened feature vector extracted from a log record. The scoring
/// service owns the model, we only ship it what it was trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFeatures {
    pub message_length: usize,
    pub level: String,
    pub service: String,
    pub has_exception: bool,
    pub has_timeout: bool,
    pub has_connection_error: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    pub log_id: String,
    pub is_anomaly: bool,
    pub anomaly_score: f64,
    pub confidence: f64,
    #[serde(default)]
    pub model_version: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}
