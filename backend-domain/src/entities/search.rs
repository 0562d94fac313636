// Search and dashboard read models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::log_record::LogRecord;

/// Parameters for a paged log search against the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    /// Free-text query matched against the message field.
    pub query: Option<String>,
    pub levels: Vec<String>,
    pub services: Vec<String>,
    pub hosts: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub page: u32,
    pub size: u32,
    pub sort_by: String,
    pub sort_order: String,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            query: None,
            levels: Vec::new(),
            services: Vec::new(),
            hosts: Vec::new(),
            start_time: None,
            end_time: None,
            page: 0,
            size: 20,
            sort_by: "timestamp".to_string(),
            sort_order: "desc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub logs: Vec<LogRecord>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

impl SearchResponse {
    /// Empty result echoing the requested page window.
    pub fn empty(page: u32, size: u32) -> Self {
        Self {
            logs: Vec::new(),
            total: 0,
            page,
            size,
        }
    }
}

/// Headline numbers for the dashboard landing view. Defaults to all
/// zeroes, which doubles as the degraded response when the index is down.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_logs: u64,
    pub error_count: u64,
    pub warning_count: u64,
    pub active_alerts: u64,
    pub anomaly_count: u64,
    pub logs_per_minute: f64,
    pub error_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogVolumePoint {
    pub timestamp: DateTime<Utc>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDistributionEntry {
    pub level: String,
    pub count: u64,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCount {
    pub service: String,
    pub count: u64,
}

/// Normalized terms-aggregation bucket, shared by the level and
/// service breakdowns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermBucket {
    pub key: String,
    pub doc_count: u64,
}
