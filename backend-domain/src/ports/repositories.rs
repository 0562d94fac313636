use async_trait::async_trait;
use chrono::{DateTime, Utc};
use time::OffsetDateTime;

use crate::entities::{
    AnomalyRecord,
    LogRecord,
    LogVolumePoint,
    SearchRequest,
    SearchResponse,
    TermBucket,
};

/// Document index holding the searchable log corpus.
#[async_trait]
pub trait LogIndex: Send + Sync {
    async fn ensure_index(&self) -> anyhow::Result<()>;
    /// Index one record and return the engine-assigned document id.
    async fn index_log(&self, record: &LogRecord) -> anyhow::Result<String>;
    async fn search_logs(&self, request: &SearchRequest) -> anyhow::Result<SearchResponse>;
    /// Count documents, optionally restricted to a single level.
    async fn count_logs(&self, level: Option<&str>) -> anyhow::Result<u64>;
    async fn volume_histogram(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<LogVolumePoint>>;
    /// Level breakdown together with the matching document total.
    async fn level_terms(&self) -> anyhow::Result<(u64, Vec<TermBucket>)>;
    async fn service_terms(&self, limit: u32) -> anyhow::Result<Vec<TermBucket>>;
    async fn ping(&self) -> anyhow::Result<()>;
}

/// Columnar store for scoring outcomes.
#[async_trait]
pub trait AnomalyStore: Send + Sync {
    async fn ensure_schema(&self) -> anyhow::Result<()>;
    async fn insert(&self, record: &AnomalyRecord) -> anyhow::Result<()>;
    /// Most recent result for a document id, if any.
    async fn find_by_log_id(&self, log_id: &str) -> anyhow::Result<Option<AnomalyRecord>>;
    /// Confirmed anomalies recorded after the cutoff, newest first.
    async fn fetch_since(&self, cutoff: OffsetDateTime) -> anyhow::Result<Vec<AnomalyRecord>>;
    /// Anomalies strictly above the confidence threshold, most confident first.
    async fn fetch_high_confidence(&self, threshold: f64) -> anyhow::Result<Vec<AnomalyRecord>>;
}
