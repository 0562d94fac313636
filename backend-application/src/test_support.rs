// Mock ports and state builders shared by the use-case tests.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::mock;
use time::OffsetDateTime;
use tokio::sync::Semaphore;

use backend_domain::ports::{AlertSink, AnomalyStore, LogIndex, Predictor};
use backend_domain::{
    AnomalyAlert,
    AnomalyRecord,
    LogRecord,
    LogVolumePoint,
    PredictionResponse,
    RuntimeConfig,
    SearchRequest,
    SearchResponse,
    TermBucket,
};

use crate::{AppState, Metrics};

// mockall cannot express the for-all lifetime that `#[async_trait]` puts on
// `count_logs`'s `Option<&str>` argument, so the trait is implemented by hand
// over sync inherent mocks. The `expect_*` API is identical.
mock! {
    pub LogIndexPort {
        pub fn ensure_index(&self) -> anyhow::Result<()>;
        pub fn index_log(&self, record: &LogRecord) -> anyhow::Result<String>;
        pub fn search_logs(&self, request: &SearchRequest) -> anyhow::Result<SearchResponse>;
        pub fn count_logs<'a>(&self, level: Option<&'a str>) -> anyhow::Result<u64>;
        pub fn volume_histogram(
            &self,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> anyhow::Result<Vec<LogVolumePoint>>;
        pub fn level_terms(&self) -> anyhow::Result<(u64, Vec<TermBucket>)>;
        pub fn service_terms(&self, limit: u32) -> anyhow::Result<Vec<TermBucket>>;
        pub fn ping(&self) -> anyhow::Result<()>;
    }
}

#[async_trait]
impl LogIndex for MockLogIndexPort {
    async fn ensure_index(&self) -> anyhow::Result<()> {
        MockLogIndexPort::ensure_index(self)
    }
    async fn index_log(&self, record: &LogRecord) -> anyhow::Result<String> {
        MockLogIndexPort::index_log(self, record)
    }
    async fn search_logs(&self, request: &SearchRequest) -> anyhow::Result<SearchResponse> {
        MockLogIndexPort::search_logs(self, request)
    }
    async fn count_logs(&self, level: Option<&str>) -> anyhow::Result<u64> {
        MockLogIndexPort::count_logs(self, level)
    }
    async fn volume_histogram(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<Vec<LogVolumePoint>> {
        MockLogIndexPort::volume_histogram(self, start, end)
    }
    async fn level_terms(&self) -> anyhow::Result<(u64, Vec<TermBucket>)> {
        MockLogIndexPort::level_terms(self)
    }
    async fn service_terms(&self, limit: u32) -> anyhow::Result<Vec<TermBucket>> {
        MockLogIndexPort::service_terms(self, limit)
    }
    async fn ping(&self) -> anyhow::Result<()> {
        MockLogIndexPort::ping(self)
    }
}

mock! {
    pub AnomalyStorePort {}

    #[async_trait]
    impl AnomalyStore for AnomalyStorePort {
        async fn ensure_schema(&self) -> anyhow::Result<()>;
        async fn insert(&self, record: &AnomalyRecord) -> anyhow::Result<()>;
        async fn find_by_log_id(&self, log_id: &str) -> anyhow::Result<Option<AnomalyRecord>>;
        async fn fetch_since(&self, cutoff: OffsetDateTime) -> anyhow::Result<Vec<AnomalyRecord>>;
        async fn fetch_high_confidence(&self, threshold: f64) -> anyhow::Result<Vec<AnomalyRecord>>;
    }
}

mock! {
    pub PredictorPort {}

    #[async_trait]
    impl Predictor for PredictorPort {
        async fn predict(&self, log_id: &str, record: &LogRecord) -> Option<PredictionResponse>;
        async fn is_available(&self) -> bool;
    }
}

mock! {
    pub AlertSinkPort {}

    impl AlertSink for AlertSinkPort {
        fn notify_high_confidence(&self, alert: AnomalyAlert);
    }
}

pub fn test_config() -> RuntimeConfig {
    RuntimeConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        api_token: None,
        queue_url: None,
        queue_name: "logs.raw".to_string(),
        queue_token: None,
        ml_url: "http://127.0.0.1:8000".to_string(),
        ml_timeout_ms: 5_000,
        ml_retry_max_attempts: 3,
        ml_health_timeout_ms: 2_000,
        scoring_max_inflight: 4,
        alert_webhook_url: None,
        alert_webhook_template: None,
        alert_confidence_threshold: 0.7,
        max_body_bytes: 1_048_576,
        request_timeout_seconds: 5,
    }
}

pub fn app_state(
    log_index: Arc<dyn LogIndex>,
    anomaly_store: Arc<dyn AnomalyStore>,
    predictor: Arc<dyn Predictor>,
    alert_sink: Arc<dyn AlertSink>,
) -> AppState {
    let config = test_config();
    AppState {
        scoring_permits: Arc::new(Semaphore::new(config.scoring_max_inflight)),
        config,
        log_index,
        anomaly_store,
        predictor,
        alert_sink,
        metrics: Arc::new(Metrics::default()),
    }
}
