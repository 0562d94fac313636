// Runtime configuration handed from the config loader to the running services

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub queue_url: Option<String>,
    pub queue_name: String,
    pub queue_token: Option<String>,
    pub ml_url: String,
    pub ml_timeout_ms: u64,
    pub ml_retry_max_attempts: u32,
    pub ml_health_timeout_ms: u64,
    pub scoring_max_inflight: usize,
    pub alert_webhook_url: Option<String>,
    pub alert_webhook_template: Option<String>,
    pub alert_confidence_threshold: f64,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
}

/// Connection settings for the two stores, consumed once at startup.
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub elastic_url: String,
    pub elastic_index: String,
    pub elastic_shards: u32,
    pub elastic_replicas: u32,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
}
