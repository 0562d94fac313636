use std::env;
use std::path::Path;

use anyhow::{anyhow, Result};
use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use backend_domain::{DbConfig, RuntimeConfig};

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_token: Option<String>,
    pub elastic_url: String,
    pub elastic_index: String,
    pub elastic_shards: u32,
    pub elastic_replicas: u32,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
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

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            api_token: None,
            elastic_url: "http://127.0.0.1:9200".to_string(),
            elastic_index: "logs".to_string(),
            elastic_shards: 1,
            elastic_replicas: 0,
            clickhouse_url: "http://127.0.0.1:8123".to_string(),
            clickhouse_database: "logwarden".to_string(),
            clickhouse_user: None,
            clickhouse_password: None,
            queue_url: None,
            queue_name: "logs.raw".to_string(),
            queue_token: None,
            ml_url: "http://127.0.0.1:8000".to_string(),
            ml_timeout_ms: 5_000,
            ml_retry_max_attempts: 3,
            ml_health_timeout_ms: 2_000,
            scoring_max_inflight: 8,
            alert_webhook_url: None,
            alert_webhook_template: None,
            alert_confidence_threshold: 0.7,
            max_body_bytes: 8 * 1024 * 1024,
            request_timeout_seconds: 15,
        }
    }
}

impl AppConfig {
    pub async fn load() -> Result<Self> {
        let path = env::var("LOGWARDEN_CONFIG").unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        if !file_path.exists() {
            warn!("config.toml not found, using defaults");
            let mut config = AppConfig::default();
            config.apply_env_overrides();
            config.normalize();
            config.validate()?;
            return Ok(config);
        }
        let content = fs::read_to_string(file_path).await?;
        let mut config: AppConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn normalize(&mut self) {
        if let Some(api_token) = &self.api_token {
            if api_token.trim().is_empty() {
                self.api_token = None;
            }
        }
        if let Some(user) = &self.clickhouse_user {
            if user.trim().is_empty() {
                self.clickhouse_user = None;
            }
        }
        if let Some(password) = &self.clickhouse_password {
            if password.trim().is_empty() {
                self.clickhouse_password = None;
            }
        }
        if let Some(queue_url) = &self.queue_url {
            if queue_url.trim().is_empty() {
                self.queue_url = None;
            }
        }
        if let Some(queue_token) = &self.queue_token {
            if queue_token.trim().is_empty() {
                self.queue_token = None;
            }
        }
        if let Some(alert_url) = &self.alert_webhook_url {
            if alert_url.trim().is_empty() {
                self.alert_webhook_url = None;
            }
        }
        if let Some(template) = &self.alert_webhook_template {
            if template.trim().is_empty() {
                self.alert_webhook_template = None;
            }
        }
        self.elastic_url = self.elastic_url.trim_end_matches('/').to_string();
        self.ml_url = self.ml_url.trim_end_matches('/').to_string();
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| anyhow!("invalid bind_addr: {}", err))?;
        if self.elastic_url.trim().is_empty() {
            return Err(anyhow!("elastic_url must not be empty"));
        }
        if self.elastic_index.trim().is_empty() {
            return Err(anyhow!("elastic_index must not be empty"));
        }
        if self.clickhouse_url.trim().is_empty() {
            return Err(anyhow!("clickhouse_url must not be empty"));
        }
        if self.queue_name.trim().is_empty() {
            return Err(anyhow!("queue_name must not be empty"));
        }
        if self.ml_url.trim().is_empty() {
            return Err(anyhow!("ml_url must not be empty"));
        }
        if self.scoring_max_inflight == 0 {
            return Err(anyhow!("scoring_max_inflight must be greater than 0"));
        }
        if !(0.0..=1.0).contains(&self.alert_confidence_threshold) {
            return Err(anyhow!("alert_confidence_threshold must be within 0.0..=1.0"));
        }
        if self.max_body_bytes == 0 {
            return Err(anyhow!("max_body_bytes must be greater than 0"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_token: self.api_token.clone(),
            queue_url: self.queue_url.clone(),
            queue_name: self.queue_name.clone(),
            queue_token: self.queue_token.clone(),
            ml_url: self.ml_url.clone(),
            ml_timeout_ms: self.ml_timeout_ms,
            ml_retry_max_attempts: self.ml_retry_max_attempts,
            ml_health_timeout_ms: self.ml_health_timeout_ms,
            scoring_max_inflight: self.scoring_max_inflight,
            alert_webhook_url: self.alert_webhook_url.clone(),
            alert_webhook_template: self.alert_webhook_template.clone(),
            alert_confidence_threshold: self.alert_confidence_threshold,
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            elastic_url: self.elastic_url.clone(),
            elastic_index: self.elastic_index.clone(),
            elastic_shards: self.elastic_shards,
            elastic_replicas: self.elastic_replicas,
            clickhouse_url: self.clickhouse_url.clone(),
            clickhouse_database: self.clickhouse_database.clone(),
            clickhouse_user: self.clickhouse_user.clone(),
            clickhouse_password: self.clickhouse_password.clone(),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("LOGWARDEN_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Ok(value) = env::var("LOGWARDEN_API_TOKEN") {
            self.api_token = Some(value);
        }
        if let Ok(value) = env::var("LOGWARDEN_ELASTIC_URL") {
            self.elastic_url = value;
        }
        if let Ok(value) = env::var("LOGWARDEN_ELASTIC_INDEX") {
            self.elastic_index = value;
        }
        if let Ok(value) = env::var("LOGWARDEN_ELASTIC_SHARDS") {
            self.elastic_shards = value.parse().unwrap_or(self.elastic_shards);
        }
        if let Ok(value) = env::var("LOGWARDEN_ELASTIC_REPLICAS") {
            self.elastic_replicas = value.parse().unwrap_or(self.elastic_replicas);
        }
        if let Ok(value) = env::var("LOGWARDEN_CLICKHOUSE_URL") {
            self.clickhouse_url = value;
        }
        if let Ok(value) = env::var("LOGWARDEN_CLICKHOUSE_DATABASE") {
            self.clickhouse_database = value;
        }
        if let Ok(value) = env::var("LOGWARDEN_CLICKHOUSE_USER") {
            self.clickhouse_user = Some(value);
        }
        if let Ok(value) = env::var("LOGWARDEN_CLICKHOUSE_PASSWORD") {
            self.clickhouse_password = Some(value);
        }
        if let Ok(value) = env::var("LOGWARDEN_QUEUE_URL") {
            self.queue_url = Some(value);
        }
        if let Ok(value) = env::var("LOGWARDEN_QUEUE_NAME") {
            self.queue_name = value;
        }
        if let Ok(value) = env::var("LOGWARDEN_QUEUE_TOKEN") {
            self.queue_token = Some(value);
        }
        if let Ok(value) = env::var("LOGWARDEN_ML_URL") {
            self.ml_url = value;
        }
        if let Ok(value) = env::var("LOGWARDEN_ML_TIMEOUT_MS") {
            self.ml_timeout_ms = value.parse().unwrap_or(self.ml_timeout_ms);
        }
        if let Ok(value) = env::var("LOGWARDEN_ML_RETRY_MAX_ATTEMPTS") {
            self.ml_retry_max_attempts = value.parse().unwrap_or(self.ml_retry_max_attempts);
        }
        if let Ok(value) = env::var("LOGWARDEN_ML_HEALTH_TIMEOUT_MS") {
            self.ml_health_timeout_ms = value.parse().unwrap_or(self.ml_health_timeout_ms);
        }
        if let Ok(value) = env::var("LOGWARDEN_SCORING_MAX_INFLIGHT") {
            self.scoring_max_inflight = value.parse().unwrap_or(self.scoring_max_inflight);
        }
        if let Ok(value) = env::var("LOGWARDEN_ALERT_WEBHOOK_URL") {
            self.alert_webhook_url = Some(value);
        }
        if let Ok(value) = env::var("LOGWARDEN_ALERT_WEBHOOK_TEMPLATE") {
            self.alert_webhook_template = Some(value);
        }
        if let Ok(value) = env::var("LOGWARDEN_ALERT_CONFIDENCE_THRESHOLD") {
            self.alert_confidence_threshold =
                value.parse().unwrap_or(self.alert_confidence_threshold);
        }
        if let Ok(value) = env::var("LOGWARDEN_MAX_BODY_BYTES") {
            self.max_body_bytes = value.parse().unwrap_or(self.max_body_bytes);
        }
        if let Ok(value) = env::var("LOGWARDEN_REQUEST_TIMEOUT_SECONDS") {
            self.request_timeout_seconds = value.parse().unwrap_or(self.request_timeout_seconds);
        }
    }
}
