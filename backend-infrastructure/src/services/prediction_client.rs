// HTTP client for the external anomaly scoring service
// Fail-open by design: retries transient failures with exponential
// backoff, treats 404 as a definitive "no result", and collapses every
// other outcome into None so callers never block on the scorer.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tokio::time::sleep;
use tracing::{debug, warn};

use backend_domain::ports::Predictor;
use backend_domain::{LogFeatures, LogRecord, PredictionRequest, PredictionResponse, RuntimeConfig};

const RETRY_BASE_DELAY_MS: u64 = 100;
const HEALTH_STATUS_MARKER: &str = "\"status\":\"UP\"";

pub struct MlPredictor {
    client: Client,
    base_url: String,
    max_retry_attempts: u32,
    health_timeout: Duration,
}

impl MlPredictor {
    pub fn new(config: &RuntimeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.ml_timeout_ms))
            .build()
            .context("failed to build prediction client")?;
        Ok(Self {
            client,
            base_url: config.ml_url.trim_end_matches('/').to_string(),
            max_retry_attempts: config.ml_retry_max_attempts,
            health_timeout: Duration::from_millis(config.ml_health_timeout_ms),
        })
    }

    /// One wire round trip. `Ok(None)` is the definitive "service has no
    /// opinion" outcome that must not be retried.
    async fn attempt_predict(
        &self,
        url: &str,
        request: &PredictionRequest,
    ) -> Result<Option<PredictionResponse>> {
        let response = self.client.post(url).json(request).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = response.error_for_status()?;
        Ok(Some(response.json::<PredictionResponse>().await?))
    }
}

#[async_trait]
impl Predictor for MlPredictor {
    async fn predict(&self, log_id: &str, record: &LogRecord) -> Option<PredictionResponse> {
        let request = PredictionRequest {
            log_id: log_id.to_string(),
            features: extract_features(record),
        };
        let url = format!("{}/api/v1/predict", self.base_url);

        let mut delay = Duration::from_millis(RETRY_BASE_DELAY_MS);
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.attempt_predict(&url, &request).await {
                Ok(Some(prediction)) => {
                    debug!(
                        "prediction for log {}: is_anomaly={}, score={:.3}",
                        log_id, prediction.is_anomaly, prediction.anomaly_score
                    );
                    return Some(prediction);
                }
                Ok(None) => {
                    debug!("prediction service has no result for log {}", log_id);
                    return None;
                }
                Err(err) => {
                    if attempt > self.max_retry_attempts {
                        warn!(
                            "prediction failed for log {} after {} attempts: {}",
                            log_id, attempt, err
                        );
                        return None;
                    }
                    debug!("prediction attempt {} for log {} failed: {}", attempt, log_id, err);
                    sleep(delay).await;
                    delay = delay.saturating_mul(2);
                }
            }
        }
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/v1/health", self.base_url);
        let response = match self.client.get(&url).timeout(self.health_timeout).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!("ml health probe failed: {}", err);
                return false;
            }
        };
        if !response.status().is_success() {
            return false;
        }
        match response.text().await {
            Ok(body) => body.contains(HEALTH_STATUS_MARKER),
            Err(_) => false,
        }
    }
}

/// Build the feature vector the model was trained on. Missing level and
/// service collapse to the "INFO"/"unknown" training defaults.
fn extract_features(record: &LogRecord) -> LogFeatures {
    let message = record.message.as_deref().unwrap_or("");
    let lowercase = message.to_lowercase();

    LogFeatures {
        message_length: record.message_chars(),
        level: record
            .level
            .as_deref()
            .map(str::to_uppercase)
            .unwrap_or_else(|| "INFO".to_string()),
        service: record
            .service
            .clone()
            .unwrap_or_else(|| "unknown".to_string()),
        has_exception: lowercase.contains("exception") || lowercase.contains("error"),
        has_timeout: lowercase.contains("timeout") || lowercase.contains("timed out"),
        has_connection_error: lowercase.contains("connection")
            && (lowercase.contains("refused")
                || lowercase.contains("failed")
                || lowercase.contains("reset")),
    }
}
