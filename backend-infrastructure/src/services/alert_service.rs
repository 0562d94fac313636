// Webhook alert delivery
// Fire-and-forget: a spawned task posts the templated payload and the
// scoring pipeline never waits on the outcome.

use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tracing::warn;

use backend_domain::ports::AlertSink;
use backend_domain::{AnomalyAlert, RuntimeConfig};

const DEFAULT_TEMPLATE: &str = r#"{"message":"High-confidence anomaly on {service}: log {logId} scored {score} (confidence {confidence})"}"#;

pub struct WebhookAlertSink {
    webhook_url: Option<String>,
    template: Option<String>,
    timeout: Duration,
}

impl WebhookAlertSink {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            webhook_url: config.alert_webhook_url.clone(),
            template: config.alert_webhook_template.clone(),
            timeout: Duration::from_secs(config.request_timeout_seconds.max(3)),
        }
    }
}

impl AlertSink for WebhookAlertSink {
    fn notify_high_confidence(&self, alert: AnomalyAlert) {
        let Some(url) = self.webhook_url.clone() else {
            warn!(
                "high-confidence anomaly for log {} (service {}, score {:.3}, confidence {:.3}), no alert webhook configured",
                alert.log_id,
                alert.service.as_deref().unwrap_or("unknown"),
                alert.anomaly_score,
                alert.confidence,
            );
            return;
        };

        let payload = build_payload(&alert, self.template.as_deref().unwrap_or(DEFAULT_TEMPLATE));
        let timeout = self.timeout;
        tokio::spawn(async move {
            if let Err(err) = post_alert(&url, payload, timeout).await {
                warn!("alert webhook failed for log {}: {}", alert.log_id, err);
            }
        });
    }
}

async fn post_alert(url: &str, payload: String, timeout: Duration) -> Result<()> {
    let client = Client::builder().timeout(timeout).build()?;
    client
        .post(url)
        .header("Content-Type", "application/json")
        .body(payload)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

fn build_payload(alert: &AnomalyAlert, template: &str) -> String {
    template
        .replace("{logId}", &alert.log_id)
        .replace("{service}", alert.service.as_deref().unwrap_or("unknown"))
        .replace("{score}", &format!("{:.3}", alert.anomaly_score))
        .replace("{confidence}", &format!("{:.3}", alert.confidence))
        .replace("{modelVersion}", &alert.model_version)
}
