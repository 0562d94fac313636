// Asynchronous anomaly scoring
// Runs detached from ingestion: a delivery is acknowledged once indexed,
// scoring follows behind on its own budget and absorbs every failure.

use serde_json::json;
use time::OffsetDateTime;
use tracing::{debug, error, warn};
use uuid::Uuid;

use backend_domain::{AnomalyAlert, AnomalyRecord, LogRecord, PredictionResponse};

use crate::commands::ingest_commands::{
    META_HAS_CONNECTION,
    META_HAS_EXCEPTION,
    META_HAS_TIMEOUT,
};
use crate::AppState;

const META_ANOMALY_DETECTED: &str = "anomalyDetected";
const META_ANOMALY_SCORE: &str = "anomalyScore";
const META_ANOMALY_CONFIDENCE: &str = "anomalyConfidence";
const META_MODEL_VERSION: &str = "mlModelVersion";

/// Queue a scoring task for an indexed record. The semaphore bounds how
/// many tasks run concurrently; the rest wait in line inside their tasks.
pub fn dispatch_scoring(state: &AppState, log_id: String, record: LogRecord) {
    state.metrics.record_scoring_dispatched();
    let state = state.clone();
    tokio::spawn(async move {
        let _permit = match state.scoring_permits.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return, // semaphore closed during shutdown
        };
        score_log(&state, &log_id, record).await;
    });
}

/// Score one record end to end: ask the prediction service, persist the
/// outcome, and raise an alert for confident anomalies. Never returns an
/// error; the record is already indexed and stays indexed whatever
/// happens here.
pub async fn score_log(state: &AppState, log_id: &str, mut record: LogRecord) {
    debug!("starting anomaly scoring for log {}", log_id);

    let Some(prediction) = state.predictor.predict(log_id, &record).await else {
        debug!("no prediction available for log {}, skipping scoring", log_id);
        state.metrics.record_scoring_skipped();
        return;
    };

    merge_prediction_metadata(&mut record, &prediction);
    save_result(state, log_id, &record, &prediction).await;

    if prediction.is_anomaly {
        warn!(
            "anomaly detected in log {}: score={:.3}, confidence={:.3}",
            log_id, prediction.anomaly_score, prediction.confidence
        );
        state.metrics.record_anomaly_detected();

        if prediction.confidence > state.config.alert_confidence_threshold {
            state.metrics.record_alert_emitted();
            state.alert_sink.notify_high_confidence(AnomalyAlert {
                log_id: log_id.to_string(),
                service: record.service.clone(),
                anomaly_score: prediction.anomaly_score,
                confidence: prediction.confidence,
                model_version: prediction.model_version.clone(),
            });
        }
    }

    state.metrics.record_scoring_completed();
}

/// Annotate the in-memory record with the scoring outcome. The record is
/// not re-indexed, this only feeds logs and downstream snapshots.
fn merge_prediction_metadata(record: &mut LogRecord, prediction: &PredictionResponse) {
    let metadata = record.metadata.get_or_insert_with(Default::default);
    metadata.insert(META_ANOMALY_DETECTED.to_string(), json!(prediction.is_anomaly));
    metadata.insert(META_ANOMALY_SCORE.to_string(), json!(prediction.anomaly_score));
    metadata.insert(
        META_ANOMALY_CONFIDENCE.to_string(),
        json!(prediction.confidence),
    );
    metadata.insert(
        META_MODEL_VERSION.to_string(),
        json!(prediction.model_version),
    );
}

/// The feature view stored next to the result for offline analysis.
fn features_snapshot(record: &LogRecord) -> serde_json::Value {
    json!({
        "messageLength": record.message_chars(),
        "level": record.level,
        "service": record.service,
        "hasException": record.metadata_flag(META_HAS_EXCEPTION),
        "hasTimeout": record.metadata_flag(META_HAS_TIMEOUT),
        "hasConnection": record.metadata_flag(META_HAS_CONNECTION),
    })
}

async fn save_result(
    state: &AppState,
    log_id: &str,
    record: &LogRecord,
    prediction: &PredictionResponse,
) {
    let features = match serde_json::to_string(&features_snapshot(record)) {
        Ok(features) => features,
        Err(err) => {
            error!("failed to serialize features for log {}: {}", log_id, err);
            state.metrics.record_scoring_error();
            return;
        }
    };

    let row = AnomalyRecord {
        id: Uuid::new_v4().to_string(),
        model_id: None,
        log_id: log_id.to_string(),
        anomaly_score: prediction.anomaly_score,
        is_anomaly: prediction.is_anomaly,
        confidence: prediction.confidence,
        features,
        detected_at: OffsetDateTime::now_utc(),
        model_version: prediction.model_version.clone(),
    };

    if let Err(err) = state.anomaly_store.insert(&row).await {
        error!("failed to save anomaly result for log {}: {}", log_id, err);
        state.metrics.record_scoring_error();
        return;
    }
    debug!("anomaly result saved for log {}", log_id);
}
