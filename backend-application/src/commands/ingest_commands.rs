use chrono::{SecondsFormat, Utc};
use serde_json::json;
use tracing::debug;

use backend_domain::LogRecord;

use crate::ops::scoring;
use crate::{AppError, AppState};

/// Hard cap on stored message length, in characters.
const MAX_MESSAGE_CHARS: usize = 10_000;
const TRUNCATION_MARKER: &str = "... [truncated]";
const DEFAULT_ENVIRONMENT: &str = "unknown";
const PROCESSOR_NAME: &str = "logwarden-processor";

pub const META_PROCESSED_AT: &str = "processedAt";
pub const META_PROCESSOR: &str = "processor";
pub const META_MESSAGE_LENGTH: &str = "messageLength";
pub const META_HAS_EXCEPTION: &str = "hasException";
pub const META_HAS_TIMEOUT: &str = "hasTimeout";
pub const META_HAS_CONNECTION: &str = "hasConnection";

/// Normalize, enrich and index one record, then hand it to the scoring
/// pipeline. Returns the document id assigned by the index. Scoring runs
/// detached and can never fail this call; an indexing failure is the only
/// error path, so the caller can reject the delivery.
pub async fn process_log(state: &AppState, mut record: LogRecord) -> Result<String, AppError> {
    normalize_log(&mut record);
    enrich_log(&mut record);

    let log_id = match state.log_index.index_log(&record).await {
        Ok(log_id) => log_id,
        Err(err) => {
            state.metrics.record_process_error();
            return Err(AppError::Processing(err));
        }
    };
    debug!("log indexed: id={}", log_id);

    scoring::dispatch_scoring(state, log_id.clone(), record);
    state.metrics.record_log_processed();
    Ok(log_id)
}

/// Fill defaults and bound the record before it is stored. Missing fields
/// other than timestamp and environment stay missing.
pub fn normalize_log(record: &mut LogRecord) {
    if record.timestamp.is_none() {
        record.timestamp = Some(Utc::now());
    }

    if let Some(level) = record.level.take() {
        record.level = Some(level.to_uppercase());
    }

    if let Some(message) = record.message.take() {
        if message.chars().count() > MAX_MESSAGE_CHARS {
            let mut truncated: String = message.chars().take(MAX_MESSAGE_CHARS).collect();
            truncated.push_str(TRUNCATION_MARKER);
            record.message = Some(truncated);
        } else {
            record.message = Some(message);
        }
    }

    if record.environment.as_deref().map_or(true, str::is_empty) {
        record.environment = Some(DEFAULT_ENVIRONMENT.to_string());
    }
}

/// Stamp processing provenance and derive the heuristic flags the scoring
/// features are built from. Recomputed from the message on every call, so
/// the flags are idempotent.
pub fn enrich_log(record: &mut LogRecord) {
    let message = record.message.clone().unwrap_or_default();
    let message_length = message.chars().count();
    let lowercase = message.to_lowercase();

    let metadata = record.metadata.get_or_insert_with(Default::default);
    metadata.insert(
        META_PROCESSED_AT.to_string(),
        json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    metadata.insert(META_PROCESSOR.to_string(), json!(PROCESSOR_NAME));
    metadata.insert(META_MESSAGE_LENGTH.to_string(), json!(message_length));
    metadata.insert(
        META_HAS_EXCEPTION.to_string(),
        json!(lowercase.contains("exception") || lowercase.contains("error")),
    );
    metadata.insert(META_HAS_TIMEOUT.to_string(), json!(lowercase.contains("timeout")));
    metadata.insert(
        META_HAS_CONNECTION.to_string(),
        json!(lowercase.contains("connection") || lowercase.contains("connect")),
    );
}
