// Log record entity
// Canonical unit of work flowing from the queue through the pipeline

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single log record as delivered by producers. Every field except the
/// metadata map mirrors what producers actually send, so everything is
/// optional and normalization fills the gaps before indexing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub level: Option<String>,
    pub message: Option<String>,
    pub service: Option<String>,
    pub host: Option<String>,
    pub environment: Option<String>,
    pub trace_id: Option<String>,
    pub span_id: Option<String>,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

impl LogRecord {
    /// Message length in characters, zero when the message is absent.
    pub fn message_chars(&self) -> usize {
        self.message
            .as_deref()
            .map(|message| message.chars().count())
            .unwrap_or(0)
    }

    /// Look up a boolean metadata flag, defaulting to false.
    pub fn metadata_flag(&self, key: &str) -> bool {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.get(key))
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_camel_case_payload() {
        let payload = json!({
            "timestamp": "2025-06-01T12:00:00Z",
            "level": "error",
            "message": "boom",
            "service": "checkout",
            "traceId": "t-1",
            "spanId": "s-1",
            "metadata": {"region": "eu-1"}
        });

        let record: LogRecord = serde_json::from_value(payload).expect("valid payload");
        assert_eq!(record.level.as_deref(), Some("error"));
        assert_eq!(record.trace_id.as_deref(), Some("t-1"));
        assert_eq!(record.span_id.as_deref(), Some("s-1"));
        assert!(record.timestamp.is_some());
        let metadata = record.metadata.expect("metadata present");
        assert_eq!(metadata.get("region"), Some(&json!("eu-1")));
    }

    #[test]
    fn tolerates_missing_fields() {
        let record: LogRecord = serde_json::from_value(json!({})).expect("empty payload");
        assert!(record.timestamp.is_none());
        assert!(record.message.is_none());
        assert_eq!(record.message_chars(), 0);
        assert!(!record.metadata_flag("hasException"));
    }

    #[test]
    fn metadata_flag_reads_booleans_only() {
        let mut record = LogRecord::default();
        let mut metadata = HashMap::new();
        metadata.insert("hasTimeout".to_string(), json!(true));
        metadata.insert("messageLength".to_string(), json!(42));
        record.metadata = Some(metadata);

        assert!(record.metadata_flag("hasTimeout"));
        assert!(!record.metadata_flag("messageLength"));
        assert!(!record.metadata_flag("hasException"));
    }
}
