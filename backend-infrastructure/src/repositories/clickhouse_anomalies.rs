// ClickHouse-backed anomaly store
// One row per scoring outcome, partitioned by day and trimmed by TTL.

use anyhow::Result;
use async_trait::async_trait;
use clickhouse::Client;
use time::OffsetDateTime;
use tracing::debug;

use backend_domain::ports::AnomalyStore;
use backend_domain::AnomalyRecord;

const SELECT_COLUMNS: &str =
    "id, model_id, log_id, anomaly_score, is_anomaly, confidence, features, detected_at, model_version";

pub struct ClickhouseAnomalyStore {
    client: Client,
    database: String,
}

impl ClickhouseAnomalyStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    fn table(&self) -> String {
        format!("{}.anomaly_detections", self.database)
    }
}

fn latest_for_log_sql(table: &str) -> String {
    format!(
        "SELECT {} FROM {} WHERE log_id = ? ORDER BY detected_at DESC LIMIT 1",
        SELECT_COLUMNS, table
    )
}

// Timeline and confidence views list confirmed anomalies only; rows with
// is_anomaly = 0 stay queryable per log id for audit.
fn timeline_sql(table: &str) -> String {
    format!(
        "SELECT {} FROM {} \
         WHERE is_anomaly = 1 AND detected_at > fromUnixTimestamp64Milli(?) \
         ORDER BY detected_at DESC LIMIT 500",
        SELECT_COLUMNS, table
    )
}

fn high_confidence_sql(table: &str) -> String {
    format!(
        "SELECT {} FROM {} \
         WHERE is_anomaly = 1 AND confidence > ? \
         ORDER BY confidence DESC, detected_at DESC LIMIT 500",
        SELECT_COLUMNS, table
    )
}

#[async_trait]
impl AnomalyStore for ClickhouseAnomalyStore {
    async fn ensure_schema(&self) -> Result<()> {
        self.client
            .query(&format!("CREATE DATABASE IF NOT EXISTS {}", self.database))
            .execute()
            .await?;

        self.client
            .query(&format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    id String,
                    model_id Nullable(Int64),
                    log_id String,
                    anomaly_score Float64,
                    is_anomaly Bool,
                    confidence Float64,
                    features String,
                    detected_at DateTime64(3),
                    model_version String
                )
                ENGINE = MergeTree
                PARTITION BY toDate(detected_at)
                ORDER BY (detected_at, log_id)
                TTL toDateTime(detected_at) + INTERVAL 90 DAY",
                self.table()
            ))
            .execute()
            .await?;

        debug!("anomaly schema ready in database {}", self.database);
        Ok(())
    }

    async fn insert(&self, record: &AnomalyRecord) -> Result<()> {
        let mut insert = self.client.insert("anomaly_detections")?;
        insert.write(record).await?;
        insert.end().await?;
        Ok(())
    }

    async fn find_by_log_id(&self, log_id: &str) -> Result<Option<AnomalyRecord>> {
        let rows = self
            .client
            .query(&latest_for_log_sql(&self.table()))
            .bind(log_id)
            .fetch_all::<AnomalyRecord>()
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn fetch_since(&self, cutoff: OffsetDateTime) -> Result<Vec<AnomalyRecord>> {
        let cutoff_millis = (cutoff.unix_timestamp_nanos() / 1_000_000) as i64;
        let rows = self
            .client
            .query(&timeline_sql(&self.table()))
            .bind(cutoff_millis)
            .fetch_all::<AnomalyRecord>()
            .await?;
        Ok(rows)
    }

    async fn fetch_high_confidence(&self, threshold: f64) -> Result<Vec<AnomalyRecord>> {
        let rows = self
            .client
            .query(&high_confidence_sql(&self.table()))
            .bind(threshold)
            .fetch_all::<AnomalyRecord>()
            .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "logwarden.anomaly_detections";

    #[test]
    fn timeline_sql_selects_confirmed_anomalies_only() {
        let sql = timeline_sql(TABLE);
        assert!(sql.contains("WHERE is_anomaly = 1 AND detected_at >"));
        assert!(sql.contains("ORDER BY detected_at DESC"));
    }

    #[test]
    fn high_confidence_sql_gates_on_anomaly_and_threshold() {
        let sql = high_confidence_sql(TABLE);
        assert!(sql.contains("WHERE is_anomaly = 1 AND confidence > ?"));
        assert!(sql.contains("ORDER BY confidence DESC, detected_at DESC"));
    }

    #[test]
    fn latest_for_log_sql_takes_newest_row_regardless_of_verdict() {
        let sql = latest_for_log_sql(TABLE);
        assert!(sql.contains("WHERE log_id = ?"));
        assert!(!sql.contains("is_anomaly = 1"));
        assert!(sql.ends_with("LIMIT 1"));
    }
}
