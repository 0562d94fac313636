// Dashboard read models
// Every query here degrades to an empty or zeroed view when a store is
// unreachable; the dashboard keeps rendering while ingestion recovers.

use chrono::{Duration, Utc};
use time::OffsetDateTime;
use tracing::error;

use backend_domain::{
    AnomalyRecord,
    DashboardMetrics,
    LevelDistributionEntry,
    LogVolumePoint,
    ServiceCount,
};

use crate::AppState;

/// The rate denominator assumes the index holds one day of logs.
const MINUTES_PER_DAY: f64 = 1_440.0;

pub async fn dashboard_metrics(state: &AppState) -> DashboardMetrics {
    match load_dashboard_metrics(state).await {
        Ok(metrics) => metrics,
        Err(err) => {
            error!("failed to load dashboard metrics: {}", err);
            DashboardMetrics::default()
        }
    }
}

async fn load_dashboard_metrics(state: &AppState) -> anyhow::Result<DashboardMetrics> {
    let total_logs = state.log_index.count_logs(None).await?;
    let error_count = state.log_index.count_logs(Some("ERROR")).await?;
    let warning_count = state.log_index.count_logs(Some("WARN")).await?;

    let logs_per_minute = total_logs as f64 / MINUTES_PER_DAY;
    let error_rate = if total_logs > 0 {
        error_count as f64 * 100.0 / total_logs as f64
    } else {
        0.0
    };

    Ok(DashboardMetrics {
        total_logs,
        error_count,
        warning_count,
        active_alerts: 0,
        anomaly_count: 0,
        logs_per_minute,
        error_rate,
    })
}

pub async fn log_volume(state: &AppState, hours: i64) -> Vec<LogVolumePoint> {
    let end = Utc::now();
    let start = end - Duration::hours(hours);
    match state.log_index.volume_histogram(start, end).await {
        Ok(points) => points,
        Err(err) => {
            error!("failed to load log volume: {}", err);
            Vec::new()
        }
    }
}

pub async fn level_distribution(state: &AppState) -> Vec<LevelDistributionEntry> {
    let (total, buckets) = match state.log_index.level_terms().await {
        Ok(terms) => terms,
        Err(err) => {
            error!("failed to load level distribution: {}", err);
            return Vec::new();
        }
    };

    buckets
        .into_iter()
        .map(|bucket| {
            let percentage = if total > 0 {
                bucket.doc_count as f64 * 100.0 / total as f64
            } else {
                0.0
            };
            LevelDistributionEntry {
                level: bucket.key,
                count: bucket.doc_count,
                percentage,
            }
        })
        .collect()
}

pub async fn top_services(state: &AppState, limit: u32) -> Vec<ServiceCount> {
    match state.log_index.service_terms(limit).await {
        Ok(buckets) => buckets
            .into_iter()
            .map(|bucket| ServiceCount {
                service: bucket.key,
                count: bucket.doc_count,
            })
            .collect(),
        Err(err) => {
            error!("failed to load top services: {}", err);
            Vec::new()
        }
    }
}

pub async fn anomaly_timeline(state: &AppState, hours: i64) -> Vec<AnomalyRecord> {
    let cutoff = OffsetDateTime::now_utc() - time::Duration::hours(hours);
    match state.anomaly_store.fetch_since(cutoff).await {
        Ok(records) => records,
        Err(err) => {
            error!("failed to load anomaly timeline: {}", err);
            Vec::new()
        }
    }
}

pub async fn high_confidence_anomalies(state: &AppState, threshold: f64) -> Vec<AnomalyRecord> {
    match state.anomaly_store.fetch_high_confidence(threshold).await {
        Ok(records) => records,
        Err(err) => {
            error!("failed to load high-confidence anomalies: {}", err);
            Vec::new()
        }
    }
}

pub async fn anomaly_for_log(state: &AppState, log_id: &str) -> Option<AnomalyRecord> {
    match state.anomaly_store.find_by_log_id(log_id).await {
        Ok(record) => record,
        Err(err) => {
            error!("failed to look up anomaly for log {}: {}", log_id, err);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use backend_domain::TermBucket;

    use super::*;
    use crate::test_support::{
        app_state,
        MockAlertSinkPort,
        MockAnomalyStorePort,
        MockLogIndexPort,
        MockPredictorPort,
    };

    fn state_with_index(index: MockLogIndexPort) -> AppState {
        app_state(
            Arc::new(index),
            Arc::new(MockAnomalyStorePort::new()),
            Arc::new(MockPredictorPort::new()),
            Arc::new(MockAlertSinkPort::new()),
        )
    }

    fn state_with_store(store: MockAnomalyStorePort) -> AppState {
        app_state(
            Arc::new(MockLogIndexPort::new()),
            Arc::new(store),
            Arc::new(MockPredictorPort::new()),
            Arc::new(MockAlertSinkPort::new()),
        )
    }

    fn sample_anomaly(log_id: &str, confidence: f64) -> AnomalyRecord {
        AnomalyRecord {
            id: "a-1".to_string(),
            model_id: None,
            log_id: log_id.to_string(),
            anomaly_score: 0.8,
            is_anomaly: true,
            confidence,
            features: "{}".to_string(),
            detected_at: OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("valid ts"),
            model_version: "v1".to_string(),
        }
    }

    #[tokio::test]
    async fn metrics_computes_rates_from_counts() {
        let mut index = MockLogIndexPort::new();
        index.expect_count_logs().returning(|level| match level {
            None => Ok(200),
            Some("ERROR") => Ok(25),
            Some("WARN") => Ok(10),
            Some(_) => Ok(0),
        });

        let metrics = dashboard_metrics(&state_with_index(index)).await;
        assert_eq!(metrics.total_logs, 200);
        assert_eq!(metrics.error_count, 25);
        assert_eq!(metrics.warning_count, 10);
        assert_eq!(metrics.error_rate, 12.5);
        assert_eq!(metrics.logs_per_minute, 200.0 / MINUTES_PER_DAY);
        assert_eq!(metrics.anomaly_count, 0);
        assert_eq!(metrics.active_alerts, 0);
    }

    #[tokio::test]
    async fn metrics_guard_zero_totals() {
        let mut index = MockLogIndexPort::new();
        index.expect_count_logs().returning(|_| Ok(0));

        let metrics = dashboard_metrics(&state_with_index(index)).await;
        assert_eq!(metrics.error_rate, 0.0);
        assert_eq!(metrics.logs_per_minute, 0.0);
    }

    #[tokio::test]
    async fn metrics_degrade_to_zero_when_index_fails() {
        let mut index = MockLogIndexPort::new();
        index
            .expect_count_logs()
            .returning(|_| Err(anyhow::anyhow!("index down")));

        let metrics = dashboard_metrics(&state_with_index(index)).await;
        assert_eq!(metrics, DashboardMetrics::default());
    }

    #[tokio::test]
    async fn volume_degrades_to_empty_on_failure() {
        let mut index = MockLogIndexPort::new();
        index
            .expect_volume_histogram()
            .returning(|_, _| Err(anyhow::anyhow!("index down")));

        let points = log_volume(&state_with_index(index), 24).await;
        assert!(points.is_empty());
    }

    #[tokio::test]
    async fn volume_queries_requested_window() {
        let mut index = MockLogIndexPort::new();
        index
            .expect_volume_histogram()
            .withf(|start, end| {
                let window = *end - *start;
                window == Duration::hours(6)
            })
            .returning(|_, _| Ok(Vec::new()));

        let points = log_volume(&state_with_index(index), 6).await;
        assert!(points.is_empty());
    }

    #[tokio::test]
    async fn level_distribution_computes_percentages() {
        let mut index = MockLogIndexPort::new();
        index.expect_level_terms().returning(|| {
            Ok((
                8,
                vec![
                    TermBucket { key: "ERROR".to_string(), doc_count: 5 },
                    TermBucket { key: "INFO".to_string(), doc_count: 3 },
                ],
            ))
        });

        let entries = level_distribution(&state_with_index(index)).await;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].level, "ERROR");
        assert_eq!(entries[0].percentage, 62.5);
        assert_eq!(entries[1].percentage, 37.5);
    }

    #[tokio::test]
    async fn level_distribution_guards_zero_total() {
        let mut index = MockLogIndexPort::new();
        index.expect_level_terms().returning(|| {
            Ok((0, vec![TermBucket { key: "ERROR".to_string(), doc_count: 5 }]))
        });

        let entries = level_distribution(&state_with_index(index)).await;
        assert_eq!(entries[0].percentage, 0.0);
    }

    #[tokio::test]
    async fn top_services_maps_buckets() {
        let mut index = MockLogIndexPort::new();
        index.expect_service_terms().returning(|limit| {
            assert_eq!(limit, 10);
            Ok(vec![TermBucket { key: "checkout".to_string(), doc_count: 42 }])
        });

        let services = top_services(&state_with_index(index), 10).await;
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].service, "checkout");
        assert_eq!(services[0].count, 42);
    }

    #[tokio::test]
    async fn anomaly_timeline_degrades_to_empty() {
        let mut store = MockAnomalyStorePort::new();
        store
            .expect_fetch_since()
            .returning(|_| Err(anyhow::anyhow!("store down")));

        let records = anomaly_timeline(&state_with_store(store), 24).await;
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn high_confidence_passes_threshold_through() {
        let mut store = MockAnomalyStorePort::new();
        store.expect_fetch_high_confidence().returning(|threshold| {
            assert_eq!(threshold, 0.9);
            Ok(vec![sample_anomaly("doc-1", 0.95)])
        });

        let records = high_confidence_anomalies(&state_with_store(store), 0.9).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].log_id, "doc-1");
    }

    #[tokio::test]
    async fn anomaly_for_log_absorbs_store_errors() {
        let mut store = MockAnomalyStorePort::new();
        store
            .expect_find_by_log_id()
            .returning(|_| Err(anyhow::anyhow!("store down")));

        let record = anomaly_for_log(&state_with_store(store), "doc-1").await;
        assert!(record.is_none());
    }
}
