use axum::extract::{Path, Query, State};
use axum::Json;

use backend_application::queries::dashboard_queries;
use backend_application::AppState;
use backend_domain::{
    AnomalyAlert, AnomalyRecord, DashboardMetrics, LevelDistributionEntry, LogVolumePoint,
    ServiceCount,
};

use crate::error::HttpError;

#[derive(serde::Deserialize)]
pub struct WindowQuery {
    pub hours: Option<i64>,
}

#[derive(serde::Deserialize)]
pub struct TopServicesQuery {
    pub limit: Option<u32>,
}

#[derive(serde::Deserialize)]
pub struct ConfidenceQuery {
    pub threshold: Option<f64>,
}

#[derive(serde::Deserialize)]
pub struct RecentAlertsQuery {
    pub limit: Option<u32>,
}

pub async fn metrics(State(state): State<AppState>) -> Json<DashboardMetrics> {
    Json(dashboard_queries::dashboard_metrics(&state).await)
}

pub async fn log_volume(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Json<Vec<LogVolumePoint>> {
    let hours = query.hours.unwrap_or(24).clamp(1, 8_760);
    Json(dashboard_queries::log_volume(&state, hours).await)
}

pub async fn log_level_distribution(
    State(state): State<AppState>,
) -> Json<Vec<LevelDistributionEntry>> {
    Json(dashboard_queries::level_distribution(&state).await)
}

pub async fn top_services(
    State(state): State<AppState>,
    Query(query): Query<TopServicesQuery>,
) -> Json<Vec<ServiceCount>> {
    let limit = query.limit.unwrap_or(10).clamp(1, 100);
    Json(dashboard_queries::top_services(&state, limit).await)
}

pub async fn anomaly_timeline(
    State(state): State<AppState>,
    Query(query): Query<WindowQuery>,
) -> Json<Vec<AnomalyRecord>> {
    let hours = query.hours.unwrap_or(24).clamp(1, 8_760);
    Json(dashboard_queries::anomaly_timeline(&state, hours).await)
}

pub async fn high_confidence_anomalies(
    State(state): State<AppState>,
    Query(query): Query<ConfidenceQuery>,
) -> Json<Vec<AnomalyRecord>> {
    let threshold = query
        .threshold
        .unwrap_or(state.config.alert_confidence_threshold);
    Json(dashboard_queries::high_confidence_anomalies(&state, threshold).await)
}

pub async fn anomaly_for_log(
    State(state): State<AppState>,
    Path(log_id): Path<String>,
) -> Result<Json<AnomalyRecord>, HttpError> {
    match dashboard_queries::anomaly_for_log(&state, &log_id).await {
        Some(record) => Ok(Json(record)),
        None => Err(HttpError::NotFound),
    }
}

/// Alert deliveries are fire-and-forget and not recorded anywhere, so the
/// feed is a fixed empty list. The limit parameter is accepted for the day
/// deliveries get persisted.
pub async fn recent_alerts(_query: Query<RecentAlertsQuery>) -> Json<Vec<AnomalyAlert>> {
    Json(Vec::new())
}

/// Liveness contract consumed by the dashboard UI, shape is fixed.
pub async fn processor_health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let elasticsearch = match state.log_index.ping().await {
        Ok(()) => "UP",
        Err(_) => "DOWN",
    };
    Json(serde_json::json!({
        "status": "UP",
        "service": "log-processor",
        "elasticsearch": elasticsearch,
    }))
}
