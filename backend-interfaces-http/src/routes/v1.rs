use axum::Router;

use backend_application::AppState;

use crate::handlers::{dashboard_handlers, ops_handlers, search_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/v1/logs/search",
            axum::routing::get(search_handlers::search_logs),
        )
        .route(
            "/api/v1/dashboard/metrics",
            axum::routing::get(dashboard_handlers::metrics),
        )
        .route(
            "/api/v1/dashboard/log-volume",
            axum::routing::get(dashboard_handlers::log_volume),
        )
        .route(
            "/api/v1/dashboard/log-level-distribution",
            axum::routing::get(dashboard_handlers::log_level_distribution),
        )
        .route(
            "/api/v1/dashboard/top-services",
            axum::routing::get(dashboard_handlers::top_services),
        )
        .route(
            "/api/v1/dashboard/anomalies",
            axum::routing::get(dashboard_handlers::anomaly_timeline),
        )
        .route(
            "/api/v1/dashboard/anomalies/high-confidence",
            axum::routing::get(dashboard_handlers::high_confidence_anomalies),
        )
        .route(
            "/api/v1/dashboard/anomalies/by-log/:log_id",
            axum::routing::get(dashboard_handlers::anomaly_for_log),
        )
        .route(
            "/api/v1/dashboard/recent-alerts",
            axum::routing::get(dashboard_handlers::recent_alerts),
        )
        .route(
            "/api/v1/processor/health",
            axum::routing::get(dashboard_handlers::processor_health),
        )
        .route(
            "/ops/health/live",
            axum::routing::get(ops_handlers::health_live),
        )
        .route(
            "/ops/health/ready",
            axum::routing::get(ops_handlers::health_ready),
        )
        .route(
            "/ops/metrics/prometheus",
            axum::routing::get(ops_handlers::metrics_prometheus),
        )
        .route("/ops/ml/check", axum::routing::get(ops_handlers::ml_check))
        .with_state(state)
}
