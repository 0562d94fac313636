use std::sync::Arc;

use anyhow::Result;
use clickhouse::Client;
use tokio::sync::Semaphore;
use tracing::warn;

use backend_application::{AppState, Metrics};
use backend_domain::ports::{AnomalyStore, LogIndex};
use backend_infrastructure::{
    AppConfig, ClickhouseAnomalyStore, ElasticLogIndex, MlPredictor, WebhookAlertSink,
};

pub struct AppContext {
    pub state: AppState,
}

impl AppContext {
    pub async fn new() -> Result<Self> {
        let config = AppConfig::load().await?;
        let runtime_config = config.to_runtime_config();
        let db_config = config.to_db_config();

        let log_index = Arc::new(ElasticLogIndex::new(
            &db_config,
            runtime_config.request_timeout_seconds,
        )?);
        // Startup store failures leave the service up; reads degrade and
        // writes surface per-message errors until the store recovers.
        if let Err(err) = log_index.ensure_index().await {
            warn!("log index init failed, continuing degraded: {}", err);
        }

        let mut clickhouse = Client::default()
            .with_url(&db_config.clickhouse_url)
            .with_database(&db_config.clickhouse_database);
        if let Some(user) = &db_config.clickhouse_user {
            clickhouse = clickhouse.with_user(user);
        }
        if let Some(password) = &db_config.clickhouse_password {
            clickhouse = clickhouse.with_password(password);
        }
        let anomaly_store = Arc::new(ClickhouseAnomalyStore::new(
            clickhouse,
            db_config.clickhouse_database.clone(),
        ));
        if let Err(err) = anomaly_store.ensure_schema().await {
            warn!("anomaly store init failed, continuing degraded: {}", err);
        }

        let predictor = Arc::new(MlPredictor::new(&runtime_config)?);
        let alert_sink = Arc::new(WebhookAlertSink::new(&runtime_config));
        let scoring_permits = Arc::new(Semaphore::new(runtime_config.scoring_max_inflight));

        let state = AppState {
            config: runtime_config,
            log_index,
            anomaly_store,
            predictor,
            alert_sink,
            scoring_permits,
            metrics: Arc::new(Metrics::default()),
        };

        Ok(Self { state })
    }
}
