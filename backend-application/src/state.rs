use std::sync::Arc;

use backend_domain::ports::{AlertSink, AnomalyStore, LogIndex, Predictor};
use backend_domain::RuntimeConfig;
use tokio::sync::Semaphore;

use crate::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: RuntimeConfig,
    pub log_index: Arc<dyn LogIndex>,
    pub anomaly_store: Arc<dyn AnomalyStore>,
    pub predictor: Arc<dyn Predictor>,
    pub alert_sink: Arc<dyn AlertSink>,
    /// Caps the number of scoring tasks in flight at once.
    pub scoring_permits: Arc<Semaphore>,
    pub metrics: Arc<Metrics>,
}
