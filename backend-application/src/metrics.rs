use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Metrics {
    logs_processed: AtomicU64,
    process_errors: AtomicU64,
    scoring_dispatched: AtomicU64,
    scoring_completed: AtomicU64,
    scoring_skipped: AtomicU64,
    scoring_errors: AtomicU64,
    anomalies_detected: AtomicU64,
    alerts_emitted: AtomicU64,
}

impl Metrics {
    pub fn record_log_processed(&self) {
        self.logs_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_process_error(&self) {
        self.process_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scoring_dispatched(&self) {
        self.scoring_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scoring_completed(&self) {
        self.scoring_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scoring_skipped(&self) {
        self.scoring_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_scoring_error(&self) {
        self.scoring_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_anomaly_detected(&self) {
        self.anomalies_detected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_alert_emitted(&self) {
        self.alerts_emitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn render_prometheus(&self) -> String {
        let processed = self.logs_processed.load(Ordering::Relaxed);
        let process_errors = self.process_errors.load(Ordering::Relaxed);
        let dispatched = self.scoring_dispatched.load(Ordering::Relaxed);
        let completed = self.scoring_completed.load(Ordering::Relaxed);
        let skipped = self.scoring_skipped.load(Ordering::Relaxed);
        let scoring_errors = self.scoring_errors.load(Ordering::Relaxed);
        let anomalies = self.anomalies_detected.load(Ordering::Relaxed);
        let alerts = self.alerts_emitted.load(Ordering::Relaxed);

        format!(
            "# TYPE logwarden_logs_processed_total counter\n\
logwarden_logs_processed_total {}\n\
# TYPE logwarden_process_errors_total counter\n\
logwarden_process_errors_total {}\n\
# TYPE logwarden_scoring_dispatched_total counter\n\
logwarden_scoring_dispatched_total {}\n\
# TYPE logwarden_scoring_completed_total counter\n\
logwarden_scoring_completed_total {}\n\
# TYPE logwarden_scoring_skipped_total counter\n\
logwarden_scoring_skipped_total {}\n\
# TYPE logwarden_scoring_errors_total counter\n\
logwarden_scoring_errors_total {}\n\
# TYPE logwarden_anomalies_detected_total counter\n\
logwarden_anomalies_detected_total {}\n\
# TYPE logwarden_alerts_emitted_total counter\n\
logwarden_alerts_emitted_total {}\n",
            processed, process_errors, dispatched, completed, skipped, scoring_errors, anomalies,
            alerts
        )
    }
}
