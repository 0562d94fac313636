use thiserror::Error;

/// Failure surfaced by the write path. Anything going wrong during
/// normalize/enrich/index ends up here and tells the queue adapter to
/// reject the delivery; the async scoring stage never produces one.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Processing(#[from] anyhow::Error),
}
